//! Risk Types
//!
//! Core records for the risk engine: closed domains, statistics,
//! filters, prediction request/result and insights.
//! No logic beyond parsing and validation at the boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::RiskError;

// ============================================================================
// CLOSED DOMAINS
// ============================================================================

/// Declares an enumerated domain whose wire form is a fixed label.
macro_rules! closed_domain {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = RiskError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(RiskError::InvalidRequest(
                        format!("unknown {} '{}'", $what, other),
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

closed_domain! {
    /// Age bracket of the person authenticating
    AgeGroup, "age group" {
        Young => "young",
        Adult => "adult",
        Elderly => "elderly",
    }
}

closed_domain! {
    /// Biometric modality used for the attempt
    BiometricType, "biometric type" {
        Fingerprint => "fingerprint",
        Iris => "iris",
    }
}

closed_domain! {
    /// Certified capture device model
    DeviceModel, "device model" {
        DeviceA => "UIDAI_Device_A",
        DeviceB => "UIDAI_Device_B",
        DeviceC => "UIDAI_Device_C",
        DeviceD => "UIDAI_Device_D",
        DeviceE => "UIDAI_Device_E",
    }
}

closed_domain! {
    /// State or territory covered by the dashboard
    Region, "region" {
        Maharashtra => "Maharashtra",
        Delhi => "Delhi",
        Karnataka => "Karnataka",
        TamilNadu => "Tamil Nadu",
        Gujarat => "Gujarat",
        Rajasthan => "Rajasthan",
        WestBengal => "West Bengal",
        UttarPradesh => "Uttar Pradesh",
        Bihar => "Bihar",
        Punjab => "Punjab",
        Haryana => "Haryana",
        Kerala => "Kerala",
    }
}

closed_domain! {
    /// Aggregation axis of a statistics view
    Dimension, "dimension" {
        Region => "region",
        Device => "device",
        AgeGroup => "age_group",
        Month => "month",
    }
}

// ============================================================================
// RISK TIER
// ============================================================================

/// Discrete risk tier derived from a failure rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
        }
    }

    /// Display color bucket for maps and badges
    pub fn color(&self) -> ColorBucket {
        match self {
            RiskTier::Low => ColorBucket::Green,
            RiskTier::Medium => ColorBucket::Yellow,
            RiskTier::High => ColorBucket::Orange,
            RiskTier::Critical => ColorBucket::Red,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBucket {
    Green,
    Yellow,
    Orange,
    Red,
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Aggregate failure statistic for one value of a dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureStatistic {
    pub dimension_key: String,
    pub total_attempts: u64,
    /// Percentage, 0-100
    pub failure_rate: f64,
}

/// Statistic annotated with its risk tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieredStatistic {
    #[serde(flatten)]
    pub statistic: FailureStatistic,
    pub risk_level: RiskTier,
    pub color: ColorBucket,
}

// ============================================================================
// FILTER
// ============================================================================

/// Restriction applied to regional views. `None` means no restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_type: Option<BiometricType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
}

impl FilterCriteria {
    /// Every filter combination a regional view can be asked for
    pub fn all_combinations() -> Vec<FilterCriteria> {
        let biometrics = std::iter::once(None).chain(BiometricType::ALL.iter().copied().map(Some));
        biometrics
            .flat_map(|biometric_type| {
                std::iter::once(None)
                    .chain(AgeGroup::ALL.iter().copied().map(Some))
                    .map(move |age_group| FilterCriteria { biometric_type, age_group })
            })
            .collect()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.biometric_type.is_none() && self.age_group.is_none()
    }

    /// Build from loosely-typed query values; blank values mean unset
    pub fn from_optional(
        biometric_type: Option<&str>,
        age_group: Option<&str>,
    ) -> Result<Self, RiskError> {
        Ok(Self {
            biometric_type: parse_optional(biometric_type)?,
            age_group: parse_optional(age_group)?,
        })
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let biometric = self.biometric_type.map(|b| b.as_str()).unwrap_or("*");
        let age = self.age_group.map(|a| a.as_str()).unwrap_or("*");
        write!(f, "biometric={} age={}", biometric, age)
    }
}

fn parse_optional<T: FromStr<Err = RiskError>>(value: Option<&str>) -> Result<Option<T>, RiskError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}

// ============================================================================
// PREDICTION
// ============================================================================

/// Fully-typed prediction request. Every field is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub age_group: AgeGroup,
    pub biometric_type: BiometricType,
    pub device_model: DeviceModel,
    pub region: Region,
}

/// Prediction request as received from a caller, before domain checks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPredictionRequest {
    pub age_group: Option<String>,
    pub biometric_type: Option<String>,
    pub device_model: Option<String>,
    #[serde(alias = "state")]
    pub region: Option<String>,
}

impl TryFrom<RawPredictionRequest> for PredictionRequest {
    type Error = RiskError;

    fn try_from(raw: RawPredictionRequest) -> Result<Self, Self::Error> {
        let missing: Vec<&str> = [
            ("age_group", &raw.age_group),
            ("biometric_type", &raw.biometric_type),
            ("device_model", &raw.device_model),
            ("region", &raw.region),
        ]
        .iter()
        .filter(|(_, v)| v.as_deref().map_or(true, |s| s.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(RiskError::InvalidRequest(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            age_group: raw.age_group.unwrap_or_default().parse()?,
            biometric_type: raw.biometric_type.unwrap_or_default().parse()?,
            device_model: raw.device_model.unwrap_or_default().parse()?,
            region: raw.region.unwrap_or_default().parse()?,
        })
    }
}

/// Prediction returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Percentage, 0-100
    pub failure_probability: f64,
    pub risk_level: RiskTier,
    /// 0-1
    pub confidence: f64,
    /// Per-feature contributions, when the model reports them
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub factors: BTreeMap<String, f64>,
}

// ============================================================================
// INSIGHTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Critical,
    Warning,
    Info,
}

/// Declaration order is ranking order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Actionable finding derived from the current snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}
