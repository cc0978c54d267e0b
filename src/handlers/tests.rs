//! Router tests
//!
//! Drive the full router with in-memory collaborators.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::Config;
use crate::risk::testing::{national_feed, region_records, StubFeed, StubScorer};
use crate::risk::{
    AgeGroup, AggregationStore, BiometricType, Dimension, FilterCriteria, InsightRanker,
    PredictionService, ScoreError, StatisticsFeed,
};
use crate::{create_router, AppState};

fn state_with(store: Arc<AggregationStore>, feed: StubFeed, scorer: StubScorer) -> AppState {
    let config = Config::default();
    AppState {
        store,
        feed: Arc::new(feed),
        predictor: Arc::new(PredictionService::new(Arc::new(scorer))),
        ranker: Arc::new(InsightRanker::new(config.insights.clone())),
        config,
    }
}

async fn loaded_app() -> Router {
    let store = Arc::new(AggregationStore::new());
    let feed = national_feed().regional(
        FilterCriteria {
            biometric_type: Some(BiometricType::Iris),
            age_group: Some(AgeGroup::Elderly),
        },
        region_records(&[("Bihar", 36.0), ("Kerala", 8.5)]),
    );
    store.refresh(&feed as &dyn StatisticsFeed).await.unwrap();
    create_router(state_with(store, feed, StubScorer::returning(42.5, 0.8)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn predict_body() -> Value {
    json!({
        "age_group": "elderly",
        "biometric_type": "iris",
        "device_model": "UIDAI_Device_B",
        "region": "Delhi"
    })
}

// ============================================================================
// REGIONAL VIEWS
// ============================================================================

#[tokio::test]
async fn test_zones_unfiltered() {
    let (status, body) = send(loaded_app().await, get("/api/v1/risk-zones")).await;
    assert_eq!(status, StatusCode::OK);

    let zones = body["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 4);
    let bihar = zones.iter().find(|z| z["dimension_key"] == "Bihar").unwrap();
    assert_eq!(bihar["risk_level"], "Critical");
    assert_eq!(bihar["color"], "red");
    assert_eq!(body["snapshot"]["loaded"], true);
}

#[tokio::test]
async fn test_zones_filtered() {
    let (status, body) = send(
        loaded_app().await,
        get("/api/v1/risk-zones?biometric_type=iris&age_group=elderly"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filter"]["biometric_type"], "iris");

    let zones = body["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 2);
    let kerala = zones.iter().find(|z| z["dimension_key"] == "Kerala").unwrap();
    assert_eq!(kerala["risk_level"], "Low");
}

#[tokio::test]
async fn test_zones_blank_filter_is_unfiltered() {
    let (status, body) = send(
        loaded_app().await,
        get("/api/v1/risk-zones?biometric_type=&age_group="),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zones"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_zones_unknown_filter_rejected() {
    let (status, body) = send(loaded_app().await, get("/api/v1/risk-zones?age_group=teen")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
}

#[tokio::test]
async fn test_zone_lookup() {
    let (status, body) = send(loaded_app().await, get("/api/v1/risk-zones/Delhi")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zone"]["failure_rate"], 17.9);
    assert_eq!(body["zone"]["risk_level"], "Medium");

    let (status, body) = send(loaded_app().await, get("/api/v1/risk-zones/Goa")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

// ============================================================================
// AXIS VIEWS
// ============================================================================

#[tokio::test]
async fn test_statistics_by_dimension() {
    let (status, body) = send(loaded_app().await, get("/api/v1/statistics/device")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dimension"], "device");
    assert_eq!(body["records"].as_array().unwrap().len(), 3);

    let (status, _) = send(loaded_app().await, get("/api/v1/statistics/weather")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trends_months_in_order() {
    let (status, body) = send(loaded_app().await, get("/api/v1/trends")).await;
    assert_eq!(status, StatusCode::OK);

    let months: Vec<&str> = body["monthly"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["dimension_key"].as_str().unwrap())
        .collect();
    assert_eq!(months, ["2025-09", "2025-10", "2025-11", "2025-12"]);
    assert_eq!(body["age_groups"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_kpis() {
    let (status, body) = send(loaded_app().await, get("/api/v1/kpis")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["highest_risk_region"], "Bihar");
    assert_eq!(body["worst_device"], "UIDAI_Device_C");
}

#[tokio::test]
async fn test_feature_importance() {
    let (status, body) = send(loaded_app().await, get("/api/v1/feature-importance")).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Age Group", "Device Model"]);
    assert_eq!(body["features"][0]["importance"], 29.5);
    assert_eq!(body["snapshot"]["version"], 1);
}

#[tokio::test]
async fn test_empty_store_serves_empty_views() {
    let app = create_router(state_with(
        Arc::new(AggregationStore::new()),
        StubFeed::new(),
        StubScorer::returning(5.0, 0.5),
    ));

    let (status, body) = send(app.clone(), get("/api/v1/risk-zones")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["zones"].as_array().unwrap().is_empty());
    assert_eq!(body["snapshot"]["loaded"], false);

    let (status, body) = send(app.clone(), get("/api/v1/insights")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["insights"].as_array().unwrap().is_empty());

    let (_, body) = send(app, get("/health")).await;
    assert_eq!(body["status"], "degraded");
}

// ============================================================================
// INSIGHTS
// ============================================================================

#[tokio::test]
async fn test_insights_ranked() {
    let (status, body) = send(loaded_app().await, get("/api/v1/insights")).await;
    assert_eq!(status, StatusCode::OK);

    let insights = body["insights"].as_array().unwrap();
    assert!(!insights.is_empty());
    assert_eq!(insights[0]["type"], "critical");
    assert_eq!(insights[0]["title"], "High Risk Zone: Bihar");
    assert_eq!(insights[0]["priority"], "High");
}

// ============================================================================
// PREDICTION
// ============================================================================

#[tokio::test]
async fn test_predict() {
    let (status, body) = send(loaded_app().await, post_json("/api/v1/predict", predict_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failure_probability"], 42.5);
    assert_eq!(body["risk_level"], "High");
    assert_eq!(body["confidence"], 0.8);
}

#[tokio::test]
async fn test_predict_accepts_state_alias() {
    let mut request = predict_body();
    let region = request.as_object_mut().unwrap().remove("region").unwrap();
    request["state"] = region;

    let (status, _) = send(loaded_app().await, post_json("/api/v1/predict", request)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_predict_missing_field() {
    let mut request = predict_body();
    request.as_object_mut().unwrap().remove("device_model");

    let (status, body) = send(loaded_app().await, post_json("/api/v1/predict", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
    assert!(body["error"].as_str().unwrap().contains("device_model"));
}

#[tokio::test]
async fn test_predict_wrong_field_type_is_structured() {
    let mut request = predict_body();
    request["age_group"] = json!(5);

    let (status, body) = send(loaded_app().await, post_json("/api/v1/predict", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_predict_malformed_body_is_structured() {
    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .body(Body::from(predict_body().to_string()))
        .unwrap();
    let (status, body) = send(loaded_app().await, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");

    let broken_json = Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header("content-type", "application/json")
        .body(Body::from("{\"age_group\": "))
        .unwrap();
    let (status, body) = send(loaded_app().await, broken_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_request");
}

#[tokio::test]
async fn test_predict_model_failure() {
    let app = create_router(state_with(
        Arc::new(AggregationStore::new()),
        StubFeed::new(),
        StubScorer::with(Err(ScoreError::Timeout)),
    ));

    let (status, body) = send(app, post_json("/api/v1/predict", predict_body())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "model_unavailable");
    assert!(body.get("failure_probability").is_none());
}

// ============================================================================
// REFRESH
// ============================================================================

#[tokio::test]
async fn test_refresh_applies() {
    let app = create_router(state_with(
        Arc::new(AggregationStore::new()),
        national_feed(),
        StubScorer::returning(5.0, 0.5),
    ));

    let (status, body) = send(app.clone(), post_json("/api/v1/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["version"], 1);
    assert_eq!(body["discarded"], 0);
    assert_eq!(body["snapshot"]["version"], 1);

    let (_, body) = send(app, get("/health")).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_good() {
    let store = Arc::new(AggregationStore::new());
    store.refresh(&national_feed() as &dyn StatisticsFeed).await.unwrap();

    let app = create_router(state_with(
        store,
        national_feed().failing_on(Dimension::Month),
        StubScorer::returning(5.0, 0.5),
    ));

    let (status, body) = send(app.clone(), post_json("/api/v1/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "data_unavailable");
    assert_eq!(body["error"], "Statistics data unavailable");

    let (_, body) = send(app.clone(), get("/health")).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["snapshot"]["stale"], true);
    let last_error = body["snapshot"]["last_error"].as_str().unwrap();
    assert!(!last_error.contains("stub outage"));

    let (status, body) = send(app, get("/api/v1/risk-zones/Bihar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zone"]["failure_rate"], 31.4);
    assert_eq!(body["snapshot"]["stale"], true);
}
