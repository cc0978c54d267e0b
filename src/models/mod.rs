//! Data models

pub mod attempt;
pub mod dashboard;

pub use attempt::*;
pub use dashboard::*;
