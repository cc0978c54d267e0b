//! HTTP handlers

pub mod health;
pub mod zones;
pub mod statistics;
pub mod insights;
pub mod predict;
pub mod refresh;

#[cfg(test)]
mod tests;
