//! Confidence and risk scores, both bounded to 0..=100.

pub mod confidence;
pub mod risk;

pub use confidence::ConfidenceWeights;
pub use risk::{Risk, RiskInput, RiskLevel};
