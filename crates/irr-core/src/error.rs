use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for malformed calls at the library boundary.
#[derive(Debug, Error)]
pub enum IrrError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for IrrError {
    fn from(e: serde_json::Error) -> Self {
        IrrError::SerializationError(e.to_string())
    }
}

/// Reasons the solver could not produce a rate.
///
/// These are expected outcomes for irregular cash-flow series, not errors:
/// [`crate::compute_irr`] collapses every variant to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrrFailure {
    #[error("IRR requires at least 2 cash flows, got {count}")]
    InsufficientData { count: usize },

    #[error("No sign change across the bisection bracket (NPV at low: {npv_low}, NPV at high: {npv_high})")]
    NoSignChange { npv_low: Decimal, npv_high: Decimal },

    #[error("IRR did not converge after {iterations} iterations (last NPV: {last_npv})")]
    NonConvergence { iterations: u32, last_npv: Decimal },

    #[error("Rate {rate} is outside the discountable domain (1 + rate must be > 0)")]
    DomainViolation { rate: Decimal },

    #[error("Decimal overflow while discounting at rate {rate}")]
    Overflow { rate: Decimal },
}
