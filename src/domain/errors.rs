use crate::domain::types::CategoricalField;
use thiserror::Error;

/// Errors raised by the encoding / fitting / prediction pipeline.
///
/// Every variant is a deterministic input-validity failure; none of them are
/// worth retrying with the same inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("Schema error: {reason}")]
    Schema { reason: String },

    #[error("Parse error at record {index}: {reason}")]
    Parse { index: usize, reason: String },

    #[error("Unknown category for {field}: '{value}' was not seen during training")]
    UnknownCategory {
        field: CategoricalField,
        value: String,
    },

    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("Model backend failed: {reason}")]
    Model { reason: String },
}

impl PredictionError {
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }
}

pub type PredictionResult<T> = Result<T, PredictionError>;
