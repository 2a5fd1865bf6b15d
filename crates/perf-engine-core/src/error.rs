use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerfEngineError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    /// Modified Dietz average capital is non-positive, so the method is undefined.
    #[error("Undefined average capital: start value {start_value} with weighted flows {weighted_flows} leaves no positive capital base")]
    UndefinedAverageCapital {
        start_value: Decimal,
        weighted_flows: Decimal,
    },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PerfEngineError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PerfEngineError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for every caller-side precondition failure. `UndefinedAverageCapital`
    /// is a refinement of invalid input that callers may want to catch separately.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PerfEngineError::InvalidInput { .. }
                | PerfEngineError::UndefinedAverageCapital { .. }
                | PerfEngineError::DateError(_)
        )
    }
}

impl From<serde_json::Error> for PerfEngineError {
    fn from(e: serde_json::Error) -> Self {
        PerfEngineError::SerializationError(e.to_string())
    }
}
