//! Predictor boundary errors.

use thiserror::Error;
use vp_core::VpError;

/// Result type for predictor operations.
pub type PredictorResult<T> = Result<T, PredictorError>;

/// Failures at the predictor boundary.
///
/// None of these are fatal to the process. `RuntimeUnavailable` and
/// `Transport` may succeed on a later attempt; `OutOfDomain` is an ordinary
/// query outcome rather than a fault.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictorError {
    /// The runtime could not be started (environment misconfigured).
    #[error("Predictor runtime unavailable: {message}")]
    RuntimeUnavailable { message: String },

    /// No target list was supplied, or there is no cached data to answer from.
    #[error("Missing target: {what}")]
    TargetMissing { what: &'static str },

    /// The runtime ran but the numeric method reported it could not produce a result.
    #[error("Predictor reported failure: {message}")]
    PredictorFailure { message: String },

    /// An error crossed the runtime call boundary (I/O, schema mismatch).
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Anything else escaping a runtime call.
    #[error("Unknown error at runtime boundary: {message}")]
    Unknown { message: String },

    /// A lift coefficient fell outside a polar curve's representable range.
    #[error("Cl={cl} outside polar range at Re={re}")]
    OutOfDomain { cl: f64, re: f64 },

    #[error("Invalid request: {what}")]
    InvalidRequest { what: String },
}

impl PredictorError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PredictorError::RuntimeUnavailable { .. } | PredictorError::Transport { .. }
        )
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        PredictorError::Transport {
            message: message.into(),
        }
    }
}

impl From<VpError> for PredictorError {
    fn from(e: VpError) -> Self {
        PredictorError::InvalidRequest {
            what: e.to_string(),
        }
    }
}

impl From<std::io::Error> for PredictorError {
    fn from(e: std::io::Error) -> Self {
        PredictorError::transport(format!("runtime I/O: {e}"))
    }
}

impl From<serde_json::Error> for PredictorError {
    fn from(e: serde_json::Error) -> Self {
        PredictorError::transport(format!("malformed runtime message: {e}"))
    }
}
