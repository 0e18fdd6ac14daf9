//! Top-level observer errors.

use super::error_code::{self, XrefErrorCode};
use super::{
    BuiltinError, ClaimError, ConfigError, LocationError, MetadataError, RecorderError,
};

/// Errors that stop a graph observer run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("Claim error: {0}")]
    Claim(#[from] ClaimError),

    #[error("Builtin error: {0}")]
    Builtin(#[from] BuiltinError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("Invalid argument to {operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },
}

impl XrefErrorCode for ObserverError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Claim(e) => e.error_code(),
            Self::Builtin(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Metadata(e) => e.error_code(),
            Self::Location(e) => e.error_code(),
            Self::Recorder(e) => e.error_code(),
            Self::InvalidArgument { .. } => error_code::OBSERVER_ERROR,
        }
    }
}

/// Result alias used across the observer.
pub type ObserverResult<T> = Result<T, ObserverError>;
