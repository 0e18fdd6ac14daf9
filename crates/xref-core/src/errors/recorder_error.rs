//! Recorder sink errors.

use super::error_code::{self, XrefErrorCode};

/// Errors raised by recorder sinks that write facts somewhere.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("IO error writing facts: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error writing facts: {message}")]
    Serialization { message: String },
}

impl XrefErrorCode for RecorderError {
    fn error_code(&self) -> &'static str {
        error_code::RECORDER_ERROR
    }
}
