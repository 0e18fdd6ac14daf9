//! Source location resolution errors.

use super::error_code::{self, XrefErrorCode};

/// Errors that can occur while resolving compiler source locations.
///
/// None of these are fatal to an indexing run; the resolver degrades to a
/// hash-based identity and reports the error through `tracing`.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Invalid source location")]
    Invalid,

    #[error("Macro expansion chain deeper than {max} steps")]
    ExpansionDepthExceeded { max: u32 },

    #[error("No file entry backs buffer {file_id}")]
    MissingFileEntry { file_id: u32 },

    #[error("No buffer contents at offset {offset}")]
    MissingBuffer { offset: u32 },
}

impl XrefErrorCode for LocationError {
    fn error_code(&self) -> &'static str {
        error_code::LOCATION_ERROR
    }
}
