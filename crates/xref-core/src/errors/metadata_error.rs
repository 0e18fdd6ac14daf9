//! Metadata overlay errors.

use super::error_code::{self, XrefErrorCode};

/// Errors that can occur while loading or applying metadata overlay files.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata JSON error in {file}: {message}")]
    Json { file: String, message: String },

    #[error("Unexpected metadata format tag {tag:?} in {file}")]
    UnknownFormat { file: String, tag: String },

    #[error("Malformed metadata rule #{index} in {file}: {message}")]
    MalformedRule {
        file: String,
        index: usize,
        message: String,
    },

    #[error("Failed decoding protobuf metadata {file}: {message}")]
    Protobuf { file: String, message: String },

    #[error("{file} is not a metadata header: {message}")]
    BadHeader { file: String, message: String },

    #[error("Unknown edge kind {spelling} from metadata")]
    UnknownEdgeKind { spelling: String },
}

impl XrefErrorCode for MetadataError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEdgeKind { .. } => error_code::UNKNOWN_EDGE_KIND,
            _ => error_code::METADATA_ERROR,
        }
    }
}
