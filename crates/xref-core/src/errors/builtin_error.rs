//! Builtin registry errors.

use super::error_code::{self, XrefErrorCode};

/// Errors raised by the builtin type registry.
#[derive(Debug, thiserror::Error)]
pub enum BuiltinError {
    /// Only raised when `fail_on_unimplemented_builtin` is set.
    #[error("Missing builtin {spelling}")]
    Missing { spelling: String },

    #[error("Builtin template {spelling} looks up parameter {index} outside arity {arity}")]
    LookupOutOfRange {
        spelling: String,
        index: usize,
        arity: usize,
    },
}

impl XrefErrorCode for BuiltinError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => error_code::MISSING_BUILTIN,
            Self::LookupOutOfRange { .. } => error_code::RENDER_ERROR,
        }
    }
}
