//! Claim service errors.

use super::error_code::{self, XrefErrorCode};

/// Errors raised while asking the claim service who owns a VName.
///
/// Claim answers decide which shard emits which facts, so these are never
/// degraded: they stop the run.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("Claim service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Claim store lock poisoned")]
    StorePoisoned,

    #[error("Claim service rejected request for {signature}: {message}")]
    Rejected { signature: String, message: String },
}

impl XrefErrorCode for ClaimError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::StorePoisoned => error_code::CLAIM_STORE_POISONED,
            _ => error_code::CLAIM_ERROR,
        }
    }
}
