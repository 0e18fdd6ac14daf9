//! XrefErrorCode trait for structured error reporting.

/// Trait for converting xref errors to stable error codes.
/// Every error enum implements this so that callers driving the observer
/// (build wrappers, log scrapers) can match on a code instead of a message.
pub trait XrefErrorCode {
    /// Returns the error code string (e.g., "CLAIM_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn error_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CLAIM_ERROR: &str = "CLAIM_ERROR";
pub const CLAIM_STORE_POISONED: &str = "CLAIM_STORE_POISONED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const METADATA_ERROR: &str = "METADATA_ERROR";
pub const UNKNOWN_EDGE_KIND: &str = "UNKNOWN_EDGE_KIND";
pub const LOCATION_ERROR: &str = "LOCATION_ERROR";
pub const MISSING_BUILTIN: &str = "MISSING_BUILTIN";
pub const RECORDER_ERROR: &str = "RECORDER_ERROR";
pub const RENDER_ERROR: &str = "RENDER_ERROR";
pub const OBSERVER_ERROR: &str = "OBSERVER_ERROR";
