//! Error handling for xref.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod builtin_error;
pub mod claim_error;
pub mod config_error;
pub mod error_code;
pub mod location_error;
pub mod metadata_error;
pub mod observer_error;
pub mod recorder_error;

pub use builtin_error::BuiltinError;
pub use claim_error::ClaimError;
pub use config_error::ConfigError;
pub use error_code::XrefErrorCode;
pub use location_error::LocationError;
pub use metadata_error::MetadataError;
pub use observer_error::{ObserverError, ObserverResult};
pub use recorder_error::RecorderError;
