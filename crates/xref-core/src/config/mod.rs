//! Configuration system for xref.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod claim_config;
pub mod observer_config;
pub mod vname_config;
pub mod xref_config;

pub use claim_config::ClaimConfig;
pub use observer_config::ObserverConfig;
pub use vname_config::VNameConfig;
pub use xref_config::{CliOverrides, XrefConfig};
