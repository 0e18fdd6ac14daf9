//! Core crate for the xref graph observer.
//!
//! Errors, configuration, tracing setup, shared constants, and the
//! interned identifier types used by `xref-observer`.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;
