//! Graph observer configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPRESS_THRESHOLD, DEFAULT_LANGUAGE, DEFAULT_MAX_EXPANSION_DEPTH};

/// Options that change what the observer emits.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ObserverConfig {
    /// Abort when a builtin spelling has no registered template. Default: false.
    pub fail_on_unimplemented_builtin: Option<bool>,
    /// Write content-derived nodes once per run. Default: true.
    pub defer_nodes: Option<bool>,
    /// Emit at most one anchor per (range, edge kind, target). Default: false.
    pub drop_redundant_wraiths: Option<bool>,
    /// Preprocessor context of the main source file. Default: "".
    pub starting_context: Option<String>,
    /// Maximum macro-expansion nesting the location resolver follows. Default: 64.
    pub max_expansion_depth: Option<u32>,
    /// Signatures longer than this many bytes are replaced by their hash. Default: 128.
    pub compress_threshold: Option<usize>,
    /// Language stamped on emitted VNames. Default: "c++".
    pub language: Option<String>,
}

impl ObserverConfig {
    pub fn effective_fail_on_unimplemented_builtin(&self) -> bool {
        self.fail_on_unimplemented_builtin.unwrap_or(false)
    }

    pub fn effective_defer_nodes(&self) -> bool {
        self.defer_nodes.unwrap_or(true)
    }

    pub fn effective_drop_redundant_wraiths(&self) -> bool {
        self.drop_redundant_wraiths.unwrap_or(false)
    }

    pub fn effective_starting_context(&self) -> &str {
        self.starting_context.as_deref().unwrap_or("")
    }

    /// Returns the effective expansion depth cap, defaulting to 64.
    pub fn effective_max_expansion_depth(&self) -> u32 {
        self.max_expansion_depth.unwrap_or(DEFAULT_MAX_EXPANSION_DEPTH)
    }

    /// Returns the effective compression threshold, defaulting to 128.
    pub fn effective_compress_threshold(&self) -> usize {
        self.compress_threshold.unwrap_or(DEFAULT_COMPRESS_THRESHOLD)
    }

    pub fn effective_language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}
