//! Claim client configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_REDUNDANT_CLAIMS, DEFAULT_PROCESS_UNKNOWN_STATUS};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ClaimConfig {
    /// Answer of the static claim client for files it has no entry for. Default: true.
    pub process_unknown_status: Option<bool>,
    /// How many indexers may redundantly claim the same file in the dynamic client. Default: 1.
    pub max_redundant_claims: Option<u32>,
}

impl ClaimConfig {
    pub fn effective_process_unknown_status(&self) -> bool {
        self.process_unknown_status
            .unwrap_or(DEFAULT_PROCESS_UNKNOWN_STATUS)
    }

    pub fn effective_max_redundant_claims(&self) -> u32 {
        self.max_redundant_claims
            .unwrap_or(DEFAULT_MAX_REDUNDANT_CLAIMS)
    }
}
