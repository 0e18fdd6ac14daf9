//! File VName configuration.

use serde::{Deserialize, Serialize};

/// How file paths become file VNames.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct VNameConfig {
    /// Corpus assigned to every file VName. Default: "".
    pub default_corpus: Option<String>,
    /// Paths under this directory are made relative to it. Default: none.
    pub working_directory: Option<String>,
}

impl VNameConfig {
    pub fn effective_default_corpus(&self) -> &str {
        self.default_corpus.as_deref().unwrap_or("")
    }
}
