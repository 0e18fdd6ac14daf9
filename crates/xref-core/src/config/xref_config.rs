//! Top-level xref configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ClaimConfig, ObserverConfig, VNameConfig};
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`XREF_*`)
/// 3. Project config (`xref.toml` in project root)
/// 4. User config (`~/.xref/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct XrefConfig {
    pub observer: ObserverConfig,
    pub claim: ClaimConfig,
    pub vnames: VNameConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub fail_on_unimplemented_builtin: Option<bool>,
    pub drop_redundant_wraiths: Option<bool>,
    pub starting_context: Option<String>,
    pub default_corpus: Option<String>,
    pub max_redundant_claims: Option<u32>,
}

/// Environment variables consulted by [`XrefConfig::load`].
pub const ENV_VARS: &[&str] = &[
    "XREF_FAIL_ON_UNIMPLEMENTED_BUILTIN",
    "XREF_DEFER_NODES",
    "XREF_DROP_REDUNDANT_WRAITHS",
    "XREF_STARTING_CONTEXT",
    "XREF_MAX_EXPANSION_DEPTH",
    "XREF_COMPRESS_THRESHOLD",
    "XREF_LANGUAGE",
    "XREF_PROCESS_UNKNOWN_STATUS",
    "XREF_MAX_REDUNDANT_CLAIMS",
    "XREF_DEFAULT_CORPUS",
];

impl XrefConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Only a parse failure there is fatal.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(err @ ConfigError::ParseError { .. }) => return Err(err),
                    Err(err) => {
                        tracing::warn!(
                            path = %user_config_path.display(),
                            error = %err,
                            "ignoring unreadable user config"
                        );
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config)?;

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &XrefConfig) -> Result<(), ConfigError> {
        if config.observer.max_expansion_depth == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "observer.max_expansion_depth".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.observer.compress_threshold == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "observer.compress_threshold".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.claim.max_redundant_claims == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "claim.max_redundant_claims".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(language) = &config.observer.language {
            if language.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "observer.language".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.xref/config.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".xref").join("config.toml"))
    }

    fn merge_toml_file(config: &mut XrefConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let file_config: XrefConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` win.
    pub fn merge(base: &mut XrefConfig, other: &XrefConfig) {
        let o = &other.observer;
        let b = &mut base.observer;
        if o.fail_on_unimplemented_builtin.is_some() {
            b.fail_on_unimplemented_builtin = o.fail_on_unimplemented_builtin;
        }
        if o.defer_nodes.is_some() {
            b.defer_nodes = o.defer_nodes;
        }
        if o.drop_redundant_wraiths.is_some() {
            b.drop_redundant_wraiths = o.drop_redundant_wraiths;
        }
        if o.starting_context.is_some() {
            b.starting_context = o.starting_context.clone();
        }
        if o.max_expansion_depth.is_some() {
            b.max_expansion_depth = o.max_expansion_depth;
        }
        if o.compress_threshold.is_some() {
            b.compress_threshold = o.compress_threshold;
        }
        if o.language.is_some() {
            b.language = o.language.clone();
        }

        if other.claim.process_unknown_status.is_some() {
            base.claim.process_unknown_status = other.claim.process_unknown_status;
        }
        if other.claim.max_redundant_claims.is_some() {
            base.claim.max_redundant_claims = other.claim.max_redundant_claims;
        }

        if other.vnames.default_corpus.is_some() {
            base.vnames.default_corpus = other.vnames.default_corpus.clone();
        }
        if other.vnames.working_directory.is_some() {
            base.vnames.working_directory = other.vnames.working_directory.clone();
        }
    }

    /// Apply `XREF_*` environment variables. Malformed values are reported
    /// as `InvalidValue`.
    fn apply_env_overrides(config: &mut XrefConfig) -> Result<(), ConfigError> {
        if let Some(v) = env_parsed::<bool>("XREF_FAIL_ON_UNIMPLEMENTED_BUILTIN")? {
            config.observer.fail_on_unimplemented_builtin = Some(v);
        }
        if let Some(v) = env_parsed::<bool>("XREF_DEFER_NODES")? {
            config.observer.defer_nodes = Some(v);
        }
        if let Some(v) = env_parsed::<bool>("XREF_DROP_REDUNDANT_WRAITHS")? {
            config.observer.drop_redundant_wraiths = Some(v);
        }
        if let Ok(v) = std::env::var("XREF_STARTING_CONTEXT") {
            config.observer.starting_context = Some(v);
        }
        if let Some(v) = env_parsed::<u32>("XREF_MAX_EXPANSION_DEPTH")? {
            config.observer.max_expansion_depth = Some(v);
        }
        if let Some(v) = env_parsed::<usize>("XREF_COMPRESS_THRESHOLD")? {
            config.observer.compress_threshold = Some(v);
        }
        if let Ok(v) = std::env::var("XREF_LANGUAGE") {
            config.observer.language = Some(v);
        }
        if let Some(v) = env_parsed::<bool>("XREF_PROCESS_UNKNOWN_STATUS")? {
            config.claim.process_unknown_status = Some(v);
        }
        if let Some(v) = env_parsed::<u32>("XREF_MAX_REDUNDANT_CLAIMS")? {
            config.claim.max_redundant_claims = Some(v);
        }
        if let Ok(v) = std::env::var("XREF_DEFAULT_CORPUS") {
            config.vnames.default_corpus = Some(v);
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    pub fn apply_cli_overrides(config: &mut XrefConfig, cli: &CliOverrides) {
        if let Some(v) = cli.fail_on_unimplemented_builtin {
            config.observer.fail_on_unimplemented_builtin = Some(v);
        }
        if let Some(v) = cli.drop_redundant_wraiths {
            config.observer.drop_redundant_wraiths = Some(v);
        }
        if let Some(ref v) = cli.starting_context {
            config.observer.starting_context = Some(v.clone());
        }
        if let Some(ref v) = cli.default_corpus {
            config.vnames.default_corpus = Some(v.clone());
        }
        if let Some(v) = cli.max_redundant_claims {
            config.claim.max_redundant_claims = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                message: format!("cannot parse {raw:?}"),
            }),
        Err(_) => Ok(None),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
