//! Structured field names used in tracing events across the observer.

/// Context table: lookups that fell back to the parent context.
pub const DEGRADED_CONTEXT_LOOKUPS: &str = "degraded_context_lookups";

/// Claim client: requests answered.
pub const CLAIM_REQUESTS: &str = "claim_requests";

/// Claim client: requests rejected because another shard owns the VName.
pub const CLAIMS_REJECTED: &str = "claims_rejected";

/// Builtins synthesized on demand for unknown spellings.
pub const BUILTINS_SYNTHESIZED: &str = "builtins_synthesized";

/// Anchors dropped because neither the range nor the target was claimed.
pub const ANCHORS_DROPPED: &str = "anchors_dropped";

/// Metadata rules skipped because of an unknown edge spelling.
pub const METADATA_RULES_SKIPPED: &str = "metadata_rules_skipped";

/// Files whose content could not be read for emission.
pub const UNREADABLE_FILES: &str = "unreadable_files";
