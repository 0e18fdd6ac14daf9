//! Counters for degraded and suppressed work.

use xref_core::tracing::metrics;

/// Running totals for one observer. Logged when a compilation unit ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    /// Context lookups that fell back to the parent's context.
    pub degraded_context_lookups: u64,
    pub claim_requests: u64,
    pub claims_rejected: u64,
    pub builtins_synthesized: u64,
    /// Anchors neither claimed by range nor by target.
    pub anchors_dropped: u64,
    pub metadata_rules_skipped: u64,
    pub unreadable_files: u64,
}

impl ObserverStats {
    /// Counter values keyed by their structured field names.
    pub fn as_fields(&self) -> [(&'static str, u64); 7] {
        [
            (metrics::DEGRADED_CONTEXT_LOOKUPS, self.degraded_context_lookups),
            (metrics::CLAIM_REQUESTS, self.claim_requests),
            (metrics::CLAIMS_REJECTED, self.claims_rejected),
            (metrics::BUILTINS_SYNTHESIZED, self.builtins_synthesized),
            (metrics::ANCHORS_DROPPED, self.anchors_dropped),
            (metrics::METADATA_RULES_SKIPPED, self.metadata_rules_skipped),
            (metrics::UNREADABLE_FILES, self.unreadable_files),
        ]
    }

    pub fn log_summary(&self) {
        let summary: Vec<String> = self
            .as_fields()
            .iter()
            .filter(|(_, value)| *value > 0)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        tracing::info!(counters = %summary.join(" "), "compilation unit finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_follow_counters() {
        let stats = ObserverStats {
            anchors_dropped: 3,
            ..Default::default()
        };
        let fields = stats.as_fields();
        assert!(fields.contains(&("anchors_dropped", 3)));
        assert!(fields.contains(&("claim_requests", 0)));
    }
}
