//! Claim tokens and claim checks exposed to the walker.

use std::sync::Arc;

use xref_core::errors::ObserverResult;

use super::{FileTracking, IndexingObserver};
use crate::claim::ClaimClient;
use crate::ids::{ClaimToken, NodeId};
use crate::location::Range;
use crate::recorder::GraphRecorder;
use crate::source::{FileId, SourceLocation, SourceMap, SourceRange};
use crate::vname::VName;

/// Answers which tokens nodes are minted under and whether this shard
/// owns them.
pub trait ClaimPolicy {
    /// Token for nodes with no source provenance.
    fn default_claim_token(&self) -> Arc<ClaimToken>;

    /// Token of the file `loc` expands into, or the default token.
    fn claim_token_for_location(&self, loc: SourceLocation) -> Arc<ClaimToken>;

    fn claim_token_for_range(&self, range: &SourceRange) -> Arc<ClaimToken>;

    /// Token for namespaces declared at `loc`. Carries only the corpus, so
    /// a namespace is one node per corpus.
    fn namespace_claim_token(&mut self, loc: SourceLocation) -> Arc<ClaimToken>;

    /// Token for anonymous namespaces declared at `loc`. These belong to the
    /// main source file unless `loc` was reached through a header.
    fn anonymous_namespace_claim_token(&mut self, loc: SourceLocation) -> Arc<ClaimToken>;

    fn claim_node(&self, node: &NodeId) -> bool;

    fn claim_range(&self, range: &Range) -> bool;

    fn claim_location(&self, loc: SourceLocation) -> bool;

    /// Claim a node by identity alone, independent of file membership.
    fn claim_implicit_node(&mut self, identity: &str) -> ObserverResult<bool>;

    /// Called once the walker has finished emitting a claimed implicit node.
    fn finish_implicit_node(&mut self, identity: &str);

    /// Claim every identity in `tokens` at once, writing answers in place.
    fn claim_batch(&mut self, tokens: &mut [(String, bool)]) -> ObserverResult<bool>;

    /// Visit every claimed file with the node of its file VName. Stops when
    /// `visit` returns false.
    fn iterate_over_claimed_files(&self, visit: &mut dyn FnMut(FileId, &NodeId) -> bool);
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> ClaimPolicy for IndexingObserver<R, C, S> {
    fn default_claim_token(&self) -> Arc<ClaimToken> {
        self.default_token.clone()
    }

    fn claim_token_for_location(&self, loc: SourceLocation) -> Arc<ClaimToken> {
        if !loc.is_valid() {
            return self.default_token.clone();
        }
        self.expansion_loc(loc)
            .file_id()
            .and_then(|file| self.claim_checked_files.get(&file))
            .map(|checked| checked.token.clone())
            .unwrap_or_else(|| self.default_token.clone())
    }

    fn claim_token_for_range(&self, range: &SourceRange) -> Arc<ClaimToken> {
        self.claim_token_for_location(range.begin)
    }

    fn namespace_claim_token(&mut self, loc: SourceLocation) -> Arc<ClaimToken> {
        let file_token = self.claim_token_for_location(loc);
        let key = ClaimToken::from_vname(
            &VName {
                corpus: file_token.corpus().to_string(),
                ..VName::default()
            },
            file_token.rough_claimed(),
        );
        self.namespace_tokens
            .entry(key)
            .or_insert_with_key(|key| Arc::new(key.clone()))
            .clone()
    }

    fn anonymous_namespace_claim_token(&mut self, loc: SourceLocation) -> Arc<ClaimToken> {
        if self.is_main_source_file_related_location(loc) {
            if let Some(main) = &self.main_source_file {
                return main.token.clone();
            }
        }
        self.namespace_claim_token(loc)
    }

    fn claim_node(&self, node: &NodeId) -> bool {
        node.token().rough_claimed()
    }

    fn claim_range(&self, range: &Range) -> bool {
        match range {
            Range::Physical(physical) => self.claim_location(physical.begin),
            Range::Implicit(node) => self.claim_node(node),
            Range::Wraith { physical, context } => self.claim_node(context) || self.claim_location(physical.begin),
        }
    }

    fn claim_location(&self, loc: SourceLocation) -> bool {
        self.claim_token_for_location(loc).rough_claimed()
    }

    fn claim_implicit_node(&mut self, identity: &str) -> ObserverResult<bool> {
        let vname = VName::default().with_signature(identity);
        let claimed = self.claim_client.claim(&self.claimant, &vname)?;
        self.stats.claim_requests += 1;
        if !claimed {
            self.stats.claims_rejected += 1;
        }
        Ok(claimed)
    }

    fn finish_implicit_node(&mut self, identity: &str) {
        tracing::trace!(identity, "finished implicit node");
    }

    fn claim_batch(&mut self, tokens: &mut [(String, bool)]) -> ObserverResult<bool> {
        let any = self.claim_client.claim_batch(tokens)?;
        self.stats.claim_requests += tokens.len() as u64;
        self.stats.claims_rejected += tokens.iter().filter(|(_, claimed)| !claimed).count() as u64;
        Ok(any)
    }

    fn iterate_over_claimed_files(&self, visit: &mut dyn FnMut(FileId, &NodeId) -> bool) {
        for (file, checked) in &self.claim_checked_files {
            if !checked.token.rough_claimed() {
                continue;
            }
            let node = NodeId::uncompressed(checked.token.clone(), checked.signature.clone());
            if !visit(*file, &node) {
                break;
            }
        }
    }
}
