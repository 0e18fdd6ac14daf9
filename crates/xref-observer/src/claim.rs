//! Claim coordination between indexer shards.
//!
//! A claim decides which shard emits facts naming a given VName, so several
//! shards can index overlapping inputs without duplicating output.

use std::sync::{Arc, Mutex};

use xref_core::config::ClaimConfig;
use xref_core::errors::ClaimError;
use xref_core::types::collections::FxHashMap;
use xxhash_rust::xxh3::Xxh3;

use crate::vname::VName;

/// Root of the claimant used for batch claims. Every shard must use the same
/// value so batch keys hash identically everywhere.
pub const BATCH_CLAIMANT_ROOT: &str = "xref-claim-batch";

/// Decides whether this shard is responsible for a VName.
pub trait ClaimClient {
    /// Ask whether `claimant` is responsible for `vname`.
    fn claim(&mut self, claimant: &VName, vname: &VName) -> Result<bool, ClaimError>;

    /// Record that `claimant` owns `claimable`.
    fn assign_claim(&mut self, claimable: VName, claimant: VName);

    /// Claim a batch of opaque identifiers, writing each answer in place.
    /// Returns true if at least one identifier was claimed.
    fn claim_batch(&mut self, tokens: &mut [(String, bool)]) -> Result<bool, ClaimError> {
        let mut claim = VName {
            root: BATCH_CLAIMANT_ROOT.to_string(),
            ..VName::default()
        };
        let mut success = false;
        for (identifier, claimed) in tokens.iter_mut() {
            claim.signature.clone_from(identifier);
            *claimed = self.claim(&claim, &claim)?;
            success |= *claimed;
        }
        Ok(success)
    }
}

impl<T: ClaimClient + ?Sized> ClaimClient for Box<T> {
    fn claim(&mut self, claimant: &VName, vname: &VName) -> Result<bool, ClaimError> {
        (**self).claim(claimant, vname)
    }

    fn assign_claim(&mut self, claimable: VName, claimant: VName) {
        (**self).assign_claim(claimable, claimant)
    }
}

/// Answers claims from a fixed assignment table.
#[derive(Debug, Clone)]
pub struct StaticClaimClient {
    claim_table: FxHashMap<VName, VName>,
    process_unknown_status: bool,
}

impl StaticClaimClient {
    pub fn new(process_unknown_status: bool) -> Self {
        Self {
            claim_table: FxHashMap::default(),
            process_unknown_status,
        }
    }

    pub fn from_config(config: &ClaimConfig) -> Self {
        Self::new(config.effective_process_unknown_status())
    }
}

impl Default for StaticClaimClient {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ClaimClient for StaticClaimClient {
    fn claim(&mut self, claimant: &VName, vname: &VName) -> Result<bool, ClaimError> {
        Ok(match self.claim_table.get(vname) {
            Some(owner) => owner == claimant,
            None => self.process_unknown_status,
        })
    }

    fn assign_claim(&mut self, claimable: VName, claimant: VName) {
        self.claim_table.insert(claimable, claimant);
    }
}

/// Shared first-writer-wins key/value store backing [`DynamicClaimClient`].
pub trait ClaimStore: Send + Sync {
    /// Store `value` under `key` if the key is absent. Returns whether the
    /// value was stored.
    fn add(&self, key: &[u8], value: &[u8]) -> Result<bool, ClaimError>;
}

/// An in-process [`ClaimStore`] that several shards can share.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClaimStore {
    entries: Arc<Mutex<FxHashMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, ClaimError> {
        let entries = self.entries.lock().map_err(|_| ClaimError::StorePoisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, ClaimError> {
        Ok(self.len()? == 0)
    }
}

impl ClaimStore for InMemoryClaimStore {
    fn add(&self, key: &[u8], value: &[u8]) -> Result<bool, ClaimError> {
        let mut entries = self.entries.lock().map_err(|_| ClaimError::StorePoisoned)?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }
}

/// Claims VNames first-come-first-served through a shared [`ClaimStore`].
///
/// Answers are cached locally, so a VName is only sent to the store once.
/// Without a store every claim succeeds.
pub struct DynamicClaimClient {
    store: Option<Arc<dyn ClaimStore>>,
    claim_table: FxHashMap<VName, VName>,
    max_redundant_claims: u32,
    request_count: u64,
    rejected_requests: u64,
}

impl DynamicClaimClient {
    pub fn new(store: Option<Arc<dyn ClaimStore>>, max_redundant_claims: u32) -> Self {
        Self {
            store,
            claim_table: FxHashMap::default(),
            max_redundant_claims: max_redundant_claims.max(1),
            request_count: 0,
            rejected_requests: 0,
        }
    }

    pub fn from_config(store: Option<Arc<dyn ClaimStore>>, config: &ClaimConfig) -> Self {
        Self::new(store, config.effective_max_redundant_claims())
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn rejected_requests(&self) -> u64 {
        self.rejected_requests
    }
}

impl ClaimClient for DynamicClaimClient {
    fn claim(&mut self, claimant: &VName, vname: &VName) -> Result<bool, ClaimError> {
        // Any existing entry in the store that is not in the local table
        // means someone else got there first, even if it was this claimant.
        self.request_count += 1;
        if let Some(owner) = self.claim_table.get(vname) {
            if owner == claimant {
                return Ok(true);
            }
            self.rejected_requests += 1;
            return Ok(false);
        }
        let Some(store) = &self.store else {
            return Ok(true);
        };
        let claimant_hash = hash_vname(claimant, 0);
        for tries in 0..self.max_redundant_claims {
            let key = hash_vname(vname, tries);
            if store.add(&key, &claimant_hash)? {
                self.claim_table.insert(vname.clone(), claimant.clone());
                return Ok(true);
            }
        }
        self.claim_table.insert(vname.clone(), VName::default());
        self.rejected_requests += 1;
        Ok(false)
    }

    fn assign_claim(&mut self, claimable: VName, claimant: VName) {
        self.claim_table.insert(claimable, claimant);
    }
}

impl Drop for DynamicClaimClient {
    fn drop(&mut self) {
        let approved = self.request_count - self.rejected_requests;
        let reject_fraction = if self.request_count == 0 {
            0.0
        } else {
            self.rejected_requests as f64 / self.request_count as f64
        };
        tracing::info!(
            claim_requests = self.request_count,
            approved,
            claims_rejected = self.rejected_requests,
            reject_fraction,
            "claim client finished"
        );
    }
}

/// Store key for one claim slot of `vname`.
fn hash_vname(vname: &VName, slot: u32) -> [u8; 16] {
    let mut hasher = Xxh3::new();
    for field in [
        &vname.signature,
        &vname.path,
        &vname.language,
        &vname.root,
        &vname.corpus,
    ] {
        hasher.update(&(field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update(&slot.to_le_bytes());
    hasher.digest128().to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vname(sig: &str) -> VName {
        VName::default().with_signature(sig)
    }

    #[test]
    fn static_client_uses_table_then_default() {
        let mut client = StaticClaimClient::new(false);
        client.assign_claim(vname("a.h"), vname("shard1"));
        assert!(client.claim(&vname("shard1"), &vname("a.h")).unwrap());
        assert!(!client.claim(&vname("shard2"), &vname("a.h")).unwrap());
        assert!(!client.claim(&vname("shard1"), &vname("b.h")).unwrap());
    }

    #[test]
    fn dynamic_client_fails_open_without_store() {
        let mut client = DynamicClaimClient::new(None, 1);
        assert!(client.claim(&vname("me"), &vname("x")).unwrap());
        assert_eq!(client.rejected_requests(), 0);
    }

    #[test]
    fn dynamic_clients_share_a_store() {
        let store = Arc::new(InMemoryClaimStore::new());
        let mut first = DynamicClaimClient::new(Some(store.clone()), 1);
        let mut second = DynamicClaimClient::new(Some(store.clone()), 1);
        assert!(first.claim(&vname("one"), &vname("a.h")).unwrap());
        assert!(!second.claim(&vname("two"), &vname("a.h")).unwrap());
        // Cached answers do not go back to the store.
        assert!(first.claim(&vname("one"), &vname("a.h")).unwrap());
        assert!(!second.claim(&vname("two"), &vname("a.h")).unwrap());
        assert_eq!(second.rejected_requests(), 2);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn redundant_claims_allow_several_owners() {
        let store = Arc::new(InMemoryClaimStore::new());
        let mut first = DynamicClaimClient::new(Some(store.clone()), 2);
        let mut second = DynamicClaimClient::new(Some(store.clone()), 2);
        let mut third = DynamicClaimClient::new(Some(store), 2);
        assert!(first.claim(&vname("1"), &vname("a.h")).unwrap());
        assert!(second.claim(&vname("2"), &vname("a.h")).unwrap());
        assert!(!third.claim(&vname("3"), &vname("a.h")).unwrap());
    }

    #[test]
    fn batch_claims_write_answers_in_place() {
        let mut client = StaticClaimClient::new(true);
        let denied = VName {
            root: BATCH_CLAIMANT_ROOT.to_string(),
            signature: "b".to_string(),
            ..VName::default()
        };
        client.assign_claim(denied, vname("elsewhere"));
        let mut batch = vec![("a".to_string(), false), ("b".to_string(), true)];
        assert!(client.claim_batch(&mut batch).unwrap());
        assert!(batch[0].1);
        assert!(!batch[1].1);
    }
}
