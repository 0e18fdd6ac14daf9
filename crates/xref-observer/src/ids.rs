//! Node identities and the claim tokens that stamp them.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use xref_core::constants::DEFAULT_COMPRESS_THRESHOLD;

use crate::hashing::compress_string;
use crate::vname::VName;

/// Provenance and claim status of a node.
///
/// Carries the corpus, root, and path every node minted under it inherits,
/// and whether the file it came from is claimed by this shard.
#[derive(Debug, Clone)]
pub struct ClaimToken {
    corpus: String,
    root: String,
    path: String,
    rough_claimed: bool,
    language_independent: bool,
}

impl ClaimToken {
    /// A token with no provenance that is always claimed.
    pub fn unowned() -> Self {
        Self {
            corpus: String::new(),
            root: String::new(),
            path: String::new(),
            rough_claimed: true,
            language_independent: false,
        }
    }

    /// A token carrying the corpus, root, and path of `vname`.
    pub fn from_vname(vname: &VName, rough_claimed: bool) -> Self {
        Self {
            corpus: vname.corpus.clone(),
            root: vname.root.clone(),
            path: vname.path.clone(),
            rough_claimed,
            language_independent: false,
        }
    }

    pub fn language_independent(mut self) -> Self {
        self.language_independent = true;
        self
    }

    /// If true it is reasonable to assume this shard owns nodes under the
    /// token; if false, more investigation may be required.
    pub fn rough_claimed(&self) -> bool {
        self.rough_claimed
    }

    pub fn is_language_independent(&self) -> bool {
        self.language_independent
    }

    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append the non-empty provenance fields to `identity`, `#`-separated.
    pub fn stamp_identity(&self, identity: &str) -> String {
        let mut stamped = identity.to_string();
        for field in [&self.corpus, &self.root, &self.path] {
            if !field.is_empty() {
                stamped.push('#');
                stamped.push_str(field);
            }
        }
        stamped
    }

    /// Build the VName of a node minted under this token.
    pub fn decorate(&self, signature: &str, language: &str) -> VName {
        VName {
            signature: signature.to_string(),
            corpus: self.corpus.clone(),
            root: self.root.clone(),
            path: self.path.clone(),
            language: if self.language_independent {
                String::new()
            } else {
                language.to_string()
            },
        }
    }
}

// Language independence changes how a node is rendered, not which node it is.
impl PartialEq for ClaimToken {
    fn eq(&self, other: &Self) -> bool {
        self.rough_claimed == other.rough_claimed
            && self.corpus == other.corpus
            && self.root == other.root
            && self.path == other.path
    }
}

impl Eq for ClaimToken {}

impl Hash for ClaimToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.corpus.hash(state);
        self.root.hash(state);
        self.path.hash(state);
        self.rough_claimed.hash(state);
    }
}

/// Identity of a graph node: a claim token plus a content signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    token: Arc<ClaimToken>,
    identity: String,
}

impl NodeId {
    /// Mint an identity, hashing it if it is longer than the default
    /// compression threshold. Observers configured with another threshold
    /// mint through `IndexingObserver::mint`.
    pub fn new(token: Arc<ClaimToken>, identity: &str) -> Self {
        Self::with_threshold(token, identity, DEFAULT_COMPRESS_THRESHOLD)
    }

    pub fn with_threshold(token: Arc<ClaimToken>, identity: &str, threshold: usize) -> Self {
        Self {
            token,
            identity: compress_string(identity, false, threshold),
        }
    }

    /// Mint an identity that is kept verbatim regardless of length.
    pub fn uncompressed(token: Arc<ClaimToken>, identity: impl Into<String>) -> Self {
        Self {
            token,
            identity: identity.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn token(&self) -> &Arc<ClaimToken> {
        &self.token
    }

    /// The identity stamped with its token's provenance. Dedup sets and
    /// composite identities are keyed by this string.
    pub fn to_claimed_string(&self) -> String {
        self.token.stamp_identity(&self.identity)
    }
}

/// Equivalence class of a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameEqClass {
    /// Not a union, class, or macro.
    None,
    Class,
    Union,
    Macro,
}

impl NameEqClass {
    fn suffix(self) -> &'static str {
        match self {
            Self::None => "n",
            Self::Class => "c",
            Self::Union => "u",
            Self::Macro => "m",
        }
    }
}

/// A walker-supplied identity for a declared name, independent of which
/// declaration of it is being looked at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameId {
    pub path: String,
    pub eq_class: NameEqClass,
}

impl NameId {
    pub fn new(path: impl Into<String>, eq_class: NameEqClass) -> Self {
        Self {
            path: path.into(),
            eq_class,
        }
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.path, self.eq_class.suffix())
    }
}
