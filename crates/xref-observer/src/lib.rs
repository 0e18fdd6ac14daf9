//! # xref-observer
//!
//! Converts transient, context-sensitive compiler facts (source locations,
//! macro expansion chains, template instantiations, preprocessor contexts)
//! into a deterministic, deduplicated cross-reference graph.
//!
//! The AST walker drives an [`IndexingObserver`] through the
//! [`GraphObserver`] capability traits; facts flow out through a
//! [`GraphRecorder`].

pub mod claim;
pub mod context;
pub mod hashing;
pub mod ids;
pub mod location;
pub mod marked_source;
pub mod metadata;
pub mod observer;
pub mod recorder;
pub mod schema;
pub mod source;
pub mod vname;

pub use claim::{ClaimClient, DynamicClaimClient, InMemoryClaimStore, StaticClaimClient};
pub use ids::{ClaimToken, NameEqClass, NameId, NodeId};
pub use location::Range;
pub use marked_source::{MarkedSource, MarkedSourceKind};
pub use observer::{
    AnchorRecording, ClaimPolicy, EdgeRecording, FileTracking, GraphObserver, IndexingObserver,
    NodeRecording, ObserverStats,
};
pub use recorder::{Fact, GraphRecorder, JsonLinesRecorder, MemoryRecorder};
pub use source::{FileId, InMemorySourceMap, SourceLocation, SourceMap, SourceRange};
pub use vname::{FileVNames, VName};
