//! The graph observer.
//!
//! The AST walker calls one `record_*` method per discovered fact. The
//! observer resolves identities, consults claim state, applies dedup and
//! metadata policy, and forwards facts to its [`GraphRecorder`].
//!
//! The walker-facing surface is split into capability traits
//! ([`FileTracking`], [`ClaimPolicy`], [`NodeRecording`], [`EdgeRecording`],
//! [`AnchorRecording`]); [`GraphObserver`] is all of them together.

pub mod anchors;
pub mod builtins;
pub mod claims;
pub mod edges;
pub mod files;
pub mod nodes;
pub mod stats;

use std::sync::Arc;

use xref_core::config::XrefConfig;
use xref_core::constants::META_SUFFIX;
use xref_core::errors::ObserverResult;
use xref_core::types::collections::{BTreeMap, FxHashMap, FxHashSet, SmallVec2};
use xref_core::types::FileUid;

pub use anchors::AnchorRecording;
pub use builtins::{Builtin, BuiltinRegistry};
pub use claims::ClaimPolicy;
pub use edges::EdgeRecording;
pub use files::FileTracking;
pub use nodes::NodeRecording;
pub use stats::ObserverStats;

use crate::claim::ClaimClient;
use crate::context::ContextTable;
use crate::ids::{ClaimToken, NodeId};
use crate::location::{LocationEncoder, Range};
use crate::marked_source::{MarkedSource, MarkedSourceKind};
use crate::metadata::{MetadataFile, MetadataSupports};
use crate::recorder::GraphRecorder;
use crate::schema::{EdgeKind, NodeKind, PropertyKind};
use crate::source::{FileId, SourceLocation, SourceMap};
use crate::vname::{FileVNames, VName};

/// Every capability the AST walker drives.
pub trait GraphObserver: FileTracking + ClaimPolicy + NodeRecording + EdgeRecording + AnchorRecording {}

impl<T> GraphObserver for T where
    T: FileTracking + ClaimPolicy + NodeRecording + EdgeRecording + AnchorRecording + ?Sized
{
}

/// State of one entry on the inclusion stack.
#[derive(Debug, Clone, Default)]
struct FileState {
    /// File VName with the preprocessor context prefixed to its signature.
    vname: VName,
    /// File VName as named by the compilation unit.
    base_vname: VName,
    context: String,
    uid: Option<FileUid>,
    claimed: bool,
}

/// Claim state of one pushed buffer.
#[derive(Debug, Clone)]
struct CheckedFile {
    token: Arc<ClaimToken>,
    /// Signature of the context-qualified file VName.
    signature: String,
}

#[derive(Debug, Clone)]
struct MainSourceFile {
    loc: SourceLocation,
    token: Arc<ClaimToken>,
}

#[derive(Debug, Clone)]
struct Options {
    language: String,
    compress_threshold: usize,
    max_expansion_depth: u32,
    fail_on_unimplemented_builtin: bool,
    starting_context: String,
}

/// Observer that writes cross-reference facts to a [`GraphRecorder`].
///
/// One instance lives for a whole indexing run. Dedup sets for
/// content-derived nodes persist across compilation units; anchor dedup is
/// reset whenever the inclusion stack empties.
pub struct IndexingObserver<R, C, S> {
    recorder: R,
    claim_client: C,
    source_map: S,
    options: Options,
    deferring_nodes: bool,
    drop_redundant_wraiths: bool,
    claimant: VName,
    vnames: FileVNames,
    meta_supports: MetadataSupports,
    file_stack: Vec<FileState>,
    transitively_reached_through_header: FxHashSet<FileUid>,
    contexts: ContextTable,
    recorded_files: FxHashSet<FileUid>,
    claim_checked_files: BTreeMap<FileId, CheckedFile>,
    namespace_tokens: FxHashMap<ClaimToken, Arc<ClaimToken>>,
    main_source_file: Option<MainSourceFile>,
    default_token: Arc<ClaimToken>,
    type_token: Arc<ClaimToken>,
    builtins: BuiltinRegistry,
    meta: FxHashMap<FileUid, SmallVec2<MetadataFile>>,
    deferred_anchors: FxHashSet<Range>,
    range_edges: FxHashSet<(Range, EdgeKind, NodeId)>,
    written_docs: FxHashSet<String>,
    written_types: FxHashSet<String>,
    written_namespaces: FxHashSet<String>,
    stats: ObserverStats,
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> IndexingObserver<R, C, S> {
    /// Create an observer. Registers the builtin table and emits the meta
    /// nodes before returning.
    pub fn new(recorder: R, claim_client: C, source_map: S, config: &XrefConfig) -> ObserverResult<Self> {
        XrefConfig::validate(config)?;
        let observer_config = &config.observer;
        let default_token = Arc::new(ClaimToken::unowned());
        let builtins = BuiltinRegistry::new(default_token.clone())?;
        let mut observer = Self {
            recorder,
            claim_client,
            source_map,
            options: Options {
                language: observer_config.effective_language().to_string(),
                compress_threshold: observer_config.effective_compress_threshold(),
                max_expansion_depth: observer_config.effective_max_expansion_depth(),
                fail_on_unimplemented_builtin: observer_config.effective_fail_on_unimplemented_builtin(),
                starting_context: observer_config.effective_starting_context().to_string(),
            },
            deferring_nodes: observer_config.effective_defer_nodes(),
            drop_redundant_wraiths: observer_config.effective_drop_redundant_wraiths(),
            claimant: VName::default(),
            vnames: FileVNames::from_config(&config.vnames),
            meta_supports: MetadataSupports::standard(),
            file_stack: Vec::new(),
            transitively_reached_through_header: FxHashSet::default(),
            contexts: ContextTable::new(),
            recorded_files: FxHashSet::default(),
            claim_checked_files: BTreeMap::new(),
            namespace_tokens: FxHashMap::default(),
            main_source_file: None,
            default_token,
            type_token: Arc::new(ClaimToken::unowned()),
            builtins,
            meta: FxHashMap::default(),
            deferred_anchors: FxHashSet::default(),
            range_edges: FxHashSet::default(),
            written_docs: FxHashSet::default(),
            written_types: FxHashSet::default(),
            written_namespaces: FxHashSet::default(),
            stats: ObserverStats::default(),
        };
        observer.emit_meta_nodes();
        Ok(observer)
    }

    pub fn with_metadata_supports(mut self, supports: MetadataSupports) -> Self {
        self.meta_supports = supports;
        self
    }

    /// Identity this shard claims files and nodes as.
    pub fn set_claimant(&mut self, claimant: VName) {
        self.claimant = claimant;
    }

    pub fn set_file_vnames(&mut self, vnames: FileVNames) {
        self.vnames = vnames;
    }

    /// Context the next main source file is processed under.
    pub fn set_starting_context(&mut self, context: &str) {
        self.options.starting_context = context.to_string();
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    pub fn claim_client(&self) -> &C {
        &self.claim_client
    }

    pub fn claim_client_mut(&mut self) -> &mut C {
        &mut self.claim_client
    }

    pub fn source_map(&self) -> &S {
        &self.source_map
    }

    pub fn stats(&self) -> ObserverStats {
        self.stats
    }

    /// Current inclusion depth.
    pub fn file_depth(&self) -> usize {
        self.file_stack.len()
    }

    /// Anchors and range edges remembered for the current compilation unit.
    pub fn pending_range_dedup_len(&self) -> usize {
        self.deferred_anchors.len() + self.range_edges.len()
    }

    /// Context-qualified VName of the innermost file, if it has one.
    pub fn current_file_vname(&self) -> Option<&VName> {
        self.file_stack
            .last()
            .filter(|state| state.uid.is_some())
            .map(|state| &state.vname)
    }

    /// Signature template of a registered builtin.
    pub fn builtin_marked_source(&self, spelling: &str) -> Option<&MarkedSource> {
        self.builtins.get(spelling).map(|builtin| &builtin.marked_source)
    }

    /// Token used for type identities (applications, aliases, nominals).
    pub fn type_claim_token(&self) -> Arc<ClaimToken> {
        self.type_token.clone()
    }

    /// Stop suppressing repeated node definitions.
    pub fn stop_deferring_nodes(&mut self) {
        self.deferring_nodes = false;
    }

    /// Emit at most one anchor per (range, edge kind, target), ignoring
    /// instantiation context.
    pub fn drop_redundant_wraiths(&mut self) {
        self.drop_redundant_wraiths = true;
    }

    /// Flush the recorder and hand it back.
    pub fn finish(mut self) -> ObserverResult<R> {
        self.recorder.flush()?;
        Ok(self.recorder)
    }

    pub(crate) fn vname_for_node(&self, node: &NodeId) -> VName {
        node.token().decorate(node.identity(), &self.options.language)
    }

    /// Mint a node identity under this observer's compression threshold.
    /// Walkers should prefer this over [`NodeId::new`] when the threshold
    /// is configured.
    pub fn mint(&self, token: &Arc<ClaimToken>, identity: &str) -> NodeId {
        NodeId::with_threshold(token.clone(), identity, self.options.compress_threshold)
    }

    pub(crate) fn encoder(&self) -> LocationEncoder<'_, S> {
        LocationEncoder::new(&self.source_map, &self.vnames, self.options.max_expansion_depth)
    }

    /// Resolve `loc` to its expansion site. Unresolvable chains degrade to
    /// an invalid location.
    pub(crate) fn expansion_loc(&self, loc: SourceLocation) -> SourceLocation {
        match self.source_map.expansion_loc(loc, self.options.max_expansion_depth) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(error = %err, "treating location as invalid");
                SourceLocation::Invalid
            }
        }
    }

    pub(crate) fn add_marked_source(&mut self, node: &VName, marked_source: Option<&MarkedSource>) {
        if let Some(marked_source) = marked_source {
            self.recorder.add_marked_source(node, marked_source);
        }
    }

    fn emit_meta_nodes(&mut self) {
        let tapp_signature = MarkedSource::boxed(vec![
            MarkedSource::lookup(0),
            MarkedSource::new(MarkedSourceKind::ParameterLookupByParamWithDefaults)
                .with_lookup_index(1)
                .with_pre_text("<")
                .with_post_child_text(", ")
                .with_post_text(">"),
        ]);
        let id = NodeId::uncompressed(self.default_token.clone(), format!("tapp{META_SUFFIX}"));
        let vname = self.vname_for_node(&id);
        self.recorder.add_node_kind(&vname, NodeKind::Meta);
        self.recorder.add_marked_source(&vname, &tapp_signature);
    }

    pub(crate) fn add_completeness(&mut self, node: &VName, completeness: crate::schema::Completeness) {
        self.recorder
            .add_property(node, PropertyKind::Complete, completeness.spelling());
    }
}

impl<R, C, S> std::fmt::Debug for IndexingObserver<R, C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingObserver")
            .field("file_depth", &self.file_stack.len())
            .field("builtins", &self.builtins.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
