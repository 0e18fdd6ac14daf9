//! Anchors: source ranges linked to the nodes they spell.
//!
//! Every operation here funnels through one gate. The anchor node is
//! written only if its range or its target is claimed, at most once per
//! range per compilation unit while nodes are deferred. A claimable edge
//! follows the same gate; an unclaimable edge is written on every call.

use xref_core::errors::{ObserverError, ObserverResult};

use super::{ClaimPolicy, IndexingObserver};
use crate::claim::ClaimClient;
use crate::hashing::compress_string;
use crate::ids::NodeId;
use crate::location::Range;
use crate::recorder::GraphRecorder;
use crate::schema::{Claimability, EdgeKind, NodeKind, PropertyKind, Specificity};
use crate::source::{FileId, SourceLocation, SourceMap, SourceRange};
use crate::vname::VName;

const IMPLICIT_ANCHOR_SUBKIND: &str = "implicit";

/// Records anchors and the edges leaving them.
///
/// Each method returns an error only when no file is active.
pub trait AnchorRecording {
    /// VName of the anchor node for `range`. Emits nothing.
    fn vname_from_range(&self, range: &Range) -> VName;

    /// A use of the macro `macro_node`.
    fn record_expands_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()>;

    /// A use of a macro that expanded to `macro_node` through other macros.
    fn record_indirectly_expands_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()>;

    fn record_undefines_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()>;

    /// A preprocessor query (`defined(X)`, `#ifdef X`) of `macro_node`.
    fn record_bound_query_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()>;

    /// An `#include` of `file`.
    fn record_includes_range(&mut self, range: &Range, file: FileId) -> ObserverResult<()>;

    /// Documentation text spanning `range` documents `node`.
    fn record_documentation_range(&mut self, range: &Range, node: &NodeId) -> ObserverResult<()>;

    /// The full extent of the definition of `node`.
    fn record_full_definition_range(&mut self, range: &Range, node: &NodeId) -> ObserverResult<()>;

    /// The name that binds `node`.
    fn record_definition_binding_range(&mut self, binding: &Range, node: &NodeId) -> ObserverResult<()>;

    /// Both the full definition range and the binding range of `node`.
    fn record_definition_range_with_binding(
        &mut self,
        range: &Range,
        binding: &Range,
        node: &NodeId,
    ) -> ObserverResult<()>;

    /// A definition at `range` completes the declaration `node`.
    fn record_completion_range(
        &mut self,
        range: &Range,
        node: &NodeId,
        specificity: Specificity,
    ) -> ObserverResult<()>;

    fn record_type_spelling_location(
        &mut self,
        range: &Range,
        type_node: &NodeId,
        claimability: Claimability,
    ) -> ObserverResult<()>;

    fn record_decl_use_location(
        &mut self,
        range: &Range,
        node: &NodeId,
        claimability: Claimability,
    ) -> ObserverResult<()>;

    /// A reference to `node` from inside documentation.
    fn record_decl_use_location_in_documentation(&mut self, range: &Range, node: &NodeId) -> ObserverResult<()>;

    /// A call from `caller` to `callee` spelled at `range`.
    fn record_call_edge(&mut self, range: &Range, caller: &NodeId, callee: &NodeId) -> ObserverResult<()>;
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> IndexingObserver<R, C, S> {
    fn require_file(&self, operation: &'static str) -> ObserverResult<()> {
        if self.file_stack.is_empty() {
            return Err(ObserverError::InvalidArgument {
                operation,
                message: "no file is active".to_string(),
            });
        }
        Ok(())
    }

    /// Emit the anchor for `range` and its `kind` edge to `target`. Returns
    /// the anchor VName, or `None` if the anchor was dropped.
    fn record_anchor(
        &mut self,
        range: &Range,
        target: &NodeId,
        kind: EdgeKind,
        claimability: Claimability,
    ) -> Option<VName> {
        if self.drop_redundant_wraiths
            && !self
                .range_edges
                .insert((range.without_context(), kind, target.clone()))
        {
            return None;
        }
        let anchor = self.vname_from_range(range);
        if self.claim_range(range) || self.claim_node(target) {
            self.record_anchor_node(&anchor, range);
        } else if claimability == Claimability::Claimable {
            self.stats.anchors_dropped += 1;
            return None;
        }
        let target_vname = self.vname_for_node(target);
        self.recorder.add_edge(&anchor, kind, &target_vname, None);
        if matches!(kind, EdgeKind::Defines | EdgeKind::DefinesBinding) {
            self.apply_metadata_rules(range, kind, &target_vname);
        }
        Some(anchor)
    }

    /// Emit the anchor node for `range`. While nodes are deferred this
    /// happens once per range per compilation unit.
    fn record_anchor_node(&mut self, anchor: &VName, range: &Range) {
        if self.deferring_nodes && !self.deferred_anchors.insert(range.clone()) {
            return;
        }
        self.recorder.add_node_kind(anchor, NodeKind::Anchor);
        match range.source_range() {
            None => {
                self.recorder
                    .add_property(anchor, PropertyKind::Subkind, IMPLICIT_ANCHOR_SUBKIND);
            }
            Some(physical) => {
                if let Some((_, begin, end)) = self.anchor_span(physical) {
                    self.recorder
                        .add_property(anchor, PropertyKind::LocationStart, &begin.to_string());
                    self.recorder
                        .add_property(anchor, PropertyKind::LocationEnd, &end.to_string());
                }
            }
        }
        if let Range::Wraith { context, .. } = range {
            let context = self.vname_for_node(context);
            self.recorder
                .add_edge(anchor, EdgeKind::ChildOfContext, &context, None);
        }
    }

    /// Buffer and byte offsets of `range` with macro locations moved to
    /// their expansion sites. Both ends must land in the same buffer.
    fn anchor_span(&self, range: SourceRange) -> Option<(FileId, u32, u32)> {
        file_span(SourceRange::new(
            self.expansion_loc(range.begin),
            self.expansion_loc(range.end),
        ))
    }

    /// Apply overlay rules attached to the file a definition is spelled in.
    fn apply_metadata_rules(&mut self, range: &Range, kind: EdgeKind, defined: &VName) {
        let Range::Physical(physical) = range else {
            return;
        };
        let Some((file, begin, end)) = self.anchor_span(*physical) else {
            return;
        };
        let Some(files) = self
            .source_map
            .file_entry(file)
            .and_then(|entry| self.meta.get(&entry.uid))
        else {
            return;
        };
        let mut edges = Vec::new();
        let mut skipped = 0;
        for rule in files.iter().flat_map(|metadata| metadata.rules_at(begin)) {
            if rule.end != end || rule.edge_in != kind.spelling() {
                continue;
            }
            match EdgeKind::from_spelling(&rule.edge_out) {
                Some(edge) if rule.reverse_edge => edges.push((rule.vname.clone(), edge, defined.clone())),
                Some(edge) => edges.push((defined.clone(), edge, rule.vname.clone())),
                None => {
                    tracing::warn!(edge = %rule.edge_out, begin, end, "unknown edge kind in metadata rule");
                    skipped += 1;
                }
            }
        }
        self.stats.metadata_rules_skipped += skipped;
        for (source, edge, target) in edges {
            self.recorder.add_edge(&source, edge, &target, None);
        }
    }

    fn record_range_edge(
        &mut self,
        operation: &'static str,
        range: &Range,
        target: &NodeId,
        kind: EdgeKind,
        claimability: Claimability,
    ) -> ObserverResult<()> {
        self.require_file(operation)?;
        self.record_anchor(range, target, kind, claimability);
        Ok(())
    }
}

/// The buffer and offsets of a range whose ends are both plain file
/// locations in the same buffer.
fn file_span(range: SourceRange) -> Option<(FileId, u32, u32)> {
    match (range.begin, range.end) {
        (
            SourceLocation::File { file, offset: begin },
            SourceLocation::File {
                file: end_file,
                offset: end,
            },
        ) if file == end_file => Some((file, begin, end)),
        _ => None,
    }
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> AnchorRecording for IndexingObserver<R, C, S> {
    fn vname_from_range(&self, range: &Range) -> VName {
        let signature = compress_string(
            &self.encoder().encode_range(range),
            false,
            self.options.compress_threshold,
        );
        let mut vname = match range {
            Range::Implicit(node) => node.token().decorate("", &self.options.language),
            Range::Physical(physical) | Range::Wraith { physical, .. } => {
                let mut vname = self
                    .source_map
                    .search_for_file_entry(physical.begin, self.options.max_expansion_depth)
                    .map(|entry| self.vnames.vname_for_path(&entry.name))
                    .unwrap_or_default();
                vname.language.clone_from(&self.options.language);
                vname
            }
        };
        vname.signature = signature;
        vname
    }

    fn record_expands_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_expands_range",
            range,
            macro_node,
            EdgeKind::RefExpands,
            Claimability::Claimable,
        )
    }

    fn record_indirectly_expands_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_indirectly_expands_range",
            range,
            macro_node,
            EdgeKind::RefExpandsTransitive,
            Claimability::Claimable,
        )
    }

    fn record_undefines_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_undefines_range",
            range,
            macro_node,
            EdgeKind::Undefines,
            Claimability::Claimable,
        )
    }

    fn record_bound_query_range(&mut self, range: &Range, macro_node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_bound_query_range",
            range,
            macro_node,
            EdgeKind::RefQueries,
            Claimability::Claimable,
        )
    }

    fn record_includes_range(&mut self, range: &Range, file: FileId) -> ObserverResult<()> {
        self.require_file("record_includes_range")?;
        let Some(entry) = self.source_map.file_entry(file) else {
            tracing::debug!(?file, "included file has no entry");
            return Ok(());
        };
        let included = self.vnames.vname_for_path(&entry.name);
        if !self.claim_range(range) {
            self.stats.anchors_dropped += 1;
            return Ok(());
        }
        let anchor = self.vname_from_range(range);
        self.record_anchor_node(&anchor, range);
        self.recorder
            .add_edge(&anchor, EdgeKind::RefIncludes, &included, None);
        Ok(())
    }

    fn record_documentation_range(&mut self, range: &Range, node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_documentation_range",
            range,
            node,
            EdgeKind::Documents,
            Claimability::Claimable,
        )
    }

    fn record_full_definition_range(&mut self, range: &Range, node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_full_definition_range",
            range,
            node,
            EdgeKind::Defines,
            Claimability::Claimable,
        )
    }

    fn record_definition_binding_range(&mut self, binding: &Range, node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_definition_binding_range",
            binding,
            node,
            EdgeKind::DefinesBinding,
            Claimability::Claimable,
        )
    }

    fn record_definition_range_with_binding(
        &mut self,
        range: &Range,
        binding: &Range,
        node: &NodeId,
    ) -> ObserverResult<()> {
        self.require_file("record_definition_range_with_binding")?;
        self.record_anchor(range, node, EdgeKind::Defines, Claimability::Claimable);
        self.record_anchor(binding, node, EdgeKind::DefinesBinding, Claimability::Claimable);
        Ok(())
    }

    fn record_completion_range(
        &mut self,
        range: &Range,
        node: &NodeId,
        specificity: Specificity,
    ) -> ObserverResult<()> {
        let kind = match specificity {
            Specificity::UniquelyCompletes => EdgeKind::CompletesUniquely,
            Specificity::Completes => EdgeKind::Completes,
        };
        self.record_range_edge("record_completion_range", range, node, kind, Claimability::Claimable)
    }

    fn record_type_spelling_location(
        &mut self,
        range: &Range,
        type_node: &NodeId,
        claimability: Claimability,
    ) -> ObserverResult<()> {
        self.record_range_edge(
            "record_type_spelling_location",
            range,
            type_node,
            EdgeKind::Ref,
            claimability,
        )
    }

    fn record_decl_use_location(
        &mut self,
        range: &Range,
        node: &NodeId,
        claimability: Claimability,
    ) -> ObserverResult<()> {
        self.record_range_edge("record_decl_use_location", range, node, EdgeKind::Ref, claimability)
    }

    fn record_decl_use_location_in_documentation(&mut self, range: &Range, node: &NodeId) -> ObserverResult<()> {
        self.record_range_edge(
            "record_decl_use_location_in_documentation",
            range,
            node,
            EdgeKind::RefDoc,
            Claimability::Claimable,
        )
    }

    fn record_call_edge(&mut self, range: &Range, caller: &NodeId, callee: &NodeId) -> ObserverResult<()> {
        self.require_file("record_call_edge")?;
        self.record_anchor(range, caller, EdgeKind::ChildOf, Claimability::Claimable);
        self.record_anchor(range, callee, EdgeKind::RefCall, Claimability::Unclaimable);
        Ok(())
    }
}
