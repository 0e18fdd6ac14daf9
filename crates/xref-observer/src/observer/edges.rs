//! Edges between semantic nodes. These are never deduplicated.

use super::IndexingObserver;
use crate::claim::ClaimClient;
use crate::ids::NodeId;
use crate::recorder::GraphRecorder;
use crate::schema::{AccessSpecifier, Confidence, EdgeKind, PropertyKind, Variance};
use crate::source::SourceMap;

/// Records relationships between nodes the walker has already named.
pub trait EdgeRecording {
    /// `param` is parameter `ordinal` of `param_of`.
    fn record_param_edge(&mut self, param_of: &NodeId, ordinal: u32, param: &NodeId);

    fn record_child_of_edge(&mut self, child: &NodeId, parent: &NodeId);

    /// `term` has type `type_node`.
    fn record_type_edge(&mut self, term: &NodeId, type_node: &NodeId);

    fn record_upper_bound_edge(&mut self, type_var: &NodeId, bound: &NodeId);

    fn record_variance(&mut self, type_var: &NodeId, variance: Variance);

    /// `term` specializes the abstraction `abs`.
    fn record_spec_edge(&mut self, term: &NodeId, abs: &NodeId, confidence: Confidence);

    /// `term` instantiates the abstraction `abs`.
    fn record_inst_edge(&mut self, term: &NodeId, abs: &NodeId, confidence: Confidence);

    fn record_overrides_edge(&mut self, overrider: &NodeId, base: &NodeId);

    /// `overrider` ultimately overrides `root`, which overrides nothing.
    fn record_overrides_root_edge(&mut self, overrider: &NodeId, root: &NodeId);

    fn record_extends_edge(&mut self, from: &NodeId, to: &NodeId, is_virtual: bool, access: AccessSpecifier);

    /// An Objective-C category extending its class.
    fn record_category_extends_edge(&mut self, from: &NodeId, to: &NodeId);
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> IndexingObserver<R, C, S> {
    fn record_edge(&mut self, source: &NodeId, kind: EdgeKind, target: &NodeId, ordinal: Option<u32>) {
        let source = self.vname_for_node(source);
        let target = self.vname_for_node(target);
        self.recorder.add_edge(&source, kind, &target, ordinal);
    }
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> EdgeRecording for IndexingObserver<R, C, S> {
    fn record_param_edge(&mut self, param_of: &NodeId, ordinal: u32, param: &NodeId) {
        self.record_edge(param_of, EdgeKind::Param, param, Some(ordinal));
    }

    fn record_child_of_edge(&mut self, child: &NodeId, parent: &NodeId) {
        self.record_edge(child, EdgeKind::ChildOf, parent, None);
    }

    fn record_type_edge(&mut self, term: &NodeId, type_node: &NodeId) {
        self.record_edge(term, EdgeKind::HasType, type_node, None);
    }

    fn record_upper_bound_edge(&mut self, type_var: &NodeId, bound: &NodeId) {
        self.record_edge(type_var, EdgeKind::BoundedUpper, bound, None);
    }

    fn record_variance(&mut self, type_var: &NodeId, variance: Variance) {
        let vname = self.vname_for_node(type_var);
        self.recorder
            .add_property(&vname, PropertyKind::Variance, variance.spelling());
    }

    fn record_spec_edge(&mut self, term: &NodeId, abs: &NodeId, confidence: Confidence) {
        let kind = match confidence {
            Confidence::NonSpeculative => EdgeKind::Specializes,
            Confidence::Speculative => EdgeKind::SpecializesSpeculative,
        };
        self.record_edge(term, kind, abs, None);
    }

    fn record_inst_edge(&mut self, term: &NodeId, abs: &NodeId, confidence: Confidence) {
        let kind = match confidence {
            Confidence::NonSpeculative => EdgeKind::Instantiates,
            Confidence::Speculative => EdgeKind::InstantiatesSpeculative,
        };
        self.record_edge(term, kind, abs, None);
    }

    fn record_overrides_edge(&mut self, overrider: &NodeId, base: &NodeId) {
        self.record_edge(overrider, EdgeKind::Overrides, base, None);
    }

    fn record_overrides_root_edge(&mut self, overrider: &NodeId, root: &NodeId) {
        self.record_edge(overrider, EdgeKind::OverridesRoot, root, None);
    }

    fn record_extends_edge(&mut self, from: &NodeId, to: &NodeId, is_virtual: bool, access: AccessSpecifier) {
        self.record_edge(from, EdgeKind::extends(access, is_virtual), to, None);
    }

    fn record_category_extends_edge(&mut self, from: &NodeId, to: &NodeId) {
        self.record_edge(from, EdgeKind::ExtendsCategory, to, None);
    }
}
