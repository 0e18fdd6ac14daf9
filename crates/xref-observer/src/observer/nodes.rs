//! Semantic nodes.
//!
//! Nodes whose identity derives from their content (namespaces, type
//! applications, aliases, nominal types, docs, builtins) are written once
//! per run while node deferral is on. Nothing else is deduplicated here.

use xref_core::constants::NOMINAL_TYPE_SUFFIX;
use xref_core::errors::{BuiltinError, ObserverError, ObserverResult};
use xref_core::types::collections::FxHashSet;

use super::IndexingObserver;
use crate::claim::ClaimClient;
use crate::hashing::compress_string;
use crate::ids::{NameId, NodeId};
use crate::marked_source::{MarkedSource, MarkedSourceKind};
use crate::recorder::GraphRecorder;
use crate::schema::{
    Completeness, EdgeKind, EnumKind, FunctionSubkind, NodeKind, PropertyKind, RecordKind, VariableSubkind,
};
use crate::source::SourceMap;
use crate::vname::VName;

/// Records semantic nodes and the facts that define them.
pub trait NodeRecording {
    fn record_variable_node(
        &mut self,
        node: &NodeId,
        completeness: Completeness,
        subkind: VariableSubkind,
        marked_source: Option<&MarkedSource>,
    );

    fn record_function_node(
        &mut self,
        node: &NodeId,
        completeness: Completeness,
        subkind: FunctionSubkind,
        marked_source: Option<&MarkedSource>,
    );

    fn record_record_node(
        &mut self,
        node: &NodeId,
        kind: RecordKind,
        completeness: Completeness,
        marked_source: Option<&MarkedSource>,
    );

    fn record_enum_node(&mut self, node: &NodeId, completeness: Completeness, kind: EnumKind);

    fn record_integer_constant_node(&mut self, node: &NodeId, value: i128);

    fn record_namespace_node(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>);

    /// Identity of the alias `alias_name` for `aliased_type`.
    fn node_id_for_type_alias_node(&self, alias_name: &NameId, aliased_type: &NodeId) -> NodeId;

    /// Record the alias `alias`. `root_aliased_type` is the first non-alias
    /// type reached by following the alias chain.
    fn record_type_alias_node(
        &mut self,
        alias: &NodeId,
        aliased_type: &NodeId,
        root_aliased_type: Option<&NodeId>,
        marked_source: Option<&MarkedSource>,
    );

    /// Record `tycon` applied to `params`. Parameters at or past
    /// `first_default_param` were defaulted; passing `params.len()` means
    /// none were.
    fn record_tapp_node(
        &mut self,
        tycon: &NodeId,
        params: &[NodeId],
        first_default_param: usize,
    ) -> ObserverResult<NodeId>;

    /// Record an argument pack.
    fn record_tsigma_node(&mut self, params: &[NodeId]) -> NodeId;

    /// Identity shared by every declaration of the named type.
    fn node_id_for_nominal_type_node(&self, name: &NameId) -> NodeId;

    fn record_nominal_type_node(
        &mut self,
        name: &NameId,
        marked_source: Option<&MarkedSource>,
        parent: Option<&NodeId>,
    ) -> NodeId;

    fn record_abs_node(&mut self, node: &NodeId);

    fn record_abs_var_node(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>);

    /// A name that cannot be resolved until instantiation.
    fn record_lookup_node(&mut self, node: &NodeId, name: &str);

    fn record_interface_node(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>);

    /// A node whose kind the schema does not name.
    fn record_user_defined_node(&mut self, node: &NodeId, kind: &str, completeness: Option<Completeness>);

    fn record_macro_node(&mut self, node: &NodeId);

    fn record_marked_source(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>);

    /// Identity of the builtin `spelling`, emitting it on first use.
    ///
    /// Unknown spellings are synthesized unless the observer runs in strict
    /// mode, where they are an error.
    fn node_id_for_builtin_type(&mut self, spelling: &str) -> ObserverResult<NodeId>;

    /// Attach documentation `text` to `node`. `linked_nodes` are the nodes
    /// the text links to, in order.
    fn record_documentation_text(&mut self, node: &NodeId, text: &str, linked_nodes: &[NodeId]);
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> IndexingObserver<R, C, S> {
    /// True if `key` has not been written yet, or deferral is off.
    fn first_write(deferring: bool, written: &mut FxHashSet<String>, key: &str) -> bool {
        !deferring || written.insert(key.to_string())
    }

    fn joined_claimed_strings(params: &[NodeId]) -> String {
        params
            .iter()
            .map(NodeId::to_claimed_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn record_param_edges(&mut self, node: &VName, params: &[&NodeId]) {
        for (ordinal, param) in (0u32..).zip(params) {
            let param = self.vname_for_node(param);
            self.recorder
                .add_edge(node, EdgeKind::Param, &param, Some(ordinal));
        }
    }
}

impl<R: GraphRecorder, C: ClaimClient, S: SourceMap> NodeRecording for IndexingObserver<R, C, S> {
    fn record_variable_node(
        &mut self,
        node: &NodeId,
        completeness: Completeness,
        subkind: VariableSubkind,
        marked_source: Option<&MarkedSource>,
    ) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Variable);
        self.add_completeness(&vname, completeness);
        if subkind == VariableSubkind::Field {
            self.recorder.add_property(&vname, PropertyKind::Subkind, "field");
        }
        self.add_marked_source(&vname, marked_source);
    }

    fn record_function_node(
        &mut self,
        node: &NodeId,
        completeness: Completeness,
        subkind: FunctionSubkind,
        marked_source: Option<&MarkedSource>,
    ) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Function);
        self.add_completeness(&vname, completeness);
        if let Some(subkind) = subkind.spelling() {
            self.recorder.add_property(&vname, PropertyKind::Subkind, subkind);
        }
        self.add_marked_source(&vname, marked_source);
    }

    fn record_record_node(
        &mut self,
        node: &NodeId,
        kind: RecordKind,
        completeness: Completeness,
        marked_source: Option<&MarkedSource>,
    ) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Record);
        self.recorder
            .add_property(&vname, PropertyKind::Subkind, kind.spelling());
        self.add_completeness(&vname, completeness);
        self.add_marked_source(&vname, marked_source);
    }

    fn record_enum_node(&mut self, node: &NodeId, completeness: Completeness, kind: EnumKind) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Sum);
        self.add_completeness(&vname, completeness);
        let subkind = match kind {
            EnumKind::Scoped => "enumClass",
            EnumKind::Unscoped => "enum",
        };
        self.recorder.add_property(&vname, PropertyKind::Subkind, subkind);
    }

    fn record_integer_constant_node(&mut self, node: &NodeId, value: i128) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Constant);
        self.recorder
            .add_property(&vname, PropertyKind::Text, &value.to_string());
    }

    fn record_namespace_node(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>) {
        if !Self::first_write(self.deferring_nodes, &mut self.written_namespaces, &node.to_claimed_string()) {
            return;
        }
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Package);
        self.recorder
            .add_property(&vname, PropertyKind::Subkind, "namespace");
        self.add_marked_source(&vname, marked_source);
    }

    fn node_id_for_type_alias_node(&self, alias_name: &NameId, aliased_type: &NodeId) -> NodeId {
        let identity = format!("talias({alias_name},{})", aliased_type.to_claimed_string());
        self.mint(&self.type_token, &identity)
    }

    fn record_type_alias_node(
        &mut self,
        alias: &NodeId,
        aliased_type: &NodeId,
        root_aliased_type: Option<&NodeId>,
        marked_source: Option<&MarkedSource>,
    ) {
        if !Self::first_write(self.deferring_nodes, &mut self.written_types, &alias.to_claimed_string()) {
            return;
        }
        let vname = self.vname_for_node(alias);
        self.recorder.add_node_kind(&vname, NodeKind::TAlias);
        let aliased = self.vname_for_node(aliased_type);
        self.recorder.add_edge(&vname, EdgeKind::Aliases, &aliased, None);
        if let Some(root) = root_aliased_type {
            let root = self.vname_for_node(root);
            self.recorder.add_edge(&vname, EdgeKind::AliasesRoot, &root, None);
        }
        self.add_marked_source(&vname, marked_source);
    }

    fn record_tapp_node(
        &mut self,
        tycon: &NodeId,
        params: &[NodeId],
        first_default_param: usize,
    ) -> ObserverResult<NodeId> {
        if first_default_param > params.len() {
            return Err(ObserverError::InvalidArgument {
                operation: "record_tapp_node",
                message: format!(
                    "first default parameter {first_default_param} is past {} parameters",
                    params.len()
                ),
            });
        }
        let identity = format!(
            "{}({})",
            tycon.to_claimed_string(),
            Self::joined_claimed_strings(params)
        );
        let id = self.mint(&self.type_token, &identity);
        if !Self::first_write(self.deferring_nodes, &mut self.written_types, &id.to_claimed_string()) {
            return Ok(id);
        }
        let vname = self.vname_for_node(&id);
        self.recorder.add_node_kind(&vname, NodeKind::TApp);
        if first_default_param < params.len() {
            self.recorder.add_property(
                &vname,
                PropertyKind::ParamDefault,
                &first_default_param.to_string(),
            );
        }
        let ordered: Vec<&NodeId> = std::iter::once(tycon).chain(params).collect();
        self.record_param_edges(&vname, &ordered);
        Ok(id)
    }

    fn record_tsigma_node(&mut self, params: &[NodeId]) -> NodeId {
        let identity = format!("#sigma({})", Self::joined_claimed_strings(params));
        let id = self.mint(&self.type_token, &identity);
        if !Self::first_write(self.deferring_nodes, &mut self.written_types, &id.to_claimed_string()) {
            return id;
        }
        let vname = self.vname_for_node(&id);
        self.recorder.add_node_kind(&vname, NodeKind::TSigma);
        let ordered: Vec<&NodeId> = params.iter().collect();
        self.record_param_edges(&vname, &ordered);
        id
    }

    fn node_id_for_nominal_type_node(&self, name: &NameId) -> NodeId {
        self.mint(&self.type_token, &format!("{name}{NOMINAL_TYPE_SUFFIX}"))
    }

    fn record_nominal_type_node(
        &mut self,
        name: &NameId,
        marked_source: Option<&MarkedSource>,
        parent: Option<&NodeId>,
    ) -> NodeId {
        let id = self.node_id_for_nominal_type_node(name);
        if !Self::first_write(self.deferring_nodes, &mut self.written_types, &id.to_claimed_string()) {
            return id;
        }
        let vname = self.vname_for_node(&id);
        self.recorder.add_node_kind(&vname, NodeKind::TNominal);
        self.add_marked_source(&vname, marked_source);
        if let Some(parent) = parent {
            let parent = self.vname_for_node(parent);
            self.recorder.add_edge(&vname, EdgeKind::ChildOf, &parent, None);
        }
        id
    }

    fn record_abs_node(&mut self, node: &NodeId) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Abs);
    }

    fn record_abs_var_node(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::AbsVar);
        self.add_marked_source(&vname, marked_source);
    }

    fn record_lookup_node(&mut self, node: &NodeId, name: &str) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Lookup);
        self.recorder.add_property(&vname, PropertyKind::Text, name);
        let signature = MarkedSource::boxed(vec![
            MarkedSource::new(MarkedSourceKind::Context)
                .with_pre_text("dependent(")
                .with_post_text(")::")
                .with_child(MarkedSource::identifier("...")),
            MarkedSource::identifier(name),
        ]);
        self.recorder.add_marked_source(&vname, &signature);
    }

    fn record_interface_node(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Interface);
        self.add_marked_source(&vname, marked_source);
    }

    fn record_user_defined_node(&mut self, node: &NodeId, kind: &str, completeness: Option<Completeness>) {
        let vname = self.vname_for_node(node);
        self.recorder.add_property(&vname, PropertyKind::NodeKind, kind);
        if let Some(completeness) = completeness {
            self.add_completeness(&vname, completeness);
        }
    }

    fn record_macro_node(&mut self, node: &NodeId) {
        let vname = self.vname_for_node(node);
        self.recorder.add_node_kind(&vname, NodeKind::Macro);
    }

    fn record_marked_source(&mut self, node: &NodeId, marked_source: Option<&MarkedSource>) {
        let vname = self.vname_for_node(node);
        self.add_marked_source(&vname, marked_source);
    }

    fn node_id_for_builtin_type(&mut self, spelling: &str) -> ObserverResult<NodeId> {
        if self.builtins.get(spelling).is_none() {
            if self.options.fail_on_unimplemented_builtin {
                return Err(BuiltinError::Missing {
                    spelling: spelling.to_string(),
                }
                .into());
            }
            tracing::warn!(spelling, "synthesizing missing builtin");
            self.stats.builtins_synthesized += 1;
        }
        let builtin = self.builtins.synthesize(spelling);
        let id = builtin.node_id.clone();
        if builtin.emitted {
            return Ok(id);
        }
        builtin.emitted = true;
        let marked_source = builtin.marked_source.clone();
        let vname = self.vname_for_node(&id);
        self.recorder.add_node_kind(&vname, NodeKind::Builtin);
        self.recorder.add_marked_source(&vname, &marked_source);
        Ok(id)
    }

    fn record_documentation_text(&mut self, node: &NodeId, text: &str, linked_nodes: &[NodeId]) {
        let mut signature = text.to_string();
        for linked in linked_nodes {
            signature.push(',');
            signature.push_str(&linked.to_claimed_string());
        }
        let doc = NodeId::uncompressed(
            node.token().clone(),
            compress_string(&signature, true, self.options.compress_threshold),
        );
        let doc_vname = self.vname_for_node(&doc);
        if Self::first_write(self.deferring_nodes, &mut self.written_docs, &doc.to_claimed_string()) {
            self.recorder.add_node_kind(&doc_vname, NodeKind::Doc);
            self.recorder.add_property(&doc_vname, PropertyKind::Text, text);
            let linked: Vec<&NodeId> = linked_nodes.iter().collect();
            self.record_param_edges(&doc_vname, &linked);
        }
        let documented = self.vname_for_node(node);
        self.recorder
            .add_edge(&doc_vname, EdgeKind::Documents, &documented, None);
    }
}
