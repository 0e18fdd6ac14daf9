//! Structured signatures.
//!
//! A `MarkedSource` is a small tree of text fragments. Lookup nodes stand
//! for another signature bound by index at render time, which lets one
//! template (pointer-to-T, function-of-args-returning-R) render any
//! instantiation without per-shape code.

use serde::{Deserialize, Serialize};
use xref_core::errors::BuiltinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkedSourceKind {
    /// Groups children.
    Box,
    /// The name being declared.
    Identifier,
    /// Qualifiers of the name being declared.
    Context,
    /// A list of parameters.
    Parameter,
    Type,
    /// Renders the bound parameter at `lookup_index`.
    LookupByParam,
    /// Renders every bound parameter from `lookup_index` on.
    ParameterLookupByParam,
    /// Like `ParameterLookupByParam`, stopping at the first defaulted one.
    ParameterLookupByParamWithDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkedSource {
    pub kind: MarkedSourceKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pre_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_child_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_text: String,
    #[serde(default)]
    pub lookup_index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkedSource>,
}

impl MarkedSource {
    pub fn new(kind: MarkedSourceKind) -> Self {
        Self {
            kind,
            pre_text: String::new(),
            post_child_text: String::new(),
            post_text: String::new(),
            lookup_index: 0,
            children: Vec::new(),
        }
    }

    pub fn identifier(text: impl Into<String>) -> Self {
        Self::new(MarkedSourceKind::Identifier).with_pre_text(text)
    }

    pub fn boxed(children: Vec<MarkedSource>) -> Self {
        Self {
            children,
            ..Self::new(MarkedSourceKind::Box)
        }
    }

    pub fn lookup(index: usize) -> Self {
        Self {
            lookup_index: index,
            ..Self::new(MarkedSourceKind::LookupByParam)
        }
    }

    pub fn with_pre_text(mut self, text: impl Into<String>) -> Self {
        self.pre_text = text.into();
        self
    }

    pub fn with_post_child_text(mut self, text: impl Into<String>) -> Self {
        self.post_child_text = text.into();
        self
    }

    pub fn with_post_text(mut self, text: impl Into<String>) -> Self {
        self.post_text = text.into();
        self
    }

    pub fn with_lookup_index(mut self, index: usize) -> Self {
        self.lookup_index = index;
        self
    }

    pub fn with_child(mut self, child: MarkedSource) -> Self {
        self.children.push(child);
        self
    }

    /// Render with every parameter in `params` bound.
    pub fn render(&self, params: &[MarkedSource]) -> String {
        self.render_with_defaults(params, params.len())
    }

    /// Render with parameters at or past `first_default` treated as
    /// defaulted.
    ///
    /// A lookup at index `i` renders `params[i]` with only `params[..i]`
    /// bound, so expansion always terminates.
    pub fn render_with_defaults(&self, params: &[MarkedSource], first_default: usize) -> String {
        let mut out = String::new();
        self.render_into(params, first_default, &mut out);
        out
    }

    fn render_into(&self, params: &[MarkedSource], first_default: usize, out: &mut String) {
        out.push_str(&self.pre_text);
        match self.kind {
            MarkedSourceKind::LookupByParam => {
                if let Some(param) = params.get(self.lookup_index) {
                    let bound = &params[..self.lookup_index];
                    param.render_into(bound, first_default.min(self.lookup_index), out);
                }
            }
            MarkedSourceKind::ParameterLookupByParam => {
                self.render_param_run(params, params.len(), first_default, out);
            }
            MarkedSourceKind::ParameterLookupByParamWithDefaults => {
                let end = first_default.min(params.len());
                self.render_param_run(params, end, first_default, out);
            }
            _ => {
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(&self.post_child_text);
                    }
                    child.render_into(params, first_default, out);
                }
            }
        }
        out.push_str(&self.post_text);
    }

    fn render_param_run(&self, params: &[MarkedSource], end: usize, first_default: usize, out: &mut String) {
        for index in self.lookup_index..end {
            if index > self.lookup_index {
                out.push_str(&self.post_child_text);
            }
            params[index].render_into(&params[..index], first_default.min(index), out);
        }
    }

    /// Reject trees whose lookups reach past `arity` bound parameters.
    pub fn validate_lookups(&self, spelling: &str, arity: usize) -> Result<(), BuiltinError> {
        let out_of_range = match self.kind {
            MarkedSourceKind::LookupByParam => self.lookup_index >= arity,
            MarkedSourceKind::ParameterLookupByParam
            | MarkedSourceKind::ParameterLookupByParamWithDefaults => self.lookup_index > arity,
            _ => false,
        };
        if out_of_range {
            return Err(BuiltinError::LookupOutOfRange {
                spelling: spelling.to_string(),
                index: self.lookup_index,
                arity,
            });
        }
        self.children
            .iter()
            .try_for_each(|child| child.validate_lookups(spelling, arity))
    }

    /// The text of the first identifier outside any context or lookup.
    pub fn render_simple_identifier(&self) -> String {
        self.find(MarkedSourceKind::Identifier)
            .map(|node| node.render(&[]))
            .unwrap_or_default()
    }

    /// The qualified name, optionally followed by the identifier.
    pub fn render_simple_qualified_name(&self, include_identifier: bool) -> String {
        let mut out = String::new();
        if let Some(context) = self.find(MarkedSourceKind::Context) {
            let delimiter = if context.post_child_text.is_empty() {
                "::"
            } else {
                context.post_child_text.as_str()
            };
            let parts: Vec<String> = context
                .children
                .iter()
                .map(|child| child.render(&[]))
                .filter(|part| !part.is_empty())
                .collect();
            out = parts.join(delimiter);
            if include_identifier && !out.is_empty() {
                out.push_str(delimiter);
            }
        }
        if include_identifier {
            out.push_str(&self.render_simple_identifier());
        }
        out
    }

    /// The simple identifiers of every parameter under parameter nodes.
    pub fn render_simple_params(&self) -> Vec<String> {
        let mut params = Vec::new();
        self.collect_params(&mut params);
        params
    }

    fn collect_params(&self, out: &mut Vec<String>) {
        if self.kind == MarkedSourceKind::Parameter {
            out.extend(self.children.iter().map(MarkedSource::render_simple_identifier));
            return;
        }
        for child in &self.children {
            child.collect_params(out);
        }
    }

    fn find(&self, kind: MarkedSourceKind) -> Option<&MarkedSource> {
        if self.kind == kind {
            return Some(self);
        }
        if matches!(
            self.kind,
            MarkedSourceKind::Context
                | MarkedSourceKind::LookupByParam
                | MarkedSourceKind::ParameterLookupByParam
                | MarkedSourceKind::ParameterLookupByParamWithDefaults
        ) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(kind))
    }
}
