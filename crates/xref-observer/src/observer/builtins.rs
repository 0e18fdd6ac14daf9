//! The builtin type registry.

use std::sync::Arc;

use xref_core::constants::BUILTIN_SUFFIX;
use xref_core::errors::BuiltinError;
use xref_core::types::collections::FxHashMap;

use crate::ids::{ClaimToken, NodeId};
use crate::marked_source::{MarkedSource, MarkedSourceKind};

/// Spellings of primitive types and the token each renders as.
const TOKEN_BUILTINS: &[(&str, &str)] = &[
    ("void", "void"),
    ("bool", "bool"),
    ("_Bool", "_Bool"),
    ("signed char", "signed char"),
    ("char", "char"),
    ("char16_t", "char16_t"),
    ("char32_t", "char32_t"),
    ("wchar_t", "wchar_t"),
    ("short", "short"),
    ("int", "int"),
    ("long", "long"),
    ("long long", "long long"),
    ("unsigned char", "unsigned char"),
    ("unsigned short", "unsigned short"),
    ("unsigned int", "unsigned int"),
    ("unsigned long", "unsigned long"),
    ("unsigned long long", "unsigned long long"),
    ("float", "float"),
    ("double", "double"),
    ("long double", "long double"),
    ("nullptr_t", "nullptr_t"),
    ("<dependent type>", "dependent"),
    ("auto", "auto"),
    ("knrfn", "function"),
    ("__int128", "__int128"),
    ("unsigned __int128", "unsigned __int128"),
    ("SEL", "SEL"),
    ("id", "id"),
    ("TypeUnion", "TypeUnion"),
];

/// Type constructors rendered as `<token><parameter>`.
const PREFIX_TYCONS: &[(&str, &str)] = &[
    ("const", "const "),
    ("volatile", "volatile "),
    ("restrict", "restrict "),
    ("ptr", "*"),
    ("lvr", "&"),
    ("rvr", "&&"),
    ("iarr", "[incomplete]"),
    ("carr", "[const]"),
    ("darr", "[dependent]"),
];

#[derive(Debug, Clone)]
pub struct Builtin {
    pub node_id: NodeId,
    pub marked_source: MarkedSource,
    /// Set once the builtin's facts have been recorded.
    pub emitted: bool,
}

/// Maps builtin spellings to their nodes and signature templates.
///
/// Template lookups follow type-application parameter order: index 0 is the
/// constructor itself, index 1 its first argument.
#[derive(Debug)]
pub struct BuiltinRegistry {
    token: Arc<ClaimToken>,
    builtins: FxHashMap<String, Builtin>,
}

impl BuiltinRegistry {
    /// Build the registry with every known builtin registered.
    pub fn new(token: Arc<ClaimToken>) -> Result<Self, BuiltinError> {
        let mut registry = Self {
            token,
            builtins: FxHashMap::default(),
        };
        for (spelling, text) in TOKEN_BUILTINS {
            registry.register(spelling, MarkedSource::identifier(*text), 1)?;
        }
        for (spelling, text) in PREFIX_TYCONS {
            let template = MarkedSource::boxed(vec![MarkedSource::identifier(*text), MarkedSource::lookup(1)]);
            registry.register(spelling, template, 2)?;
        }
        let function = MarkedSource::boxed(vec![
            MarkedSource::lookup(1),
            MarkedSource::new(MarkedSourceKind::ParameterLookupByParam)
                .with_lookup_index(2)
                .with_pre_text("(")
                .with_post_child_text(", ")
                .with_post_text(")"),
        ]);
        registry.register("fn", function.clone(), 2)?;
        registry.register(
            "fnvararg",
            function.with_child(MarkedSource::identifier("vararg")),
            2,
        )?;
        Ok(registry)
    }

    /// Register `spelling` with a template needing `arity` bound parameters.
    pub fn register(&mut self, spelling: &str, template: MarkedSource, arity: usize) -> Result<(), BuiltinError> {
        template.validate_lookups(spelling, arity)?;
        let node_id = NodeId::uncompressed(self.token.clone(), format!("{spelling}{BUILTIN_SUFFIX}"));
        self.builtins.insert(
            spelling.to_string(),
            Builtin {
                node_id,
                marked_source: template,
                emitted: false,
            },
        );
        Ok(())
    }

    pub fn get(&self, spelling: &str) -> Option<&Builtin> {
        self.builtins.get(spelling)
    }

    pub fn get_mut(&mut self, spelling: &str) -> Option<&mut Builtin> {
        self.builtins.get_mut(spelling)
    }

    /// The builtin for `spelling`, registering a one-off identifier builtin
    /// if the spelling is unknown.
    pub fn synthesize(&mut self, spelling: &str) -> &mut Builtin {
        let node_id = NodeId::uncompressed(self.token.clone(), format!("{spelling}{BUILTIN_SUFFIX}"));
        self.builtins
            .entry(spelling.to_string())
            .or_insert_with(|| Builtin {
                node_id,
                marked_source: MarkedSource::identifier(spelling),
                emitted: false,
            })
    }

    pub fn len(&self) -> usize {
        self.builtins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builtins.is_empty()
    }
}
