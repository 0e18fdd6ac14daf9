//! Graph schema: node kinds, edge kinds, properties, and the small enums the
//! walker passes alongside them.

macro_rules! spelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $spelling:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire spelling of this kind.
            pub fn spelling(self) -> &'static str {
                match self {
                    $($name::$variant => $spelling),+
                }
            }

            /// Parse a wire spelling.
            pub fn from_spelling(spelling: &str) -> Option<Self> {
                match spelling {
                    $($spelling => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.spelling())
            }
        }
    };
}

spelled_enum!(
    EdgeKind {
        Aliases => "/kythe/edge/aliases",
        AliasesRoot => "/kythe/edge/aliases/root",
        BoundedUpper => "/kythe/edge/bounded/upper",
        ChildOf => "/kythe/edge/childof",
        ChildOfContext => "/kythe/edge/childof/context",
        Completes => "/kythe/edge/completes",
        CompletesUniquely => "/kythe/edge/completes/uniquely",
        Defines => "/kythe/edge/defines",
        DefinesBinding => "/kythe/edge/defines/binding",
        Documents => "/kythe/edge/documents",
        Extends => "/kythe/edge/extends",
        ExtendsCategory => "/kythe/edge/extends/category",
        ExtendsPrivate => "/kythe/edge/extends/private",
        ExtendsPrivateVirtual => "/kythe/edge/extends/private/virtual",
        ExtendsProtected => "/kythe/edge/extends/protected",
        ExtendsProtectedVirtual => "/kythe/edge/extends/protected/virtual",
        ExtendsPublic => "/kythe/edge/extends/public",
        ExtendsPublicVirtual => "/kythe/edge/extends/public/virtual",
        ExtendsVirtual => "/kythe/edge/extends/virtual",
        Generates => "/kythe/edge/generates",
        HasType => "/kythe/edge/typed",
        Instantiates => "/kythe/edge/instantiates",
        InstantiatesSpeculative => "/kythe/edge/instantiates/speculative",
        Overrides => "/kythe/edge/overrides",
        OverridesRoot => "/kythe/edge/overrides/root",
        Param => "/kythe/edge/param",
        Ref => "/kythe/edge/ref",
        RefCall => "/kythe/edge/ref/call",
        RefDoc => "/kythe/edge/ref/doc",
        RefExpands => "/kythe/edge/ref/expands",
        RefExpandsTransitive => "/kythe/edge/ref/expands/transitive",
        RefIncludes => "/kythe/edge/ref/includes",
        RefQueries => "/kythe/edge/ref/queries",
        Specializes => "/kythe/edge/specializes",
        SpecializesSpeculative => "/kythe/edge/specializes/speculative",
        Undefines => "/kythe/edge/undefines",
    }
);

spelled_enum!(
    NodeKind {
        Abs => "abs",
        AbsVar => "absvar",
        Anchor => "anchor",
        Builtin => "tbuiltin",
        Constant => "constant",
        Doc => "doc",
        File => "file",
        Function => "function",
        Interface => "interface",
        Lookup => "lookup",
        Macro => "macro",
        Meta => "meta",
        Package => "package",
        Record => "record",
        Sum => "sum",
        TAlias => "talias",
        TApp => "tapp",
        TNominal => "tnominal",
        TSigma => "tsigma",
        Variable => "variable",
    }
);

spelled_enum!(
    PropertyKind {
        Code => "/kythe/code",
        Complete => "/kythe/complete",
        LocationEnd => "/kythe/loc/end",
        LocationStart => "/kythe/loc/start",
        NodeKind => "/kythe/node/kind",
        ParamDefault => "/kythe/param/default",
        Subkind => "/kythe/subkind",
        Text => "/kythe/text",
        Variance => "/kythe/variance",
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// The node is defined here.
    Definition,
    /// Complete, but the definition lives elsewhere (a type with a body).
    Complete,
    /// A forward declaration.
    Incomplete,
}

impl Completeness {
    pub fn spelling(self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSubkind {
    None,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSubkind {
    None,
    Constructor,
    Destructor,
}

impl FunctionSubkind {
    pub fn spelling(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Constructor => Some("constructor"),
            Self::Destructor => Some("destructor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Class,
    Struct,
    Union,
    Category,
}

impl RecordKind {
    pub fn spelling(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    Scoped,
    Unscoped,
}

/// Whether an instantiation or specialization edge is certain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    NonSpeculative,
    Speculative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specificity {
    UniquelyCompletes,
    Completes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    Contravariant,
    Covariant,
    Invariant,
}

impl Variance {
    pub fn spelling(self) -> &'static str {
        match self {
            Self::Contravariant => "contravariant",
            Self::Covariant => "covariant",
            Self::Invariant => "invariant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSpecifier {
    Public,
    Protected,
    Private,
    None,
}

/// Whether an anchor edge may be dropped when neither its range nor its
/// target is claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claimability {
    /// Emitted only if the range or the target is claimed.
    Claimable,
    /// Emitted unconditionally.
    Unclaimable,
}

impl EdgeKind {
    /// The extends edge for an access specifier and virtual flag.
    pub fn extends(access: AccessSpecifier, is_virtual: bool) -> Self {
        match (access, is_virtual) {
            (AccessSpecifier::Public, false) => Self::ExtendsPublic,
            (AccessSpecifier::Public, true) => Self::ExtendsPublicVirtual,
            (AccessSpecifier::Protected, false) => Self::ExtendsProtected,
            (AccessSpecifier::Protected, true) => Self::ExtendsProtectedVirtual,
            (AccessSpecifier::Private, false) => Self::ExtendsPrivate,
            (AccessSpecifier::Private, true) => Self::ExtendsPrivateVirtual,
            (AccessSpecifier::None, false) => Self::Extends,
            (AccessSpecifier::None, true) => Self::ExtendsVirtual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_round_trip() {
        for kind in EdgeKind::ALL {
            assert_eq!(EdgeKind::from_spelling(kind.spelling()), Some(*kind));
        }
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_spelling(kind.spelling()), Some(*kind));
        }
        assert_eq!(EdgeKind::from_spelling("/kythe/edge/bogus"), None);
    }

    #[test]
    fn extends_edges() {
        assert_eq!(
            EdgeKind::extends(AccessSpecifier::Protected, true).spelling(),
            "/kythe/edge/extends/protected/virtual"
        );
        assert_eq!(EdgeKind::extends(AccessSpecifier::None, false), EdgeKind::Extends);
    }
}
