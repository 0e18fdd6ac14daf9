//! Data structures and string interning for xref.
//! FxHashMap, SmallVec, lasso-based interning, Spur-based ID types.

pub mod collections;
pub mod identifiers;
pub mod interning;

pub use collections::{FxHashMap, FxHashSet};
pub use identifiers::FileUid;
pub use interning::PathInterner;
