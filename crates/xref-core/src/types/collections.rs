//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;
pub use std::collections::BTreeMap;

/// SmallVec for the file ids posted while encoding one location (usually <4).
pub type SmallVec4<T> = SmallVec<[T; 4]>;

/// SmallVec for metadata overlays attached to one file (usually 1).
pub type SmallVec2<T> = SmallVec<[T; 2]>;
