//! String interning for file paths.
//!
//! Uses `lasso::ThreadedRodeo` so a source map can be built on one thread
//! and read from the indexing thread.

use lasso::{Spur, ThreadedRodeo};

use super::identifiers::FileUid;

/// Path interner that normalizes path separators before interning.
///
/// Converts all backslashes to forward slashes, collapses `//`, and removes
/// trailing slashes so the same file always gets the same `FileUid`.
pub struct PathInterner {
    inner: ThreadedRodeo,
}

impl PathInterner {
    /// Create a new path interner.
    pub fn new() -> Self {
        Self {
            inner: ThreadedRodeo::default(),
        }
    }

    /// Intern a path, normalizing separators first.
    pub fn intern(&self, path: &str) -> FileUid {
        let normalized = Self::normalize(path);
        FileUid::new(self.inner.get_or_intern(&normalized))
    }

    /// Look up a previously interned path without inserting.
    pub fn get(&self, path: &str) -> Option<FileUid> {
        let normalized = Self::normalize(path);
        self.inner.get(&normalized).map(FileUid::new)
    }

    /// Resolve a uid back to its normalized path.
    pub fn resolve(&self, uid: FileUid) -> &str {
        let key: Spur = uid.into();
        self.inner.resolve(&key)
    }

    /// Number of distinct paths interned so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn normalize(path: &str) -> String {
        let mut result = path.replace('\\', "/");
        while result.contains("//") {
            result = result.replace("//", "/");
        }
        if result.len() > 1 && result.ends_with('/') {
            result.pop();
        }
        result
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PathInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathInterner")
            .field("len", &self.inner.len())
            .finish()
    }
}
