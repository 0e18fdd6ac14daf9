//! Preprocessor context table.
//!
//! Records, for an including file under a given context, which context the
//! file included at a given offset is processed under.

use xref_core::types::collections::FxHashMap;
use xref_core::types::FileUid;

/// Outcome of a context lookup. Each miss names the level that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextLookup<'a> {
    Found(&'a str),
    MissingPath,
    MissingContext,
    MissingOffset,
}

impl ContextLookup<'_> {
    pub fn miss_reason(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::MissingPath => Some("missing source path"),
            Self::MissingContext => Some("missing source context"),
            Self::MissingOffset => Some("missing source offset"),
        }
    }
}

/// `file -> context -> offset -> destination context`.
#[derive(Debug, Default, Clone)]
pub struct ContextTable {
    paths: FxHashMap<FileUid, FxHashMap<String, FxHashMap<u32, String>>>,
}

impl ContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileUid, context: &str, offset: u32, dest_context: &str) {
        self.paths
            .entry(file)
            .or_default()
            .entry(context.to_string())
            .or_default()
            .insert(offset, dest_context.to_string());
    }

    pub fn lookup(&self, file: FileUid, context: &str, offset: u32) -> ContextLookup<'_> {
        let Some(contexts) = self.paths.get(&file) else {
            return ContextLookup::MissingPath;
        };
        let Some(offsets) = contexts.get(context) else {
            return ContextLookup::MissingContext;
        };
        match offsets.get(&offset) {
            Some(dest) => ContextLookup::Found(dest),
            None => ContextLookup::MissingOffset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xref_core::types::PathInterner;

    #[test]
    fn lookup_reports_each_missing_level() {
        let interner = PathInterner::new();
        let main = interner.intern("main.cc");
        let other = interner.intern("other.cc");
        let mut table = ContextTable::new();
        table.insert(main, "ctx", 10, "hdr");

        assert_eq!(table.lookup(main, "ctx", 10), ContextLookup::Found("hdr"));
        assert_eq!(table.lookup(other, "ctx", 10), ContextLookup::MissingPath);
        assert_eq!(table.lookup(main, "nope", 10), ContextLookup::MissingContext);
        assert_eq!(table.lookup(main, "ctx", 11), ContextLookup::MissingOffset);
        assert_eq!(
            table.lookup(main, "ctx", 11).miss_reason(),
            Some("missing source offset")
        );
    }
}
