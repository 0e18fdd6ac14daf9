//! VNames and file naming.

use serde::{Deserialize, Serialize};
use xref_core::config::VNameConfig;
use xref_core::types::collections::FxHashMap;

/// A structured stable name identifying a graph node or anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct VName {
    pub signature: String,
    pub corpus: String,
    pub root: String,
    pub path: String,
    pub language: String,
}

impl VName {
    /// A VName naming a file: only corpus, root, and path are set.
    pub fn file(corpus: &str, root: &str, path: &str) -> Self {
        Self {
            corpus: corpus.to_string(),
            root: root.to_string(),
            path: path.to_string(),
            ..Self::default()
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.signature.is_empty()
            && self.corpus.is_empty()
            && self.root.is_empty()
            && self.path.is_empty()
            && self.language.is_empty()
    }
}

/// Maps the paths of a compilation's inputs to their file VNames.
///
/// Paths without an explicit entry get the default corpus and a path made
/// relative to the working directory.
#[derive(Debug, Clone, Default)]
pub struct FileVNames {
    table: FxHashMap<String, VName>,
    default_corpus: String,
    working_directory: Option<String>,
}

impl FileVNames {
    pub fn new(default_corpus: &str, working_directory: Option<&str>) -> Self {
        Self {
            table: FxHashMap::default(),
            default_corpus: default_corpus.to_string(),
            working_directory: working_directory.map(clean_path),
        }
    }

    pub fn from_config(config: &VNameConfig) -> Self {
        Self::new(
            config.effective_default_corpus(),
            config.working_directory.as_deref(),
        )
    }

    /// Register the VName of a required input.
    pub fn insert(&mut self, path: &str, vname: VName) {
        self.table.insert(clean_path(path), vname);
    }

    pub fn default_corpus(&self) -> &str {
        &self.default_corpus
    }

    /// The VName registered for `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&VName> {
        self.table.get(&clean_path(path))
    }

    /// Resolve `path` to a file VName.
    pub fn vname_for_path(&self, path: &str) -> VName {
        let cleaned = clean_path(path);
        if let Some(vname) = self.table.get(&cleaned) {
            return VName::file(&vname.corpus, &vname.root, &vname.path);
        }
        let relative = match &self.working_directory {
            Some(dir) => relativize_path(&cleaned, dir),
            None => cleaned,
        };
        VName::file(&self.default_corpus, "", &relative)
    }
}

/// Collapse `.` and `..` components and repeated separators.
pub fn clean_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Strip `against` from the front of `path` when `path` lives beneath it.
pub fn relativize_path(path: &str, against: &str) -> String {
    let path = clean_path(path);
    let against = clean_path(against);
    let parent = match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    };
    if parent.starts_with(&against) && path.len() > against.len() + 1 {
        let rest = &path[against.len()..];
        if let Some(stripped) = rest.strip_prefix('/') {
            return stripped.to_string();
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_path_collapses_dots() {
        assert_eq!(clean_path("a/./b/../c"), "a/c");
        assert_eq!(clean_path("/src//x/../y.h"), "/src/y.h");
        assert_eq!(clean_path("../inc/a.h"), "../inc/a.h");
        assert_eq!(clean_path("./"), ".");
    }

    #[test]
    fn relativize_under_working_directory() {
        assert_eq!(relativize_path("/work/src/a.cc", "/work"), "src/a.cc");
        assert_eq!(relativize_path("/other/a.cc", "/work"), "/other/a.cc");
        assert_eq!(relativize_path("/workshop/a.cc", "/work"), "/workshop/a.cc");
    }

    #[test]
    fn explicit_entries_win() {
        let mut names = FileVNames::new("corp", Some("/work"));
        names.insert("/work/gen/a.h", VName::file("gen", "bazel-out", "a.h"));
        let vname = names.vname_for_path("/work/gen/./a.h");
        assert_eq!(vname.corpus, "gen");
        assert_eq!(vname.root, "bazel-out");
        assert_eq!(vname.path, "a.h");
        assert!(vname.signature.is_empty());

        let fallback = names.vname_for_path("/work/b.h");
        assert_eq!(fallback.corpus, "corp");
        assert_eq!(fallback.path, "b.h");
    }
}
