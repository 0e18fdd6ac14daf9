//! Source model: locations, ranges, and the source map that resolves them.

use xref_core::errors::LocationError;
use xref_core::types::collections::FxHashMap;
use xref_core::types::{FileUid, PathInterner};

/// One buffer instance. Each inclusion of a file gets its own `FileId`;
/// all inclusions of the same physical file share a [`FileUid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// One macro expansion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpansionId(pub u32);

/// A compiler source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceLocation {
    #[default]
    Invalid,
    /// A byte offset into a buffer.
    File { file: FileId, offset: u32 },
    /// A position inside the tokens produced by a macro expansion.
    Macro { expansion: ExpansionId, offset: u32 },
}

impl SourceLocation {
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    pub fn is_macro(self) -> bool {
        matches!(self, Self::Macro { .. })
    }

    /// The buffer this location points into, if it is a file location.
    pub fn file_id(self) -> Option<FileId> {
        match self {
            Self::File { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Offset within the buffer or expansion; 0 for invalid locations.
    pub fn offset(self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::File { offset, .. } | Self::Macro { offset, .. } => offset,
        }
    }

    pub fn advanced(self, by: u32) -> Self {
        match self {
            Self::Invalid => Self::Invalid,
            Self::File { file, offset } => Self::File {
                file,
                offset: offset + by,
            },
            Self::Macro { expansion, offset } => Self::Macro {
                expansion,
                offset: offset + by,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(begin: SourceLocation, end: SourceLocation) -> Self {
        Self { begin, end }
    }

    /// A range covering a single location.
    pub fn point(loc: SourceLocation) -> Self {
        Self {
            begin: loc,
            end: loc,
        }
    }
}

/// A physical file backing one or more buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub uid: FileUid,
    pub name: String,
}

/// Read access to the compiler's source manager.
pub trait SourceMap {
    /// One step up a macro expansion: where the macro was invoked.
    /// Non-macro locations are returned unchanged.
    fn immediate_expansion(&self, loc: SourceLocation) -> SourceLocation;

    /// One step toward where the tokens of a macro expansion were spelled.
    /// Non-macro locations are returned unchanged.
    fn immediate_spelling(&self, loc: SourceLocation) -> SourceLocation;

    /// The file entry backing a buffer; `None` for builtin or scratch buffers.
    fn file_entry(&self, file: FileId) -> Option<&FileEntry>;

    /// Characters from `loc` to the end of the token starting there.
    fn token_text(&self, loc: SourceLocation) -> Option<&str>;

    /// Full contents of a physical file, if readable.
    fn file_contents(&self, uid: FileUid) -> Option<&[u8]>;

    /// Resolve a path to the uid of the file it names.
    fn uid_for_path(&self, path: &str) -> Option<FileUid>;

    /// Human-readable name of a uid for diagnostics.
    fn describe_uid(&self, uid: FileUid) -> String;

    /// Follow expansion steps until a file location is reached.
    fn expansion_loc(&self, loc: SourceLocation, max_depth: u32) -> Result<SourceLocation, LocationError> {
        follow(loc, max_depth, |l| self.immediate_expansion(l))
    }

    /// Follow spelling steps until a file location is reached.
    fn spelling_loc(&self, loc: SourceLocation, max_depth: u32) -> Result<SourceLocation, LocationError> {
        follow(loc, max_depth, |l| self.immediate_spelling(l))
    }

    /// Look for a file entry anywhere along the expansion history of `loc`,
    /// preferring expansion sites over spelling sites.
    fn search_for_file_entry(&self, loc: SourceLocation, max_depth: u32) -> Option<&FileEntry> {
        if max_depth == 0 || !loc.is_valid() {
            return None;
        }
        if let SourceLocation::File { file, .. } = loc {
            return self.file_entry(file);
        }
        let expansion = self.immediate_expansion(loc);
        if expansion != loc {
            if let Some(entry) = self.search_for_file_entry(expansion, max_depth - 1) {
                return Some(entry);
            }
        }
        let spelling = self.immediate_spelling(loc);
        if spelling != loc {
            return self.search_for_file_entry(spelling, max_depth - 1);
        }
        None
    }
}

fn follow(
    mut loc: SourceLocation,
    max_depth: u32,
    step: impl Fn(SourceLocation) -> SourceLocation,
) -> Result<SourceLocation, LocationError> {
    let mut depth = 0;
    while loc.is_macro() {
        if depth >= max_depth {
            return Err(LocationError::ExpansionDepthExceeded { max: max_depth });
        }
        loc = step(loc);
        depth += 1;
    }
    Ok(loc)
}

impl<T: SourceMap + ?Sized> SourceMap for &T {
    fn immediate_expansion(&self, loc: SourceLocation) -> SourceLocation {
        (**self).immediate_expansion(loc)
    }
    fn immediate_spelling(&self, loc: SourceLocation) -> SourceLocation {
        (**self).immediate_spelling(loc)
    }
    fn file_entry(&self, file: FileId) -> Option<&FileEntry> {
        (**self).file_entry(file)
    }
    fn token_text(&self, loc: SourceLocation) -> Option<&str> {
        (**self).token_text(loc)
    }
    fn file_contents(&self, uid: FileUid) -> Option<&[u8]> {
        (**self).file_contents(uid)
    }
    fn uid_for_path(&self, path: &str) -> Option<FileUid> {
        (**self).uid_for_path(path)
    }
    fn describe_uid(&self, uid: FileUid) -> String {
        (**self).describe_uid(uid)
    }
}

#[derive(Debug)]
struct Buffer {
    entry: Option<FileEntry>,
    /// Text of buffers without a file entry.
    scratch: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Expansion {
    expansion: SourceLocation,
    spelling: SourceLocation,
}

/// An owned source manager for walkers that do not sit on a compiler
/// frontend, and for tests.
#[derive(Debug, Default)]
pub struct InMemorySourceMap {
    interner: PathInterner,
    contents: FxHashMap<FileUid, Vec<u8>>,
    buffers: Vec<Buffer>,
    expansions: Vec<Expansion>,
}

impl InMemorySourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a file. Every call mints a new buffer; the same path always maps
    /// to the same uid, and its contents are replaced.
    pub fn add_file(&mut self, path: &str, contents: impl AsRef<[u8]>) -> FileId {
        let id = self.add_unreadable_file(path);
        if let Some(entry) = &self.buffers[id.0 as usize].entry {
            self.contents.insert(entry.uid, contents.as_ref().to_vec());
        }
        id
    }

    /// Enter a file whose contents cannot be read.
    pub fn add_unreadable_file(&mut self, path: &str) -> FileId {
        let uid = self.interner.intern(path);
        let name = self.interner.resolve(uid).to_string();
        self.push_buffer(Buffer {
            entry: Some(FileEntry { uid, name }),
            scratch: None,
        })
    }

    /// A buffer with no file behind it, like the predefines buffer.
    pub fn add_scratch_buffer(&mut self, text: &str) -> FileId {
        self.push_buffer(Buffer {
            entry: None,
            scratch: Some(text.to_string()),
        })
    }

    /// Record a macro expansion invoked at `expansion` whose tokens were
    /// spelled starting at `spelling`.
    pub fn add_expansion(&mut self, expansion: SourceLocation, spelling: SourceLocation) -> ExpansionId {
        let id = ExpansionId(self.expansions.len() as u32);
        self.expansions.push(Expansion {
            expansion,
            spelling,
        });
        id
    }

    /// A location at `offset` in `file`.
    pub fn loc(&self, file: FileId, offset: u32) -> SourceLocation {
        SourceLocation::File { file, offset }
    }

    /// A location `offset` bytes into the tokens of `expansion`.
    pub fn macro_loc(&self, expansion: ExpansionId, offset: u32) -> SourceLocation {
        SourceLocation::Macro { expansion, offset }
    }

    fn push_buffer(&mut self, buffer: Buffer) -> FileId {
        let id = FileId(self.buffers.len() as u32);
        self.buffers.push(buffer);
        id
    }

    fn buffer_text(&self, file: FileId) -> Option<&str> {
        let buffer = self.buffers.get(file.0 as usize)?;
        match &buffer.entry {
            Some(entry) => self
                .contents
                .get(&entry.uid)
                .and_then(|bytes| std::str::from_utf8(bytes).ok()),
            None => buffer.scratch.as_deref(),
        }
    }
}

impl SourceMap for InMemorySourceMap {
    fn immediate_expansion(&self, loc: SourceLocation) -> SourceLocation {
        match loc {
            SourceLocation::Macro { expansion, .. } => self
                .expansions
                .get(expansion.0 as usize)
                .map_or(SourceLocation::Invalid, |e| e.expansion),
            other => other,
        }
    }

    fn immediate_spelling(&self, loc: SourceLocation) -> SourceLocation {
        match loc {
            SourceLocation::Macro { expansion, offset } => self
                .expansions
                .get(expansion.0 as usize)
                .map_or(SourceLocation::Invalid, |e| e.spelling.advanced(offset)),
            other => other,
        }
    }

    fn file_entry(&self, file: FileId) -> Option<&FileEntry> {
        self.buffers.get(file.0 as usize)?.entry.as_ref()
    }

    fn token_text(&self, loc: SourceLocation) -> Option<&str> {
        let mut loc = loc;
        let mut steps = 0;
        while loc.is_macro() && steps < self.expansions.len() + 1 {
            loc = self.immediate_spelling(loc);
            steps += 1;
        }
        let SourceLocation::File { file, offset } = loc else {
            return None;
        };
        let text = self.buffer_text(file)?;
        let start = offset as usize;
        if start > text.len() || !text.is_char_boundary(start) {
            return None;
        }
        let rest = &text[start..];
        Some(&rest[..token_length(rest)])
    }

    fn file_contents(&self, uid: FileUid) -> Option<&[u8]> {
        self.contents.get(&uid).map(Vec::as_slice)
    }

    fn uid_for_path(&self, path: &str) -> Option<FileUid> {
        self.interner.get(path)
    }

    fn describe_uid(&self, uid: FileUid) -> String {
        self.interner.resolve(uid).to_string()
    }
}

/// Length in bytes of the token at the start of `text`.
fn token_length(text: &str) -> usize {
    let mut chars = text.char_indices();
    let Some((_, first)) = chars.next() else {
        return 0;
    };
    if first.is_alphanumeric() || first == '_' {
        return text
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(text.len(), |(i, _)| i);
    }
    if first == '"' || first == '\'' {
        let mut escaped = false;
        for (i, c) in chars {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == first {
                return i + c.len_utf8();
            }
        }
        return text.len();
    }
    first.len_utf8()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_inclusion_shares_uid() {
        let mut sm = InMemorySourceMap::new();
        let a = sm.add_file("inc/a.h", "int x;");
        let b = sm.add_file("inc/a.h", "int x;");
        assert_ne!(a, b);
        assert_eq!(
            sm.file_entry(a).map(|e| e.uid),
            sm.file_entry(b).map(|e| e.uid)
        );
    }

    #[test]
    fn token_text_spans_one_token() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("a.cc", "int foo_bar = \"a\\\"b\";");
        assert_eq!(sm.token_text(sm.loc(f, 0)), Some("int"));
        assert_eq!(sm.token_text(sm.loc(f, 4)), Some("foo_bar"));
        assert_eq!(sm.token_text(sm.loc(f, 12)), Some("="));
        assert_eq!(sm.token_text(sm.loc(f, 14)), Some("\"a\\\"b\""));
        assert_eq!(sm.token_text(sm.loc(f, 100)), None);
    }

    #[test]
    fn macro_locations_resolve_both_ways() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("a.cc", "#define M foo\nM;");
        let e = sm.add_expansion(sm.loc(f, 14), sm.loc(f, 10));
        let inside = sm.macro_loc(e, 0);
        assert_eq!(sm.expansion_loc(inside, 8).unwrap(), sm.loc(f, 14));
        assert_eq!(sm.spelling_loc(inside, 8).unwrap(), sm.loc(f, 10));
        assert_eq!(sm.token_text(inside), Some("foo"));
    }

    #[test]
    fn expansion_depth_is_capped() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("a.cc", "x");
        let mut loc = sm.loc(f, 0);
        for _ in 0..10 {
            let e = sm.add_expansion(loc, loc);
            loc = sm.macro_loc(e, 0);
        }
        assert!(sm.expansion_loc(loc, 10).is_ok());
        assert!(matches!(
            sm.expansion_loc(loc, 9),
            Err(LocationError::ExpansionDepthExceeded { max: 9 })
        ));
    }

    #[test]
    fn binary_files_keep_bytes_but_have_no_tokens() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("gen.pb.h.meta", [0x0a_u8, 0xff, 0x00]);
        let uid = sm.file_entry(f).map(|e| e.uid).unwrap();
        assert_eq!(sm.file_contents(uid), Some(&[0x0a, 0xff, 0x00][..]));
        assert_eq!(sm.token_text(sm.loc(f, 0)), None);
    }

    #[test]
    fn scratch_buffers_have_no_entry() {
        let mut sm = InMemorySourceMap::new();
        let b = sm.add_scratch_buffer("#define BUILTIN 1");
        assert!(sm.file_entry(b).is_none());
        assert_eq!(sm.token_text(sm.loc(b, 8)), Some("BUILTIN"));
        assert!(sm.search_for_file_entry(sm.loc(b, 0), 4).is_none());
    }
}
