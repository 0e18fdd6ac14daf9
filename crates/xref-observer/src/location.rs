//! Canonical textual encoding of source ranges.
//!
//! The encoding of a range is a pure function of its kind, its physical
//! bounds, and (for wraiths) its context, so the same range always yields
//! the same anchor signature.

use std::fmt::Write as _;

use xref_core::constants::SYNTACTIC_SUFFIX;
use xref_core::errors::LocationError;
use xref_core::types::collections::SmallVec4;

use crate::hashing::hash_bytes;
use crate::ids::NodeId;
use crate::source::{FileId, SourceLocation, SourceMap, SourceRange};
use crate::vname::FileVNames;

/// A span of source text an anchor can be attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Range {
    /// Begin and end positions directly in the token stream.
    Physical(SourceRange),
    /// No source text exists; identity derives from the node.
    Implicit(NodeId),
    /// A physical range replayed under an instantiation context.
    Wraith { physical: SourceRange, context: NodeId },
}

impl Range {
    pub fn physical(begin: SourceLocation, end: SourceLocation) -> Self {
        Self::Physical(SourceRange::new(begin, end))
    }

    pub fn wraith(physical: SourceRange, context: NodeId) -> Self {
        Self::Wraith { physical, context }
    }

    pub fn source_range(&self) -> Option<SourceRange> {
        match self {
            Self::Physical(range) | Self::Wraith { physical: range, .. } => Some(*range),
            Self::Implicit(_) => None,
        }
    }

    /// The same range with any instantiation context stripped.
    pub fn without_context(&self) -> Range {
        match self {
            Self::Wraith { physical, .. } => Self::Physical(*physical),
            other => other.clone(),
        }
    }
}

/// Encodes locations and ranges against a source map.
pub struct LocationEncoder<'a, S: SourceMap + ?Sized> {
    source_map: &'a S,
    vnames: &'a FileVNames,
    max_depth: u32,
}

impl<'a, S: SourceMap + ?Sized> LocationEncoder<'a, S> {
    pub fn new(source_map: &'a S, vnames: &'a FileVNames, max_depth: u32) -> Self {
        Self {
            source_map,
            vnames,
            max_depth,
        }
    }

    /// Encode `range` into the string used as its anchor signature.
    pub fn encode_range(&self, range: &Range) -> String {
        let mut out = String::new();
        self.append_range(range, &mut out);
        out
    }

    /// Append the encoding of `range`: its begin, its end if different, and
    /// the claimed string of the context for wraiths.
    pub fn append_range(&self, range: &Range, out: &mut String) {
        let (physical, context) = match range {
            Range::Implicit(node) => {
                out.push_str(&node.to_claimed_string());
                out.push_str(SYNTACTIC_SUFFIX);
                return;
            }
            Range::Physical(physical) => (physical, None),
            Range::Wraith { physical, context } => (physical, Some(context)),
        };
        let mut posted = SmallVec4::new();
        self.append_location(&mut posted, physical.begin, out);
        if physical.end != physical.begin {
            self.append_location(&mut posted, physical.end, out);
        }
        if let Some(context) = context {
            out.push_str(&context.to_claimed_string());
        }
    }

    /// Append the full encoding of one location, sharing `posted` back
    /// references with the other locations of the same range.
    pub fn append_location(&self, posted: &mut SmallVec4<FileId>, loc: SourceLocation, out: &mut String) {
        if let Err(err) = self.append_location_at(posted, loc, 0, out) {
            tracing::warn!(error = %err, "location encoding degraded");
            out.push_str("!unresolved");
        }
    }

    fn append_location_at(
        &self,
        posted: &mut SmallVec4<FileId>,
        loc: SourceLocation,
        depth: u32,
        out: &mut String,
    ) -> Result<(), LocationError> {
        if depth > self.max_depth {
            return Err(LocationError::ExpansionDepthExceeded {
                max: self.max_depth,
            });
        }
        match loc {
            SourceLocation::Invalid => {
                out.push_str("invalid");
                Ok(())
            }
            SourceLocation::File { file, offset } => {
                let entry = self.source_map.file_entry(file);
                if entry.is_some() {
                    let _ = write!(out, "{offset}");
                } else {
                    self.append_buffer_slice_hash(loc, out);
                }
                if let Some(index) = posted.iter().position(|id| *id == file) {
                    let _ = write!(out, "@.{index}");
                    return Ok(());
                }
                posted.push(file);
                if let Some(entry) = entry {
                    let vname = self.vnames.vname_for_path(&entry.name);
                    if !vname.corpus.is_empty() {
                        out.push_str(&vname.corpus);
                        out.push('/');
                    }
                    if !vname.root.is_empty() {
                        out.push_str(&vname.root);
                        out.push('/');
                    }
                    out.push_str(&vname.path);
                }
                Ok(())
            }
            SourceLocation::Macro { .. } => {
                let expansion = self.source_map.immediate_expansion(loc);
                self.append_location_at(posted, expansion, depth + 1, out)?;
                out.push('@');
                let spelling = self.source_map.immediate_spelling(loc);
                self.append_location_at(posted, spelling, depth + 1, out)
            }
        }
    }

    /// Identity for a location no file backs: a hash of the token there.
    fn append_buffer_slice_hash(&self, loc: SourceLocation, out: &mut String) {
        match self.source_map.token_text(loc) {
            Some(text) => out.push_str(&hash_bytes(text.as_bytes())),
            None => {
                let _ = write!(out, "!invalid[{}]", loc.offset());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ids::ClaimToken;
    use crate::source::InMemorySourceMap;

    fn encoder<'a>(sm: &'a InMemorySourceMap, names: &'a FileVNames) -> LocationEncoder<'a, InMemorySourceMap> {
        LocationEncoder::new(sm, names, 64)
    }

    #[test]
    fn first_mention_carries_path() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("src/a.cc", "int x;");
        let names = FileVNames::new("corp", None);
        let range = Range::physical(sm.loc(f, 4), sm.loc(f, 5));
        assert_eq!(encoder(&sm, &names).encode_range(&range), "4corp/src/a.cc5@.0");
    }

    #[test]
    fn point_range_has_single_location() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("a.cc", "int x;");
        let names = FileVNames::default();
        let range = Range::physical(sm.loc(f, 4), sm.loc(f, 4));
        assert_eq!(encoder(&sm, &names).encode_range(&range), "4a.cc");
    }

    #[test]
    fn wraith_appends_context() {
        let mut sm = InMemorySourceMap::new();
        let f = sm.add_file("a.cc", "T t;");
        let names = FileVNames::default();
        let context = NodeId::new(Arc::new(ClaimToken::unowned()), "inst1");
        let physical = SourceRange::new(sm.loc(f, 0), sm.loc(f, 1));
        let wraith = Range::wraith(physical, context);
        let encoded = encoder(&sm, &names).encode_range(&wraith);
        assert!(encoded.ends_with("inst1"));
        assert_ne!(encoded, encoder(&sm, &names).encode_range(&Range::Physical(physical)));
    }

    #[test]
    fn implicit_ranges_use_node_identity() {
        let sm = InMemorySourceMap::new();
        let names = FileVNames::default();
        let node = NodeId::new(Arc::new(ClaimToken::unowned()), "ctor");
        assert_eq!(
            encoder(&sm, &names).encode_range(&Range::Implicit(node)),
            "ctor@syntactic"
        );
    }

    #[test]
    fn scratch_buffers_hash_their_token() {
        let mut sm = InMemorySourceMap::new();
        let b = sm.add_scratch_buffer("#define ONE 1");
        let names = FileVNames::default();
        let enc = encoder(&sm, &names);
        let a = enc.encode_range(&Range::physical(sm.loc(b, 8), sm.loc(b, 8)));
        assert_eq!(a, hash_bytes(b"ONE"));
        let past_end = enc.encode_range(&Range::physical(sm.loc(b, 99), sm.loc(b, 99)));
        assert_eq!(past_end, "!invalid[99]");
    }

    #[test]
    fn invalid_locations_encode_literally() {
        let sm = InMemorySourceMap::new();
        let names = FileVNames::default();
        let range = Range::physical(SourceLocation::Invalid, SourceLocation::Invalid);
        assert_eq!(encoder(&sm, &names).encode_range(&range), "invalid");
    }
}
