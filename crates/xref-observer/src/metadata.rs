//! Metadata overlays for generated code.
//!
//! A metadata file sits next to a generated source file and maps byte
//! ranges in it to the VNames of whatever the code was generated from.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use prost::Message as _;
use prost_types::generated_code_info::Annotation;
use prost_types::GeneratedCodeInfo;
use serde::Deserialize;
use xref_core::constants::{METADATA_FORMAT_TAG, PROTOBUF_LANGUAGE, PROTOBUF_METADATA_SUFFIXES};
use xref_core::errors::MetadataError;
use xref_core::types::collections::{BTreeMap, SmallVec2};

use crate::schema::EdgeKind;
use crate::vname::{FileVNames, VName};

/// One overlay rule. When an anchor for `[begin, end)` is recorded with
/// edge `edge_in`, an extra `edge_out` edge links the anchored node and
/// `vname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRule {
    pub begin: u32,
    pub end: u32,
    pub edge_in: String,
    pub edge_out: String,
    pub vname: VName,
    /// Point the edge from `vname` to the anchored node instead.
    pub reverse_edge: bool,
}

/// Rules indexed by the offset their range begins at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFile {
    rules: BTreeMap<u32, SmallVec2<MetadataRule>>,
}

impl MetadataFile {
    pub fn from_rules(rules: impl IntoIterator<Item = MetadataRule>) -> Self {
        let mut file = Self::default();
        for rule in rules {
            file.rules.entry(rule.begin).or_default().push(rule);
        }
        file
    }

    /// Rules whose range begins at `begin`.
    pub fn rules_at(&self, begin: u32) -> &[MetadataRule] {
        self.rules.get(&begin).map_or(&[], |rules| rules.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(|rules| rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A parser for one metadata format.
pub trait MetadataSupport {
    /// Try to parse `buffer`. `raw_filename` is the name on disk;
    /// `filename` has any container suffix already removed. `vnames`
    /// names the files rules point at.
    fn parse_file(&self, raw_filename: &str, filename: &str, buffer: &[u8], vnames: &FileVNames)
        -> Option<MetadataFile>;
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "type")]
    format: String,
    meta: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawRule {
    Nop,
    AnchorDefines {
        begin: u32,
        end: u32,
        edge: String,
        vname: VName,
    },
}

/// The JSON metadata format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataSupport;

impl JsonMetadataSupport {
    /// Parse a `{"type": "kythe0", "meta": [...]}` document.
    pub fn load_from_json(file: &str, json: &str) -> Result<MetadataFile, MetadataError> {
        let document: RawDocument = serde_json::from_str(json).map_err(|e| MetadataError::Json {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        if document.format != METADATA_FORMAT_TAG {
            return Err(MetadataError::UnknownFormat {
                file: file.to_string(),
                tag: document.format,
            });
        }
        let mut rules = Vec::with_capacity(document.meta.len());
        for (index, value) in document.meta.into_iter().enumerate() {
            let malformed = |message: String| MetadataError::MalformedRule {
                file: file.to_string(),
                index,
                message,
            };
            let raw: RawRule = serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
            let RawRule::AnchorDefines {
                begin,
                end,
                edge,
                vname,
            } = raw
            else {
                continue;
            };
            if vname.is_empty() {
                return Err(malformed("empty vname".to_string()));
            }
            let (edge_out, reverse_edge) = match edge.strip_prefix('%') {
                Some(rest) => (rest.to_string(), true),
                None => (edge, false),
            };
            if edge_out.is_empty() {
                return Err(malformed("empty edge".to_string()));
            }
            rules.push(MetadataRule {
                begin,
                end,
                edge_in: EdgeKind::DefinesBinding.spelling().to_string(),
                edge_out,
                vname,
                reverse_edge,
            });
        }
        Ok(MetadataFile::from_rules(rules))
    }
}

impl MetadataSupport for JsonMetadataSupport {
    fn parse_file(
        &self,
        raw_filename: &str,
        _filename: &str,
        buffer: &[u8],
        _vnames: &FileVNames,
    ) -> Option<MetadataFile> {
        let loaded = std::str::from_utf8(buffer)
            .map_err(|e| MetadataError::Json {
                file: raw_filename.to_string(),
                message: e.to_string(),
            })
            .and_then(|json| Self::load_from_json(raw_filename, json));
        match loaded {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(file = raw_filename, error = %err, "failed loading metadata");
                None
            }
        }
    }
}

/// protoc's generated-code annotations (`*.pb.h.meta`, `*.proto.h.meta`).
///
/// Each annotation becomes a reversed `generates` rule from the descriptor
/// the code was generated from to the definition spelled in the range.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufMetadataSupport;

impl ProtobufMetadataSupport {
    /// Decode a serialized `GeneratedCodeInfo`. `context` is the VName of
    /// the metadata file itself; its corpus names unregistered sources.
    pub fn load_from_bytes(
        file: &str,
        context: &VName,
        buffer: &[u8],
        vnames: &FileVNames,
    ) -> Result<MetadataFile, MetadataError> {
        let info = GeneratedCodeInfo::decode(buffer).map_err(|e| MetadataError::Protobuf {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        let mut rules = Vec::with_capacity(info.annotation.len());
        for (index, annotation) in info.annotation.iter().enumerate() {
            let offset = |value: i32| {
                u32::try_from(value).map_err(|_| MetadataError::MalformedRule {
                    file: file.to_string(),
                    index,
                    message: format!("negative offset {value}"),
                })
            };
            rules.push(MetadataRule {
                begin: offset(annotation.begin())?,
                end: offset(annotation.end())?,
                edge_in: EdgeKind::DefinesBinding.spelling().to_string(),
                edge_out: EdgeKind::Generates.spelling().to_string(),
                vname: vname_for_annotation(context, annotation, vnames),
                reverse_edge: true,
            });
        }
        Ok(MetadataFile::from_rules(rules))
    }
}

/// VName of the descriptor an annotation points at: the source `.proto`
/// file with the descriptor path joined by dots as its signature.
fn vname_for_annotation(context: &VName, annotation: &Annotation, vnames: &FileVNames) -> VName {
    let source_file = annotation.source_file();
    let mut vname = vnames.lookup(source_file).cloned().unwrap_or_else(|| VName {
        corpus: context.corpus.clone(),
        ..VName::default()
    });
    vname.path = source_file.to_string();
    vname.signature = annotation
        .path
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(".");
    vname.language = PROTOBUF_LANGUAGE.to_string();
    vname
}

impl MetadataSupport for ProtobufMetadataSupport {
    fn parse_file(
        &self,
        raw_filename: &str,
        filename: &str,
        buffer: &[u8],
        vnames: &FileVNames,
    ) -> Option<MetadataFile> {
        if !PROTOBUF_METADATA_SUFFIXES.iter().any(|suffix| filename.ends_with(suffix)) {
            return None;
        }
        let context = vnames.vname_for_path(raw_filename);
        match Self::load_from_bytes(raw_filename, &context, buffer, vnames) {
            Ok(file) => Some(file),
            Err(err) => {
                tracing::warn!(file = raw_filename, error = %err, "failed loading protobuf metadata");
                None
            }
        }
    }
}

/// Extract the payload of a header-style metadata file: one `//` comment
/// line or one `/* ... */` block holding base64-encoded JSON.
pub fn decode_header_metadata(file: &str, buffer: &str) -> Result<String, MetadataError> {
    let bad = |message: &str| MetadataError::BadHeader {
        file: file.to_string(),
        message: message.to_string(),
    };
    let body = buffer.strip_prefix('/').ok_or_else(|| bad("no leading comment"))?;
    let encoded: String = if let Some(line) = body.strip_prefix('/') {
        line.split('\n').next().unwrap_or_default().to_string()
    } else if let Some(block) = body.strip_prefix('*') {
        let end = block.find("*/").ok_or_else(|| bad("unterminated comment"))?;
        block[..end].to_string()
    } else {
        return Err(bad("no leading comment"));
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| bad(&e.to_string()))?;
    String::from_utf8(decoded).map_err(|e| bad(&e.to_string()))
}

/// An ordered chain of metadata parsers; the first that accepts a file wins.
#[derive(Default)]
pub struct MetadataSupports {
    supports: Vec<Box<dyn MetadataSupport>>,
}

impl MetadataSupports {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain holding only the JSON format.
    pub fn json() -> Self {
        let mut supports = Self::new();
        supports.add(Box::new(JsonMetadataSupport));
        supports
    }

    /// protoc annotations first, then JSON.
    pub fn standard() -> Self {
        let mut supports = Self::new();
        supports.add(Box::new(ProtobufMetadataSupport));
        supports.add(Box::new(JsonMetadataSupport));
        supports
    }

    pub fn add(&mut self, support: Box<dyn MetadataSupport>) {
        self.supports.push(support);
    }

    pub fn is_empty(&self) -> bool {
        self.supports.is_empty()
    }

    /// Parse `buffer`, unwrapping header-embedded metadata for `.h` files.
    pub fn parse_file(&self, filename: &str, buffer: &[u8], vnames: &FileVNames) -> Option<MetadataFile> {
        let mut modified_filename = filename;
        let mut decoded_storage = None;
        if let Some(stem) = filename.strip_suffix(".h") {
            let header = std::str::from_utf8(buffer).map_err(|e| MetadataError::BadHeader {
                file: filename.to_string(),
                message: e.to_string(),
            });
            match header.and_then(|text| decode_header_metadata(filename, text)) {
                Ok(decoded) => {
                    decoded_storage = Some(decoded);
                    modified_filename = stem;
                }
                Err(err) => {
                    tracing::warn!(file = filename, error = %err, "not a metadata header");
                }
            }
        }
        let contents = decoded_storage.as_ref().map_or(buffer, String::as_bytes);
        self.supports
            .iter()
            .find_map(|support| support.parse_file(filename, modified_filename, contents, vnames))
    }
}

impl std::fmt::Debug for MetadataSupports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataSupports")
            .field("supports", &self.supports.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    const SAMPLE: &str = r#"{"type":"kythe0","meta":[
        {"type":"nop"},
        {"type":"anchor_defines","begin":10,"end":13,"edge":"%/kythe/edge/generates",
         "vname":{"signature":"gsig","corpus":"gcorp"}}
    ]}"#;

    #[test]
    fn loads_rules_and_reverse_flag() {
        let file = JsonMetadataSupport::load_from_json("a.meta", SAMPLE).unwrap();
        assert_eq!(file.len(), 1);
        let rule = &file.rules_at(10)[0];
        assert_eq!(rule.end, 13);
        assert!(rule.reverse_edge);
        assert_eq!(rule.edge_out, "/kythe/edge/generates");
        assert_eq!(rule.edge_in, "/kythe/edge/defines/binding");
        assert_eq!(rule.vname.corpus, "gcorp");
        assert!(file.rules_at(11).is_empty());
    }

    #[test]
    fn rejects_wrong_format_tag() {
        let err = JsonMetadataSupport::load_from_json("a.meta", r#"{"type":"kythe1","meta":[]}"#);
        assert!(matches!(err, Err(MetadataError::UnknownFormat { .. })));
    }

    #[test]
    fn rejects_unknown_rule_type_and_empty_vname() {
        let unknown = r#"{"type":"kythe0","meta":[{"type":"mystery"}]}"#;
        assert!(matches!(
            JsonMetadataSupport::load_from_json("a.meta", unknown),
            Err(MetadataError::MalformedRule { index: 0, .. })
        ));
        let empty = r#"{"type":"kythe0","meta":[{"type":"anchor_defines","begin":1,"end":2,"edge":"/kythe/edge/generates","vname":{}}]}"#;
        assert!(matches!(
            JsonMetadataSupport::load_from_json("a.meta", empty),
            Err(MetadataError::MalformedRule { .. })
        ));
    }

    #[test]
    fn header_comments_decode() {
        let encoded = STANDARD.encode(SAMPLE);
        let line = format!("//{encoded}\nint x;");
        assert_eq!(decode_header_metadata("a.h", &line).unwrap(), SAMPLE);

        let (head, tail) = encoded.split_at(encoded.len() / 2);
        let block = format!("/*{head}\n{tail}*/\n");
        assert_eq!(decode_header_metadata("a.h", &block).unwrap(), SAMPLE);

        assert!(decode_header_metadata("a.h", "int x;").is_err());
    }

    #[test]
    fn supports_chain_unwraps_headers() {
        let supports = MetadataSupports::json();
        let vnames = FileVNames::default();
        let header = format!("//{}", STANDARD.encode(SAMPLE));
        assert!(supports.parse_file("gen.pb.h", header.as_bytes(), &vnames).is_some());
        assert!(supports.parse_file("gen.meta", SAMPLE.as_bytes(), &vnames).is_some());
        assert!(supports.parse_file("gen.meta", b"not json", &vnames).is_none());
    }

    fn annotation(path: Vec<i32>, source_file: &str, begin: i32, end: i32) -> Annotation {
        Annotation {
            path,
            source_file: Some(source_file.to_string()),
            begin: Some(begin),
            end: Some(end),
            ..Default::default()
        }
    }

    #[test]
    fn protobuf_annotations_become_reverse_generates_rules() {
        let info = GeneratedCodeInfo {
            annotation: vec![annotation(vec![4, 0, 2, 1], "proto/person.proto", 20, 24)],
        };
        let mut vnames = FileVNames::new("gen", None);
        vnames.insert("proto/person.proto", VName::file("protos", "src", "proto/person.proto"));
        let context = vnames.vname_for_path("out/person.pb.h.meta");

        let bytes = info.encode_to_vec();
        let file = ProtobufMetadataSupport::load_from_bytes("person.pb.h.meta", &context, &bytes, &vnames).unwrap();
        let rule = &file.rules_at(20)[0];
        assert_eq!(rule.end, 24);
        assert!(rule.reverse_edge);
        assert_eq!(rule.edge_in, "/kythe/edge/defines/binding");
        assert_eq!(rule.edge_out, "/kythe/edge/generates");
        assert_eq!(rule.vname, VName {
            signature: "4.0.2.1".to_string(),
            corpus: "protos".to_string(),
            root: "src".to_string(),
            path: "proto/person.proto".to_string(),
            language: "protobuf".to_string(),
        });
    }

    #[test]
    fn unregistered_proto_sources_take_the_metadata_corpus() {
        let info = GeneratedCodeInfo {
            annotation: vec![annotation(vec![4, 0], "person.proto", 0, 6)],
        };
        let vnames = FileVNames::new("gen", None);
        let context = vnames.vname_for_path("person.pb.h.meta");
        let bytes = info.encode_to_vec();
        let file = ProtobufMetadataSupport::load_from_bytes("person.pb.h.meta", &context, &bytes, &vnames).unwrap();
        let vname = &file.rules_at(0)[0].vname;
        assert_eq!(vname.corpus, "gen");
        assert_eq!(vname.path, "person.proto");
        assert_eq!(vname.signature, "4.0");
    }

    #[test]
    fn protobuf_support_checks_suffix_and_payload() {
        let vnames = FileVNames::default();
        let bytes = GeneratedCodeInfo {
            annotation: vec![annotation(vec![4], "a.proto", 1, 2)],
        }
        .encode_to_vec();
        let support = ProtobufMetadataSupport;
        assert!(support.parse_file("a.pb.h.meta", "a.pb.h.meta", &bytes, &vnames).is_some());
        assert!(support.parse_file("a.proto.h.meta", "a.proto.h.meta", &bytes, &vnames).is_some());
        assert!(support.parse_file("a.meta", "a.meta", &bytes, &vnames).is_none());
        assert!(support.parse_file("a.pb.h.meta", "a.pb.h.meta", &[0xff, 0xff], &vnames).is_none());

        let negative = GeneratedCodeInfo {
            annotation: vec![annotation(vec![4], "a.proto", -1, 2)],
        };
        let bytes = negative.encode_to_vec();
        assert!(matches!(
            ProtobufMetadataSupport::load_from_bytes("a.pb.h.meta", &VName::default(), &bytes, &vnames),
            Err(MetadataError::MalformedRule { index: 0, .. })
        ));
    }
}
