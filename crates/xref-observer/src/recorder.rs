//! Recorder sinks that receive the facts the observer emits.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;
use xref_core::errors::RecorderError;

use crate::marked_source::MarkedSource;
use crate::schema::{EdgeKind, NodeKind, PropertyKind};
use crate::vname::VName;

/// Consumer of graph facts.
///
/// Recording never fails at the call site; sinks that can fail latch the
/// first error and report it from [`GraphRecorder::flush`].
pub trait GraphRecorder {
    fn add_property(&mut self, node: &VName, property: PropertyKind, value: &str);

    fn add_node_kind(&mut self, node: &VName, kind: NodeKind) {
        self.add_property(node, PropertyKind::NodeKind, kind.spelling());
    }

    fn add_edge(&mut self, source: &VName, kind: EdgeKind, target: &VName, ordinal: Option<u32>);

    fn add_file_content(&mut self, file: &VName, content: &[u8]);

    fn add_marked_source(&mut self, node: &VName, marked_source: &MarkedSource);

    /// Begin a group of facts that must be written together.
    fn push_entry_group(&mut self) {}

    fn pop_entry_group(&mut self) {}

    fn flush(&mut self) -> Result<(), RecorderError> {
        Ok(())
    }
}

/// One recorded fact.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    Property {
        node: VName,
        property: PropertyKind,
        value: String,
    },
    Edge {
        source: VName,
        kind: EdgeKind,
        target: VName,
        ordinal: Option<u32>,
    },
    FileContent {
        file: VName,
        content: Vec<u8>,
    },
    MarkedSource {
        node: VName,
        marked_source: MarkedSource,
    },
}

/// Keeps every fact in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    facts: Vec<Fact>,
    open_groups: usize,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }

    pub fn open_groups(&self) -> usize {
        self.open_groups
    }

    /// Values of `property` recorded on `node`.
    pub fn property_values(&self, node: &VName, property: PropertyKind) -> Vec<&str> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Property {
                    node: n,
                    property: p,
                    value,
                } if n == node && *p == property => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Nodes given `kind`, once per emission.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&VName> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Property {
                    node,
                    property: PropertyKind::NodeKind,
                    value,
                } if value == kind.spelling() => Some(node),
                _ => None,
            })
            .collect()
    }

    /// `(source, target, ordinal)` of every edge of `kind`.
    pub fn edges_of_kind(&self, kind: EdgeKind) -> Vec<(&VName, &VName, Option<u32>)> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::Edge {
                    source,
                    kind: k,
                    target,
                    ordinal,
                } if *k == kind => Some((source, target, *ordinal)),
                _ => None,
            })
            .collect()
    }

    pub fn file_contents(&self) -> Vec<(&VName, &[u8])> {
        self.facts
            .iter()
            .filter_map(|fact| match fact {
                Fact::FileContent { file, content } => Some((file, content.as_slice())),
                _ => None,
            })
            .collect()
    }

    pub fn marked_source_of(&self, node: &VName) -> Option<&MarkedSource> {
        self.facts.iter().find_map(|fact| match fact {
            Fact::MarkedSource {
                node: n,
                marked_source,
            } if n == node => Some(marked_source),
            _ => None,
        })
    }
}

impl GraphRecorder for MemoryRecorder {
    fn add_property(&mut self, node: &VName, property: PropertyKind, value: &str) {
        self.facts.push(Fact::Property {
            node: node.clone(),
            property,
            value: value.to_string(),
        });
    }

    fn add_edge(&mut self, source: &VName, kind: EdgeKind, target: &VName, ordinal: Option<u32>) {
        self.facts.push(Fact::Edge {
            source: source.clone(),
            kind,
            target: target.clone(),
            ordinal,
        });
    }

    fn add_file_content(&mut self, file: &VName, content: &[u8]) {
        self.facts.push(Fact::FileContent {
            file: file.clone(),
            content: content.to_vec(),
        });
    }

    fn add_marked_source(&mut self, node: &VName, marked_source: &MarkedSource) {
        self.facts.push(Fact::MarkedSource {
            node: node.clone(),
            marked_source: marked_source.clone(),
        });
    }

    fn push_entry_group(&mut self) {
        self.open_groups += 1;
    }

    fn pop_entry_group(&mut self) {
        self.open_groups = self.open_groups.saturating_sub(1);
    }
}

/// Writes one JSON object per fact.
pub struct JsonLinesRecorder<W: Write> {
    writer: W,
    error: Option<RecorderError>,
    written: u64,
}

impl<W: Write> JsonLinesRecorder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> Result<W, RecorderError> {
        self.flush()?;
        Ok(self.writer)
    }

    fn write_value(&mut self, value: serde_json::Value) {
        if self.error.is_some() {
            return;
        }
        let writer = &mut self.writer;
        let result = serde_json::to_vec(&value)
            .map_err(|e| RecorderError::Serialization {
                message: e.to_string(),
            })
            .and_then(|mut line| {
                line.push(b'\n');
                writer.write_all(&line).map_err(RecorderError::from)
            });
        match result {
            Ok(()) => self.written += 1,
            Err(err) => {
                tracing::error!(error = %err, "fact sink failed; dropping further facts");
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write> GraphRecorder for JsonLinesRecorder<W> {
    fn add_property(&mut self, node: &VName, property: PropertyKind, value: &str) {
        self.write_value(json!({
            "source": node,
            "fact_name": property.spelling(),
            "fact_value": value,
        }));
    }

    fn add_edge(&mut self, source: &VName, kind: EdgeKind, target: &VName, ordinal: Option<u32>) {
        let mut value = json!({
            "source": source,
            "edge_kind": kind.spelling(),
            "target": target,
        });
        if let Some(ordinal) = ordinal {
            value["ordinal"] = json!(ordinal);
        }
        self.write_value(value);
    }

    fn add_file_content(&mut self, file: &VName, content: &[u8]) {
        self.write_value(json!({
            "source": file,
            "fact_name": PropertyKind::Text.spelling(),
            "fact_value": STANDARD.encode(content),
        }));
    }

    fn add_marked_source(&mut self, node: &VName, marked_source: &MarkedSource) {
        self.write_value(json!({
            "source": node,
            "fact_name": PropertyKind::Code.spelling(),
            "fact_value": marked_source,
        }));
    }

    fn flush(&mut self) -> Result<(), RecorderError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn json_lines_one_object_per_fact() {
        let mut recorder = JsonLinesRecorder::new(Vec::new());
        let node = VName::default().with_signature("f");
        recorder.add_node_kind(&node, NodeKind::Function);
        recorder.add_edge(&node, EdgeKind::Param, &node, Some(2));
        recorder.add_file_content(&VName::file("", "", "a.cc"), b"int x;");
        let bytes = recorder.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["fact_value"], "function");
        assert_eq!(lines[1]["ordinal"], 2);
        assert_eq!(lines[2]["fact_value"], STANDARD.encode(b"int x;"));
    }

    #[test]
    fn json_lines_latches_first_error() {
        let mut recorder = JsonLinesRecorder::new(FailingWriter);
        let node = VName::default().with_signature("f");
        recorder.add_node_kind(&node, NodeKind::Function);
        recorder.add_node_kind(&node, NodeKind::Variable);
        assert_eq!(recorder.written(), 0);
        assert!(matches!(recorder.flush(), Err(RecorderError::Io { .. })));
    }

    #[test]
    fn memory_recorder_queries() {
        let mut recorder = MemoryRecorder::new();
        let node = VName::default().with_signature("f");
        recorder.add_node_kind(&node, NodeKind::Function);
        recorder.add_property(&node, PropertyKind::Complete, "definition");
        assert_eq!(recorder.nodes_of_kind(NodeKind::Function), vec![&node]);
        assert_eq!(
            recorder.property_values(&node, PropertyKind::Complete),
            vec!["definition"]
        );
        recorder.push_entry_group();
        assert_eq!(recorder.open_groups(), 1);
        recorder.pop_entry_group();
        assert_eq!(recorder.open_groups(), 0);
    }
}
