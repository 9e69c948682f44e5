//! Retrieved document records and their chunked form.

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io;

use crate::types::GuideError;

/// Kind of catalog document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Schema,
    Wiki,
    Dashboard,
    Runbook,
    Lineage,
    Notebook,
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocType::Schema => "schema",
            DocType::Wiki => "wiki",
            DocType::Dashboard => "dashboard",
            DocType::Runbook => "runbook",
            DocType::Lineage => "lineage",
            DocType::Notebook => "notebook",
        };
        write!(f, "{}", s)
    }
}

/// Column description carried by schema documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Upstream/downstream table edges carried by lineage documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    #[serde(default)]
    pub upstream: Vec<String>,
    #[serde(default)]
    pub downstream: Vec<String>,
}

/// A retrieved catalog record.
///
/// The seven identity fields are required for every document type; the
/// type-specific payloads are optional. Unknown fields are preserved in
/// `extra` so the canonical serialization keeps everything the source sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    pub doc_type: DocType,
    pub table_name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<Lineage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Canonical single-line JSON form fed to the chunker.
    ///
    /// Separators are `", "` and `": "`, so every key and scalar value is its
    /// own whitespace-delimited word.
    pub fn to_canonical_text(&self) -> crate::types::Result<String> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf)
            .map_err(|e| GuideError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// Compact JSON with a space after every `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// One token-bounded slice of a document's canonical text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub document_index: usize,
    pub chunk_index: usize,
    pub text: String,
}

impl Chunk {
    /// Ordering key: document first, then position within the document
    pub fn key(&self) -> (usize, usize) {
        (self.document_index, self.chunk_index)
    }
}
