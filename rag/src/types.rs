use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata carried by every chunk: the originating document name plus any
/// fields the extractor knows about (page number, chunk position).
pub type Metadata = BTreeMap<String, Value>;

pub const META_SOURCE: &str = "source";
pub const META_FILE_NAME: &str = "file_name";
pub const META_PAGE: &str = "page";
pub const META_CHUNK_INDEX: &str = "chunk_index";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

impl Chunk {
    /// Document identifier used for source attribution.
    pub fn source_name(&self) -> String {
        [META_SOURCE, META_FILE_NAME]
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// One page of extracted text.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub text: String,
    pub metadata: Metadata,
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk_with(meta: &[(&str, Value)]) -> Chunk {
        Chunk {
            id: "c1".into(),
            text: "body".into(),
            metadata: meta.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }

    #[test]
    fn source_name_prefers_source_then_file_name() {
        let both = chunk_with(&[(META_SOURCE, json!("a.pdf")), (META_FILE_NAME, json!("b.pdf"))]);
        assert_eq!(both.source_name(), "a.pdf");

        let fallback = chunk_with(&[(META_FILE_NAME, json!("b.pdf"))]);
        assert_eq!(fallback.source_name(), "b.pdf");

        let empty_source = chunk_with(&[(META_SOURCE, json!("")), (META_FILE_NAME, json!("b.pdf"))]);
        assert_eq!(empty_source.source_name(), "b.pdf");

        let none = chunk_with(&[(META_PAGE, json!(3))]);
        assert_eq!(none.source_name(), "Unknown");
    }
}
