use serde_json::Value;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::types::{Chunk, Metadata, META_CHUNK_INDEX};

/// Fixed-size sliding window over characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunker {
    window: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(window: usize, overlap: usize) -> Result<Self> {
        if window == 0 {
            return Err(RagError::Config("chunk window must be greater than zero".into()));
        }
        let overlap = if overlap >= window { window / 4 } else { overlap };
        Ok(Self { window, overlap })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.chunk_size, cfg.chunk_overlap)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks that each carry a copy of `metadata`, their
    /// position under `chunk_index` and a fresh id.
    pub fn split(&self, text: &str, metadata: &Metadata) -> Vec<Chunk> {
        self.windows(text)
            .into_iter()
            .enumerate()
            .map(|(index, window)| {
                let mut metadata = metadata.clone();
                metadata.insert(META_CHUNK_INDEX.to_string(), Value::from(index));
                Chunk {
                    id: Uuid::new_v4().to_string(),
                    text: window,
                    metadata,
                }
            })
            .collect()
    }

    /// Window boundaries fall on every multiple of `window - overlap`. The last
    /// window may be shorter than the window size; nothing is trimmed.
    /// Windows holding only whitespace are dropped.
    pub fn windows(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        if len <= self.window {
            return vec![text.to_string()];
        }

        let stride = self.window - self.overlap;
        (0..len)
            .step_by(stride)
            .map(|start| {
                let end = (start + self.window).min(len);
                chars[start..end].iter().collect::<String>()
            })
            .filter(|window| !window.trim().is_empty())
            .collect()
    }
}
