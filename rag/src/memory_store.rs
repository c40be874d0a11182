use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{RagError, Result};
use crate::index_store::{IndexStore, IndexedChunk};
use crate::types::ScoredChunk;

struct MemoryCollection {
    dimension: usize,
    records: Vec<IndexedChunk>,
}

/// Exact cosine search over vectors held in process memory. Equal scores keep
/// insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexStore for MemoryStore {
    fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        match collections.remove(name) {
            Some(_) => Ok(()),
            None => Err(RagError::IndexStore(format!("collection {} not found", name))),
        }
    }

    fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if collections.contains_key(name) {
            return Err(RagError::IndexStore(format!("collection {} already exists", name)));
        }
        collections.insert(
            name.to_string(),
            MemoryCollection {
                dimension,
                records: Vec::new(),
            },
        );
        Ok(())
    }

    fn add(&self, name: &str, records: &[IndexedChunk]) -> Result<()> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| RagError::IndexStore(format!("collection {} not found", name)))?;
        if let Some(bad) = records.iter().find(|r| r.vector.len() != collection.dimension) {
            return Err(RagError::IndexStore(format!(
                "vector for chunk {} has {} dimensions, collection expects {}",
                bad.chunk.id,
                bad.vector.len(),
                collection.dimension
            )));
        }
        collection.records.extend_from_slice(records);
        Ok(())
    }

    fn query(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let Some(collection) = collections.get(name) else {
            return Ok(vec![]);
        };
        if k == 0 || collection.records.is_empty() {
            return Ok(vec![]);
        }
        if vector.len() != collection.dimension {
            return Err(RagError::IndexStore(format!(
                "query vector has {} dimensions, collection expects {}",
                vector.len(),
                collection.dimension
            )));
        }

        let mut scored: Vec<ScoredChunk> = collection
            .records
            .iter()
            .map(|r| ScoredChunk {
                chunk: r.chunk.clone(),
                score: cosine_similarity(vector, &r.vector),
            })
            .collect();
        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn count(&self, name: &str) -> Result<usize> {
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections.get(name).map(|c| c.records.len()).unwrap_or(0))
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
