use tracing::debug;

use crate::error::Result;
use crate::types::{Chunk, ScoredChunk};

/// A chunk together with the vector it is indexed under.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Vector database capability. Collections are only ever replaced whole:
/// there is no merge operation.
pub trait IndexStore: Send + Sync {
    fn delete_collection(&self, name: &str) -> Result<()>;

    fn create_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// Drop whatever `name` held and create it empty. A failed delete (usually
    /// "not found") is not an error; a failed create is.
    fn reset_and_create(&self, name: &str, dimension: usize) -> Result<()> {
        if let Err(err) = self.delete_collection(name) {
            debug!(collection = name, error = %err, "delete before create failed, ignoring");
        }
        self.create_collection(name, dimension)
    }

    fn add(&self, name: &str, records: &[IndexedChunk]) -> Result<()>;

    /// Up to `k` chunks by descending similarity. A missing collection yields
    /// an empty result.
    fn query(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of chunks in `name`, zero when it does not exist.
    fn count(&self, name: &str) -> Result<usize>;
}
