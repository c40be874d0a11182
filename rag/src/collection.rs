use crate::embed_chunks::Embedder;
use crate::error::{RagError, Result};
use crate::index_store::{IndexStore, IndexedChunk};
use crate::types::{Chunk, ScoredChunk};

/// A named collection bound to the embedder that fills and searches it.
pub struct Collection<'a> {
    store: &'a dyn IndexStore,
    embedder: &'a dyn Embedder,
    name: &'a str,
}

impl<'a> Collection<'a> {
    /// Bind to whatever `name` currently holds, for reading.
    pub fn open(store: &'a dyn IndexStore, embedder: &'a dyn Embedder, name: &'a str) -> Self {
        Self { store, embedder, name }
    }

    /// Replace `name` with a fresh, empty collection sized for `embedder`.
    pub fn reset_and_create(
        store: &'a dyn IndexStore,
        embedder: &'a dyn Embedder,
        name: &'a str,
    ) -> Result<Self> {
        let dimension = embedder.dimension()?;
        store.reset_and_create(name, dimension)?;
        Ok(Self { store, embedder, name })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn add(&self, chunk: &Chunk) -> Result<()> {
        self.add_all(std::slice::from_ref(chunk)).map(|_| ())
    }

    /// Embed `chunks` in one provider call and insert them.
    pub fn add_all(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(RagError::EmbeddingProvider(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }
        let records: Vec<IndexedChunk> = chunks
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk { chunk, vector })
            .collect();
        self.store.add(self.name, &records)?;
        Ok(records.len())
    }

    pub fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = self.embedder.embed_query(text)?;
        self.store.query(self.name, &vector, k)
    }

    pub fn count(&self) -> Result<usize> {
        self.store.count(self.name)
    }
}
