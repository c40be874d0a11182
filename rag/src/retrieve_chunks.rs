use tracing::debug;

use crate::collection::Collection;
use crate::error::Result;
use crate::types::ScoredChunk;

/// Number of chunks handed to the language model per question.
pub const RETRIEVAL_K: usize = 5;

pub struct Retriever<'a> {
    collection: Collection<'a>,
    k: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(collection: Collection<'a>) -> Self {
        Self {
            collection,
            k: RETRIEVAL_K,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn retrieve_top(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let hits = self.collection.query(question, self.k)?;
        debug!(
            collection = self.collection.name(),
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved chunks"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed_chunks::Embedder;
    use crate::index_store::IndexStore;
    use crate::memory_store::MemoryStore;
    use crate::types::{Chunk, Metadata};

    struct ConstEmbedder;

    impl Embedder for ConstEmbedder {
        fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> Result<usize> {
            Ok(2)
        }
    }

    #[test]
    fn retrieves_at_most_k_chunks() {
        let store = MemoryStore::new();
        let collection = Collection::reset_and_create(&store, &ConstEmbedder, "docs").unwrap();
        let chunks: Vec<Chunk> = (0..8)
            .map(|i| Chunk {
                id: format!("c{}", i),
                text: format!("chunk {}", i),
                metadata: Metadata::new(),
            })
            .collect();
        collection.add_all(&chunks).unwrap();

        let retriever = Retriever::new(Collection::open(&store, &ConstEmbedder, "docs"));
        assert_eq!(retriever.k(), RETRIEVAL_K);
        let hits = retriever.retrieve_top("anything").unwrap();
        assert_eq!(hits.len(), RETRIEVAL_K);
        assert_eq!(hits[0].chunk.id, "c0");
        assert_eq!(store.count("docs").unwrap(), 8);
    }

    #[test]
    fn missing_collection_retrieves_nothing() {
        let store = MemoryStore::new();
        let retriever = Retriever::new(Collection::open(&store, &ConstEmbedder, "absent"));
        assert!(retriever.retrieve_top("anything").unwrap().is_empty());
    }
}
