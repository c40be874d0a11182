mod answer;
mod build_prompt;
mod chunk_text;
mod collection;
mod config;
mod embed_chunks;
mod error;
mod extract;
mod generate;
mod http;
mod index_store;
mod ingest;
mod memory_store;
mod providers;
mod readiness;
mod retrieve_chunks;
mod scan_files;
mod service;
mod store_qdrant;
mod types;

pub use answer::{collect_sources, Answer, AnswerPipeline, ANSWER_TEMPERATURE, NOT_READY_ANSWER};
pub use build_prompt::{build_prompt_with_context, format_context_from_hits, Message};
pub use chunk_text::Chunker;
pub use collection::Collection;
pub use config::{Config, LlmProvider, StoreBackend, DEFAULT_COLLECTION};
pub use embed_chunks::{Embedder, OllamaEmbedder};
pub use error::{RagError, Result};
pub use extract::{is_supported, page_metadata, split_pages, DocumentExtractor, TextExtractor};
pub use generate::{Completer, OllamaChat, OpenAiChat};
pub use index_store::{IndexStore, IndexedChunk};
pub use ingest::{document_name, IngestPipeline};
pub use memory_store::{cosine_similarity, MemoryStore};
pub use providers::{ConfiguredProviders, Providers};
pub use readiness::{IngestGuard, Readiness};
pub use retrieve_chunks::{Retriever, RETRIEVAL_K};
pub use scan_files::scan_documents;
pub use service::DocQa;
pub use store_qdrant::QdrantStore;
pub use types::{
    Chunk, IngestReport, Metadata, Page, QueryResult, ScoredChunk, UploadedFile, META_CHUNK_INDEX,
    META_FILE_NAME, META_PAGE, META_SOURCE,
};
