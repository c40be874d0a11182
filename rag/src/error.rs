use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to extract text from {file}: {reason}")]
    Extraction { file: String, reason: String },

    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(String),

    #[error("Index store failed: {0}")]
    IndexStore(String),

    #[error("Completion provider failed: {0}")]
    CompletionProvider(String),

    #[error("Failed to stage uploaded files: {0}")]
    Staging(#[from] std::io::Error),

    #[error("An ingestion run is already in progress")]
    IngestionInProgress,

    #[error("No documents were provided")]
    NoDocuments,

    #[error("Query is empty")]
    EmptyQuery,
}

pub type Result<T> = std::result::Result<T, RagError>;
