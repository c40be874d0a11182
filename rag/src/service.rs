use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::answer::{Answer, AnswerPipeline};
use crate::chunk_text::Chunker;
use crate::config::{Config, StoreBackend};
use crate::error::{RagError, Result};
use crate::extract::{DocumentExtractor, TextExtractor};
use crate::index_store::IndexStore;
use crate::ingest::{document_name, IngestPipeline};
use crate::memory_store::MemoryStore;
use crate::providers::{ConfiguredProviders, Providers};
use crate::readiness::Readiness;
use crate::scan_files::scan_documents;
use crate::store_qdrant::QdrantStore;
use crate::types::{IngestReport, QueryResult, UploadedFile};

/// The document question-answering service: one index, one readiness gate.
///
/// Every method blocks on provider and store I/O; async callers should run
/// them on a blocking thread.
pub struct DocQa {
    cfg: Arc<Config>,
    chunker: Chunker,
    store: Arc<dyn IndexStore>,
    providers: Arc<dyn Providers>,
    extractor: Arc<dyn TextExtractor>,
    readiness: Readiness,
}

impl DocQa {
    /// Wire the configured backends. No provider is contacted here.
    pub fn from_config(cfg: Config) -> Result<Self> {
        let cfg = Arc::new(cfg);
        let store: Arc<dyn IndexStore> = match cfg.store {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Qdrant => Arc::new(QdrantStore::new(&cfg)),
        };
        let providers = Arc::new(ConfiguredProviders::new(Arc::clone(&cfg)));
        let extractor = Arc::new(DocumentExtractor::new(&cfg));
        info!(store = ?cfg.store, collection = %cfg.collection, "document service configured");
        Self::new(cfg, store, providers, extractor)
    }

    pub fn new(
        cfg: Arc<Config>,
        store: Arc<dyn IndexStore>,
        providers: Arc<dyn Providers>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        let chunker = Chunker::from_config(&cfg)?;
        Ok(Self {
            cfg,
            chunker,
            store,
            providers,
            extractor,
            readiness: Readiness::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn indexed_chunks(&self) -> Result<usize> {
        self.store.count(&self.cfg.collection)
    }

    /// Replace the index with the chunks of `files`.
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        IngestPipeline {
            chunker: self.chunker,
            collection: &self.cfg.collection,
            store: self.store.as_ref(),
            providers: self.providers.as_ref(),
            extractor: self.extractor.as_ref(),
            readiness: &self.readiness,
        }
        .run(files)
    }

    /// Ingest local files and directories. Directories are scanned for
    /// supported documents.
    pub fn ingest_paths(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        let mut files = Vec::new();
        for path in paths {
            for doc in scan_documents(&self.cfg, path) {
                files.push(read_upload(&doc, files.len())?);
            }
        }
        self.ingest(&files)
    }

    pub fn answer(&self, query: &str) -> Result<QueryResult> {
        self.answer_pipeline().answer(query)
    }

    pub fn answer_with_hits(&self, query: &str) -> Result<Answer> {
        self.answer_pipeline().run(query)
    }

    fn answer_pipeline(&self) -> AnswerPipeline<'_> {
        AnswerPipeline {
            collection: &self.cfg.collection,
            system_prompt: &self.cfg.system_prompt,
            store: self.store.as_ref(),
            providers: self.providers.as_ref(),
            readiness: &self.readiness,
        }
    }
}

fn read_upload(path: &Path, idx: usize) -> Result<UploadedFile> {
    let name = document_name(&path.to_string_lossy(), idx);
    let bytes = fs::read(path).map_err(|e| RagError::Extraction {
        file: name.clone(),
        reason: e.to_string(),
    })?;
    Ok(UploadedFile { name, bytes })
}
