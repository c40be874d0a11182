use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::chunk_text::Chunker;
use crate::collection::Collection;
use crate::error::{RagError, Result};
use crate::extract::TextExtractor;
use crate::index_store::IndexStore;
use crate::providers::Providers;
use crate::readiness::Readiness;
use crate::types::{IngestReport, UploadedFile};

/// One ingestion batch: the whole batch replaces the active collection.
///
/// Chunks written before a failure stay in the store; there is no rollback.
pub struct IngestPipeline<'a> {
    pub chunker: Chunker,
    pub collection: &'a str,
    pub store: &'a dyn IndexStore,
    pub providers: &'a dyn Providers,
    pub extractor: &'a dyn TextExtractor,
    pub readiness: &'a Readiness,
}

impl IngestPipeline<'_> {
    pub fn run(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        if files.is_empty() {
            return Err(RagError::NoDocuments);
        }
        let _guard = self.readiness.begin_ingest()?;
        // Declared after the guard so it is removed before readiness returns.
        let staging = TempDir::new()?;
        info!(documents = files.len(), collection = self.collection, "ingestion started");

        let result = self.ingest_batch(staging.path(), files);
        match &result {
            Ok(report) => info!(
                documents = report.documents,
                chunks = report.chunks,
                "ingestion finished"
            ),
            Err(err) => warn!(error = %err, "ingestion failed"),
        }
        result
    }

    fn ingest_batch(&self, staging: &Path, files: &[UploadedFile]) -> Result<IngestReport> {
        let embedder = self.providers.embedder()?;
        let collection = Collection::reset_and_create(self.store, embedder.as_ref(), self.collection)?;

        let mut report = IngestReport::default();
        for (idx, file) in files.iter().enumerate() {
            let name = document_name(&file.name, idx);
            let path = stage_file(staging, idx, &name, &file.bytes)?;
            let pages = self.extractor.extract(&path, &name)?;

            let mut file_chunks = 0;
            for page in &pages {
                let chunks = self.chunker.split(&page.text, &page.metadata);
                file_chunks += collection.add_all(&chunks)?;
            }
            debug!(file = %name, pages = pages.len(), chunks = file_chunks, "indexed document");
            report.documents += 1;
            report.chunks += file_chunks;
        }
        Ok(report)
    }
}

/// Final path component of an uploaded name; clients may send full paths.
pub fn document_name(raw: &str, idx: usize) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        format!("document-{}", idx + 1)
    } else {
        name.to_string()
    }
}

fn stage_file(staging: &Path, idx: usize, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    // Prefix with the batch position so two uploads with one name don't collide.
    let path = staging.join(format!("{:04}-{}", idx, name));
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_name_strips_directories() {
        assert_eq!(document_name("report.pdf", 0), "report.pdf");
        assert_eq!(document_name("/tmp/uploads/report.pdf", 0), "report.pdf");
        assert_eq!(document_name("C:\\Users\\me\\report.pdf", 0), "report.pdf");
        assert_eq!(document_name("", 2), "document-3");
        assert_eq!(document_name("dir/..", 0), "document-1");
    }

    #[test]
    fn staged_files_are_prefixed_by_position() {
        let dir = TempDir::new().unwrap();
        let first = stage_file(dir.path(), 0, "same.txt", b"one").unwrap();
        let second = stage_file(dir.path(), 1, "same.txt", b"two").unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"one");
        assert_eq!(fs::read(&second).unwrap(), b"two");
    }
}
