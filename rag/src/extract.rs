//! Page-aware text extraction for staged files.
//!
//! PDFs go through the poppler `pdftotext` binary, whose output separates
//! pages with form feeds. A file is a PDF when it starts with `%PDF-`,
//! whatever its name. Plain-text formats are read as a single page.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::types::{Metadata, Page, META_FILE_NAME, META_PAGE, META_SOURCE};

const TEXT_EXTS: &[&str] = &["txt", "md", "markdown", "text"];
const PDF_MAGIC: &[u8; 5] = b"%PDF-";
/// Reading-order output; no `-layout` padding.
const PDFTOTEXT_ARGS: &[&str] = &["-enc", "UTF-8"];

pub trait TextExtractor: Send + Sync {
    /// Extract the pages of `path`. `name` is the document name recorded in
    /// each page's metadata.
    fn extract(&self, path: &Path, name: &str) -> Result<Vec<Page>>;
}

pub fn is_supported(path: &Path) -> bool {
    match extension(path).as_deref() {
        Some("pdf") => true,
        Some(ext) => TEXT_EXTS.contains(&ext),
        None => false,
    }
}

fn has_pdf_magic(path: &Path) -> bool {
    let mut head = [0u8; 5];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut head))
        .is_ok()
        && &head == PDF_MAGIC
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

pub fn page_metadata(name: &str, page: Option<usize>) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(META_SOURCE.to_string(), Value::from(name));
    metadata.insert(META_FILE_NAME.to_string(), Value::from(name));
    if let Some(page) = page {
        metadata.insert(META_PAGE.to_string(), Value::from(page));
    }
    metadata
}

pub struct DocumentExtractor {
    pdftotext_bin: String,
}

impl DocumentExtractor {
    pub fn new(cfg: &Config) -> Self {
        Self {
            pdftotext_bin: cfg.pdftotext_bin.clone(),
        }
    }

    fn extract_pdf(&self, path: &Path, name: &str) -> Result<Vec<Page>> {
        let fail = |reason: String| RagError::Extraction {
            file: name.to_string(),
            reason,
        };
        let output = Command::new(&self.pdftotext_bin)
            .args(PDFTOTEXT_ARGS)
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| fail(format!("{} could not be run: {} (is poppler installed?)", self.pdftotext_bin, e)))?;
        if !output.status.success() {
            return Err(fail(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let pages = split_pages(&text, name);
        debug!(file = name, pages = pages.len(), "extracted pdf");
        Ok(pages)
    }

    fn extract_text(&self, path: &Path, name: &str) -> Result<Vec<Page>> {
        let bytes = fs::read(path).map_err(|e| RagError::Extraction {
            file: name.to_string(),
            reason: e.to_string(),
        })?;
        let text = String::from_utf8(bytes).map_err(|_| RagError::Extraction {
            file: name.to_string(),
            reason: "file is not valid UTF-8 text".to_string(),
        })?;
        Ok(vec![Page {
            text,
            metadata: page_metadata(name, None),
        }])
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path, name: &str) -> Result<Vec<Page>> {
        if has_pdf_magic(path) {
            return self.extract_pdf(path, name);
        }
        match extension(path).as_deref() {
            Some("pdf") => self.extract_pdf(path, name),
            Some(ext) if TEXT_EXTS.contains(&ext) => self.extract_text(path, name),
            _ => Err(RagError::Extraction {
                file: name.to_string(),
                reason: "unsupported file type".to_string(),
            }),
        }
    }
}

/// Split `pdftotext` output on form feeds. Page numbers are 1-based and
/// blank pages keep their number but are dropped.
pub fn split_pages(text: &str, name: &str) -> Vec<Page> {
    text.split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(idx, page)| Page {
            text: page.to_string(),
            metadata: page_metadata(name, Some(idx + 1)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn extractor() -> DocumentExtractor {
        DocumentExtractor {
            pdftotext_bin: "pdftotext-not-installed-for-tests".to_string(),
        }
    }

    #[test]
    fn form_feeds_separate_numbered_pages() {
        let pages = split_pages("first page\u{c}\u{c}third page\u{c}", "doc.pdf");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "first page");
        assert_eq!(pages[0].metadata[META_PAGE], json!(1));
        assert_eq!(pages[1].text, "third page");
        assert_eq!(pages[1].metadata[META_PAGE], json!(3));
        assert_eq!(pages[1].metadata[META_SOURCE], json!("doc.pdf"));
        assert_eq!(pages[1].metadata[META_FILE_NAME], json!("doc.pdf"));
    }

    #[test]
    fn text_files_are_one_page_without_page_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# Notes\nhello").unwrap();
        let pages = extractor().extract(&path, "notes.md").unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "# Notes\nhello");
        assert!(!pages[0].metadata.contains_key(META_PAGE));
    }

    #[test]
    fn unsupported_and_unreadable_files_are_extraction_errors() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("blob.bin");
        fs::write(&bin, [0u8, 1, 2]).unwrap();
        assert!(matches!(extractor().extract(&bin, "blob.bin"), Err(RagError::Extraction { .. })));

        let bad_utf8 = dir.path().join("bad.txt");
        fs::write(&bad_utf8, [0xffu8, 0xfe, 0x00]).unwrap();
        assert!(matches!(extractor().extract(&bad_utf8, "bad.txt"), Err(RagError::Extraction { .. })));
    }

    #[test]
    fn missing_pdftotext_binary_is_an_extraction_error() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();
        let err = extractor().extract(&pdf, "doc.pdf").unwrap_err();
        match err {
            RagError::Extraction { file, reason } => {
                assert_eq!(file, "doc.pdf");
                assert!(reason.contains("poppler"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pdf_content_is_detected_without_extension() {
        let dir = TempDir::new().unwrap();
        let blob = dir.path().join("0000-blob");
        fs::write(&blob, b"%PDF-1.4\n%binary").unwrap();
        assert!(has_pdf_magic(&blob));
        match extractor().extract(&blob, "blob").unwrap_err() {
            RagError::Extraction { file, reason } => {
                assert_eq!(file, "blob");
                assert!(reason.contains("pdftotext-not-installed-for-tests"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let text = dir.path().join("0001-notes");
        fs::write(&text, "plain words").unwrap();
        assert!(!has_pdf_magic(&text));
        assert!(!has_pdf_magic(&dir.path().join("missing")));
    }

    #[test]
    fn pdftotext_runs_in_reading_order_mode() {
        assert!(!PDFTOTEXT_ARGS.contains(&"-layout"));
        assert_eq!(PDFTOTEXT_ARGS, &["-enc", "UTF-8"]);
    }

    #[test]
    fn recognises_supported_extensions() {
        assert!(is_supported(Path::new("a/Report.PDF")));
        assert!(is_supported(Path::new("readme.md")));
        assert!(!is_supported(Path::new("image.png")));
        assert!(!is_supported(Path::new("Makefile")));
    }
}
