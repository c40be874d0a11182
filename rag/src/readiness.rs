use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{RagError, Result};

/// Whether the index may be queried. Only an [`IngestGuard`] can make the
/// service not-ready, and dropping it is the only way back.
#[derive(Clone, Debug, Default)]
pub struct Readiness {
    ingesting: Arc<AtomicBool>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        !self.ingesting.load(Ordering::Acquire)
    }

    /// Flip to not-ready. Fails if another ingestion already holds the guard.
    pub fn begin_ingest(&self) -> Result<IngestGuard> {
        self.ingesting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RagError::IngestionInProgress)?;
        Ok(IngestGuard {
            ingesting: Arc::clone(&self.ingesting),
        })
    }
}

/// Restores readiness when dropped, on success, error and unwind alike.
#[derive(Debug)]
pub struct IngestGuard {
    ingesting: Arc<AtomicBool>,
}

impl Drop for IngestGuard {
    fn drop(&mut self) {
        self.ingesting.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_controls_readiness() {
        let readiness = Readiness::new();
        assert!(readiness.is_ready());
        let guard = readiness.begin_ingest().unwrap();
        assert!(!readiness.is_ready());
        assert!(!readiness.clone().is_ready());
        drop(guard);
        assert!(readiness.is_ready());
    }

    #[test]
    fn second_ingest_is_rejected_while_first_runs() {
        let readiness = Readiness::new();
        let _guard = readiness.begin_ingest().unwrap();
        assert!(matches!(readiness.begin_ingest(), Err(RagError::IngestionInProgress)));
        assert!(!readiness.is_ready());
    }

    #[test]
    fn panic_while_ingesting_restores_readiness() {
        let readiness = Readiness::new();
        let shared = readiness.clone();
        let result = std::thread::spawn(move || {
            let _guard = shared.begin_ingest().unwrap();
            panic!("extraction blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(readiness.is_ready());
    }
}
