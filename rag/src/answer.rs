use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::build_prompt::build_prompt_with_context;
use crate::collection::Collection;
use crate::error::{RagError, Result};
use crate::index_store::IndexStore;
use crate::providers::Providers;
use crate::readiness::Readiness;
use crate::retrieve_chunks::Retriever;
use crate::types::{QueryResult, ScoredChunk};

pub const NOT_READY_ANSWER: &str = "Documents are still being processed. Please wait...";

/// Sampling temperature for every answer.
pub const ANSWER_TEMPERATURE: f32 = 0.5;

/// An answer plus the chunks it was grounded on.
#[derive(Clone, Debug, Default)]
pub struct Answer {
    pub result: QueryResult,
    pub hits: Vec<ScoredChunk>,
}

pub struct AnswerPipeline<'a> {
    pub collection: &'a str,
    pub system_prompt: &'a str,
    pub store: &'a dyn IndexStore,
    pub providers: &'a dyn Providers,
    pub readiness: &'a Readiness,
}

impl AnswerPipeline<'_> {
    pub fn answer(&self, query: &str) -> Result<QueryResult> {
        self.run(query).map(|answer| answer.result)
    }

    pub fn run(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RagError::EmptyQuery);
        }
        if !self.readiness.is_ready() {
            debug!("query while ingesting, not touching the index");
            return Ok(Answer {
                result: QueryResult {
                    answer: NOT_READY_ANSWER.to_string(),
                    sources: BTreeSet::new(),
                },
                hits: vec![],
            });
        }

        let embedder = self.providers.embedder()?;
        let retriever = Retriever::new(Collection::open(self.store, embedder.as_ref(), self.collection));
        let hits = retriever.retrieve_top(query)?;

        // An empty collection still goes to the model, with an empty context.
        let (messages, _context) = build_prompt_with_context(self.system_prompt, query, &hits);
        let completer = self.providers.completer()?;
        let answer = completer.complete(&messages, ANSWER_TEMPERATURE)?;

        let sources = collect_sources(&hits);
        info!(hits = hits.len(), sources = sources.len(), "answered query");
        Ok(Answer {
            result: QueryResult { answer, sources },
            hits,
        })
    }
}

pub fn collect_sources(hits: &[ScoredChunk]) -> BTreeSet<String> {
    hits.iter().map(|hit| hit.chunk.source_name()).collect()
}
