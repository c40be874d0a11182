use std::sync::Arc;

use tracing::debug;

use crate::config::{Config, LlmProvider};
use crate::embed_chunks::{Embedder, OllamaEmbedder};
use crate::error::Result;
use crate::generate::{Completer, OllamaChat, OpenAiChat};

/// Builds provider clients on demand. Pipelines call this inside the request
/// that needs a client, so a slow or failing provider never blocks startup and
/// only fails the call that touched it.
pub trait Providers: Send + Sync {
    fn embedder(&self) -> Result<Box<dyn Embedder>>;
    fn completer(&self) -> Result<Box<dyn Completer>>;
}

pub struct ConfiguredProviders {
    cfg: Arc<Config>,
}

impl ConfiguredProviders {
    pub fn new(cfg: Arc<Config>) -> Self {
        Self { cfg }
    }
}

impl Providers for ConfiguredProviders {
    fn embedder(&self) -> Result<Box<dyn Embedder>> {
        debug!(model = %self.cfg.embed_model, "building embedder");
        Ok(Box::new(OllamaEmbedder::new(&self.cfg)))
    }

    fn completer(&self) -> Result<Box<dyn Completer>> {
        debug!(provider = ?self.cfg.llm_provider, model = %self.cfg.chat_model, "building completer");
        match self.cfg.llm_provider {
            LlmProvider::Ollama => Ok(Box::new(OllamaChat::new(&self.cfg))),
            LlmProvider::OpenAi => Ok(Box::new(OpenAiChat::new(&self.cfg)?)),
        }
    }
}
