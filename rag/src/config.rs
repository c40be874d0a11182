use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RagError, Result};

pub const DEFAULT_COLLECTION: &str = "document_articles";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Qdrant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    OpenAi,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub collection: String,
    pub system_prompt: String,
    pub source_dir: String,
    pub exclude_dirs: Vec<String>,
    pub max_file_bytes: u64,
    pub store: StoreBackend,
    pub qdrant_url: String,
    pub distance: String,
    pub ollama_url: String,
    pub embed_model: String,
    pub embed_dim: Option<usize>,
    pub llm_provider: LlmProvider,
    pub chat_model: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub pdftotext_bin: String,
    pub http_timeout: Duration,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env if present so provider keys work without manual `source .env`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let string = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let llm_provider = match string("LLM_PROVIDER", "ollama").to_lowercase().as_str() {
            "ollama" => LlmProvider::Ollama,
            "openai" | "groq" => LlmProvider::OpenAi,
            other => {
                return Err(RagError::Config(format!("unknown LLM_PROVIDER '{}'", other)));
            }
        };
        let chat_model = match llm_provider {
            LlmProvider::Ollama => string("OLLAMA_CHAT_MODEL", "llama3.1:8b"),
            LlmProvider::OpenAi => string("OPENAI_CHAT_MODEL", "llama-3.3-70b-versatile"),
        };

        let cfg = Self {
            chunk_size: parse(&var, "RAG_CHUNK_SIZE", 1000)?,
            chunk_overlap: parse(&var, "RAG_CHUNK_OVERLAP", 200)?,
            collection: string("RAG_COLLECTION", DEFAULT_COLLECTION),
            system_prompt: string(
                "RAG_SYSTEM_PROMPT",
                "You answer questions about the user's documents. Use only the provided context. \
                 If the context does not contain the answer, say that you don't know.",
            ),
            source_dir: string("RAG_SOURCE_DIR", "./"),
            exclude_dirs: string("RAG_EXCLUDE_DIRS", ".git,target,node_modules,qdrant_storage")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_file_bytes: parse(&var, "RAG_MAX_FILE_BYTES", 50_000_000)?,
            store: match string("VECTOR_STORE", "memory").to_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "qdrant" => StoreBackend::Qdrant,
                other => {
                    return Err(RagError::Config(format!("unknown VECTOR_STORE '{}'", other)));
                }
            },
            qdrant_url: trim_url(string("QDRANT_URL", "http://localhost:6333")),
            distance: string("QDRANT_DISTANCE", "Cosine"),
            ollama_url: trim_url(string("OLLAMA_URL", "http://localhost:11434")),
            embed_model: string("OLLAMA_EMBED_MODEL", "nomic-embed-text"),
            embed_dim: match var("EMBED_DIM") {
                Some(_) => Some(parse(&var, "EMBED_DIM", 0)?),
                None => None,
            },
            llm_provider,
            chat_model,
            openai_base_url: trim_url(string("OPENAI_BASE_URL", "https://api.groq.com/openai/v1")),
            openai_api_key: var("OPENAI_API_KEY").or_else(|| var("GROQ_API_KEY")),
            pdftotext_bin: string("PDFTOTEXT_BIN", "pdftotext"),
            http_timeout: Duration::from_secs(parse(&var, "HTTP_TIMEOUT_SECS", 120)?),
            bind_addr: string("DOCQA_ADDR", "127.0.0.1:8000"),
            max_upload_bytes: parse(&var, "MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("RAG_CHUNK_SIZE must be greater than zero".into()));
        }
        if self.embed_dim == Some(0) {
            return Err(RagError::Config("EMBED_DIM must be greater than zero".into()));
        }
        if self.collection.is_empty() {
            return Err(RagError::Config("RAG_COLLECTION must not be empty".into()));
        }
        Ok(())
    }
}

fn parse<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
