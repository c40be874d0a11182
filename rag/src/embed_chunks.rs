use std::sync::OnceLock;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::http::{post_json, HttpOptions};

/// Turns text into vectors. Documents and queries must land in the same
/// vector space, so both go through the same model.
pub trait Embedder: Send + Sync {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vecs = self.embed_documents(&[text.to_string()])?;
        vecs.into_iter()
            .next()
            .ok_or_else(|| RagError::EmbeddingProvider("provider returned no embedding".into()))
    }

    /// Length of every vector this embedder produces.
    fn dimension(&self) -> Result<usize>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Serialize)]
struct EmbedLegacyRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    http: HttpOptions,
    dimension: OnceLock<usize>,
}

impl OllamaEmbedder {
    pub fn new(cfg: &Config) -> Self {
        let dimension = OnceLock::new();
        if let Some(dim) = cfg.embed_dim {
            let _ = dimension.set(dim);
        }
        Self {
            base_url: cfg.ollama_url.clone(),
            model: cfg.embed_model.clone(),
            http: HttpOptions::new(cfg.http_timeout),
            dimension,
        }
    }

    fn embed_legacy(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // The legacy endpoint only embeds one prompt per call.
        let url = format!("{}/api/embeddings", self.base_url);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let req = EmbedLegacyRequest {
                model: &self.model,
                prompt: text,
            };
            let res = post_json::<Value, _>(&self.http, &url, &req)
                .map_err(|e| RagError::EmbeddingProvider(e.to_string()))?;
            out.extend(parse_embeddings(res)?);
        }
        Ok(out)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/api/embed", self.base_url);
        let req = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let vectors = match post_json::<Value, _>(&self.http, &url, &req) {
            Ok(res) => parse_embeddings(res)?,
            Err(err) => {
                debug!(error = %err, "embed endpoint failed, trying legacy endpoint");
                self.embed_legacy(texts)
                    .map_err(|legacy| fallback_error(&err.to_string(), legacy))?
            }
        };
        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingProvider(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        if let Some(first) = vectors.first() {
            let _ = self.dimension.set(first.len());
        }
        Ok(vectors)
    }

    fn dimension(&self) -> Result<usize> {
        if let Some(dim) = self.dimension.get() {
            return Ok(*dim);
        }
        let probe = self.embed_query("dimension probe")?;
        if probe.is_empty() {
            return Err(RagError::EmbeddingProvider("provider returned an empty vector".into()));
        }
        Ok(*self.dimension.get_or_init(|| probe.len()))
    }
}

/// Both endpoints failed: report the primary failure first.
fn fallback_error(primary: &str, legacy: RagError) -> RagError {
    let legacy = match legacy {
        RagError::EmbeddingProvider(msg) => msg,
        other => other.to_string(),
    };
    RagError::EmbeddingProvider(format!("{}; legacy endpoint: {}", primary, legacy))
}

fn parse_embeddings(value: Value) -> Result<Vec<Vec<f32>>> {
    if let Some(embeddings) = value.get("embeddings") {
        return parse_embeddings_value(embeddings);
    }
    if let Some(embedding) = value.get("embedding") {
        return parse_embeddings_value(embedding);
    }
    Err(RagError::EmbeddingProvider("no embeddings in response".into()))
}

fn parse_embeddings_value(value: &Value) -> Result<Vec<Vec<f32>>> {
    let arr = value
        .as_array()
        .ok_or_else(|| RagError::EmbeddingProvider("invalid embeddings format".into()))?;
    if arr.is_empty() {
        return Ok(vec![]);
    }
    if arr[0].is_array() {
        return arr.iter().map(parse_vec).collect();
    }
    Ok(vec![parse_vec(value)?])
}

fn parse_vec(value: &Value) -> Result<Vec<f32>> {
    let arr = value
        .as_array()
        .ok_or_else(|| RagError::EmbeddingProvider("embedding is not an array".into()))?;
    arr.iter()
        .map(|v| {
            v.as_f64()
                .map(|n| n as f32)
                .ok_or_else(|| RagError::EmbeddingProvider("embedding value is not a number".into()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_batch_and_single_shapes() {
        let batch = parse_embeddings(json!({"embeddings": [[0.1, 0.2], [0.3, 0.4]]})).unwrap();
        assert_eq!(batch, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        let single = parse_embeddings(json!({"embedding": [1.0, 2.0, 3.0]})).unwrap();
        assert_eq!(single, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(parse_embeddings(json!({"data": []})).is_err());
        assert!(parse_embeddings(json!({"embedding": "nope"})).is_err());
        assert!(parse_embeddings(json!({"embeddings": [[0.1, "x"]]})).is_err());
    }

    #[test]
    fn fallback_failure_keeps_both_causes() {
        let err = fallback_error(
            "POST http://localhost:11434/api/embed failed: 404 model \"nomic-embed-text\" not found",
            RagError::EmbeddingProvider("POST http://localhost:11434/api/embeddings failed: 404".into()),
        );
        match err {
            RagError::EmbeddingProvider(msg) => {
                assert!(msg.starts_with("POST http://localhost:11434/api/embed failed"));
                assert!(msg.contains("not found"));
                assert!(msg.contains("legacy endpoint: POST http://localhost:11434/api/embeddings"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreachable_provider_reports_both_endpoints() {
        let cfg = Config::from_lookup(|key| match key {
            "OLLAMA_URL" => Some("http://127.0.0.1:9".to_string()),
            "HTTP_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();
        let err = OllamaEmbedder::new(&cfg)
            .embed_documents(&["hello".to_string()])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("/api/embed "), "{msg}");
        assert!(msg.contains("legacy endpoint"), "{msg}");
        assert!(msg.contains("/api/embeddings"), "{msg}");
    }

    #[test]
    fn configured_dimension_skips_probe() {
        let cfg = Config::from_lookup(|key| match key {
            "EMBED_DIM" => Some("384".to_string()),
            "OLLAMA_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        let embedder = OllamaEmbedder::new(&cfg);
        assert_eq!(embedder.dimension().unwrap(), 384);
    }
}
