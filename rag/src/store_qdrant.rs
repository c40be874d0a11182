use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::http::{delete_json, post_json, put_json, HttpError, HttpOptions};
use crate::index_store::{IndexStore, IndexedChunk};
use crate::types::{Chunk, Metadata, ScoredChunk};

#[derive(Serialize)]
struct CreateCollection<'a> {
    vectors: VectorParams<'a>,
}

#[derive(Serialize)]
struct VectorParams<'a> {
    size: usize,
    distance: &'a str,
}

#[derive(Serialize, Deserialize)]
struct PointPayload {
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Serialize)]
struct Point<'a> {
    id: &'a str,
    vector: &'a [f32],
    payload: PointPayload,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: Vec<Point<'a>>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
struct CountRequest {
    exact: bool,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: Option<T>,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    id: Value,
    score: f32,
    payload: Option<PointPayload>,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

/// Durable store backed by the Qdrant REST API.
pub struct QdrantStore {
    base_url: String,
    distance: String,
    http: HttpOptions,
}

impl QdrantStore {
    pub fn new(cfg: &Config) -> Self {
        Self {
            base_url: cfg.qdrant_url.clone(),
            distance: cfg.distance.clone(),
            http: HttpOptions::new(cfg.http_timeout),
        }
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/collections/{}", self.base_url, name)
    }
}

fn store_err(err: HttpError) -> RagError {
    RagError::IndexStore(err.to_string())
}

impl IndexStore for QdrantStore {
    fn delete_collection(&self, name: &str) -> Result<()> {
        delete_json::<Value>(&self.http, &self.collection_url(name)).map_err(store_err)?;
        Ok(())
    }

    fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let body = CreateCollection {
            vectors: VectorParams {
                size: dimension,
                distance: &self.distance,
            },
        };
        put_json::<Value, _>(&self.http, &self.collection_url(name), &body).map_err(store_err)?;
        Ok(())
    }

    fn add(&self, name: &str, records: &[IndexedChunk]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points?wait=true", self.collection_url(name));
        let body = UpsertPoints {
            points: records
                .iter()
                .map(|r| Point {
                    id: &r.chunk.id,
                    vector: &r.vector,
                    payload: PointPayload {
                        text: r.chunk.text.clone(),
                        metadata: r.chunk.metadata.clone(),
                    },
                })
                .collect(),
        };
        put_json::<Value, _>(&self.http, &url, &body).map_err(store_err)?;
        Ok(())
    }

    fn query(&self, name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if vector.is_empty() || k == 0 {
            return Ok(vec![]);
        }
        let url = format!("{}/points/query", self.collection_url(name));
        let req = QueryRequest {
            query: vector,
            limit: k,
            with_payload: true,
        };
        let res = match post_json::<QdrantResponse<QueryResult>, _>(&self.http, &url, &req) {
            Ok(res) => res,
            Err(err) if err.is_not_found() => return Ok(vec![]),
            Err(err) => return Err(store_err(err)),
        };
        Ok(res
            .result
            .map(|r| r.points)
            .unwrap_or_default()
            .into_iter()
            .map(hit_to_scored)
            .collect())
    }

    fn count(&self, name: &str) -> Result<usize> {
        let url = format!("{}/points/count", self.collection_url(name));
        match post_json::<QdrantResponse<CountResult>, _>(&self.http, &url, &CountRequest { exact: true }) {
            Ok(res) => Ok(res.result.map(|r| r.count).unwrap_or(0)),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(store_err(err)),
        }
    }
}

fn hit_to_scored(hit: Hit) -> ScoredChunk {
    let id = match hit.id {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let (text, metadata) = hit
        .payload
        .map(|p| (p.text, p.metadata))
        .unwrap_or_default();
    ScoredChunk {
        chunk: Chunk { id, text, metadata },
        score: hit.score,
    }
}
