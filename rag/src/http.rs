use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::from_str;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{method} {url} failed: {reason}")]
    Transport {
        method: Method,
        url: String,
        reason: String,
    },

    #[error("{method} {url} failed: {status} {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{method} {url} decode failed: {reason} | {body}")]
    Decode {
        method: Method,
        url: String,
        reason: String,
        body: String,
    },
}

impl HttpError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HttpError::Status { status: 404, .. })
    }
}

/// Per-call client settings. A fresh client is built for every request so no
/// connection state outlives the call that needed it.
#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub bearer_token: Option<String>,
}

impl HttpOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            bearer_token: None,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }
}

pub fn post_json<T: DeserializeOwned, B: Serialize>(
    opts: &HttpOptions,
    url: &str,
    body: &B,
) -> Result<T, HttpError> {
    send(opts, Method::POST, url, Some(body))
}

pub fn put_json<T: DeserializeOwned, B: Serialize>(
    opts: &HttpOptions,
    url: &str,
    body: &B,
) -> Result<T, HttpError> {
    send(opts, Method::PUT, url, Some(body))
}

pub fn delete_json<T: DeserializeOwned>(opts: &HttpOptions, url: &str) -> Result<T, HttpError> {
    send::<T, ()>(opts, Method::DELETE, url, None)
}

fn send<T: DeserializeOwned, B: Serialize>(
    opts: &HttpOptions,
    method: Method,
    url: &str,
    body: Option<&B>,
) -> Result<T, HttpError> {
    let transport = |reason: String| HttpError::Transport {
        method: method.clone(),
        url: url.to_string(),
        reason,
    };

    let client = Client::builder()
        .timeout(opts.timeout)
        .build()
        .map_err(|e| transport(e.to_string()))?;
    let mut req = client.request(method.clone(), url);
    if let Some(token) = &opts.bearer_token {
        req = req.bearer_auth(token);
    }
    if let Some(body) = body {
        req = req.header(CONTENT_TYPE, "application/json").json(body);
    }
    let resp = req.send().map_err(|e| transport(e.to_string()))?;
    let status = resp.status();
    let text = resp.text().unwrap_or_default();
    if !status.is_success() {
        return Err(HttpError::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            body: text,
        });
    }
    from_str::<T>(&text).map_err(|e| HttpError::Decode {
        method,
        url: url.to_string(),
        reason: e.to_string(),
        body: text,
    })
}
