use serde::{Deserialize, Serialize};

use crate::build_prompt::Message;
use crate::config::Config;
use crate::error::{RagError, Result};
use crate::http::{post_json, HttpOptions};

/// Turns a prompt into a single completion.
pub trait Completer: Send + Sync {
    fn complete(&self, messages: &[Message], temperature: f32) -> Result<String>;
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<ChatMessage>,
    error: Option<String>,
}

impl OllamaChatResponse {
    fn into_content(self) -> Result<String> {
        if let Some(err) = self.error {
            return Err(RagError::CompletionProvider(err));
        }
        self.message
            .and_then(|m| m.content)
            .ok_or_else(|| RagError::CompletionProvider("response contained no message".into()))
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OllamaChat {
    base_url: String,
    model: String,
    http: HttpOptions,
}

impl OllamaChat {
    pub fn new(cfg: &Config) -> Self {
        Self {
            base_url: cfg.ollama_url.clone(),
            model: cfg.chat_model.clone(),
            http: HttpOptions::new(cfg.http_timeout),
        }
    }
}

impl Completer for OllamaChat {
    fn complete(&self, messages: &[Message], temperature: f32) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let req = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions { temperature },
        };
        let res = post_json::<OllamaChatResponse, _>(&self.http, &url, &req)
            .map_err(|e| RagError::CompletionProvider(e.to_string()))?;
        res.into_content()
    }
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<ChatMessage>,
}

/// Any `/chat/completions` endpoint: Groq, OpenAI, vLLM, llama.cpp server.
pub struct OpenAiChat {
    base_url: String,
    model: String,
    http: HttpOptions,
}

impl OpenAiChat {
    pub fn new(cfg: &Config) -> Result<Self> {
        if cfg.openai_api_key.is_none() && cfg.openai_base_url.starts_with("https://") {
            return Err(RagError::CompletionProvider(
                "OPENAI_API_KEY (or GROQ_API_KEY) is not set".into(),
            ));
        }
        Ok(Self {
            base_url: cfg.openai_base_url.clone(),
            model: cfg.chat_model.clone(),
            http: HttpOptions::new(cfg.http_timeout).with_bearer(cfg.openai_api_key.clone()),
        })
    }
}

impl Completer for OpenAiChat {
    fn complete(&self, messages: &[Message], temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = OpenAiChatRequest {
            model: &self.model,
            messages,
            temperature,
            stream: false,
        };
        let res = post_json::<OpenAiChatResponse, _>(&self.http, &url, &req)
            .map_err(|e| RagError::CompletionProvider(e.to_string()))?;
        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| RagError::CompletionProvider("response contained no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ollama_request_carries_temperature_option() {
        let messages = vec![Message::user("hi")];
        let req = OllamaChatRequest {
            model: "llama3.1:8b",
            messages: &messages,
            stream: false,
            options: OllamaOptions { temperature: 0.5 },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["options"]["temperature"], json!(0.5));
        assert_eq!(value["stream"], json!(false));
        assert_eq!(value["messages"][0]["role"], json!("user"));
    }

    #[test]
    fn ollama_reply_without_message_is_a_provider_error() {
        let res: OllamaChatResponse =
            serde_json::from_value(json!({"error": "model 'llama3.1:8b' not found"})).unwrap();
        match res.into_content() {
            Err(RagError::CompletionProvider(msg)) => assert!(msg.contains("not found")),
            other => panic!("unexpected result: {other:?}"),
        }

        let res: OllamaChatResponse = serde_json::from_value(json!({"done": true})).unwrap();
        assert!(matches!(res.into_content(), Err(RagError::CompletionProvider(_))));

        let res: OllamaChatResponse =
            serde_json::from_value(json!({"message": {"role": "assistant"}})).unwrap();
        assert!(matches!(res.into_content(), Err(RagError::CompletionProvider(_))));
    }

    #[test]
    fn ollama_reply_content_is_returned() {
        let res: OllamaChatResponse = serde_json::from_value(json!({
            "message": {"role": "assistant", "content": "Paris"},
            "done": true
        }))
        .unwrap();
        assert_eq!(res.into_content().unwrap(), "Paris");
    }

    #[test]
    fn openai_response_takes_first_choice() {
        let res: OpenAiChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "42"}}]
        }))
        .unwrap();
        let content = res.choices.into_iter().next().and_then(|c| c.message).and_then(|m| m.content);
        assert_eq!(content.as_deref(), Some("42"));
    }

    #[test]
    fn hosted_openai_endpoint_requires_a_key() {
        let cfg = Config::from_lookup(|key| match key {
            "LLM_PROVIDER" => Some("openai".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(matches!(OpenAiChat::new(&cfg), Err(RagError::CompletionProvider(_))));
    }
}
