// src/completion/openai_compat.rs — OpenAI-compatible streaming backend
//
// Works against any /chat/completions endpoint that speaks the OpenAI
// SSE dialect (Groq, Together, DeepSeek, custom gateways).

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};

use super::{CompletionProvider, CompletionStream, Turn, SYSTEM_PREAMBLE};
use crate::infra::config::CompletionConfig;
use crate::infra::errors::WayfarerError;

pub struct OpenAICompatProvider {
    id_str: String,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(
        id: impl Into<String>,
        api_key: String,
        base_url: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            id_str: id.into(),
            api_key,
            base_url,
            model,
            temperature,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }

    /// Build a provider from config, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, WayfarerError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            WayfarerError::Config(format!(
                "completion API key not set; export {}",
                config.api_key_env
            ))
        })?;
        Ok(Self::new(
            "openai-compat",
            api_key,
            config.base_url.clone(),
            config.model.clone(),
            config.temperature,
            config.max_tokens,
        ))
    }

    fn request_body(&self, turns: &[Turn]) -> serde_json::Value {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(serde_json::json!({"role": "system", "content": SYSTEM_PREAMBLE}));
        for turn in turns {
            messages.push(serde_json::json!({
                "role": turn.role.as_str(),
                "content": turn.content,
            }));
        }

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": true,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    async fn complete_stream(&self, turns: &[Turn]) -> Result<CompletionStream, WayfarerError> {
        let provider_id = self.id_str.clone();

        let request_builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(turns));

        let mut es = request_builder
            .eventsource()
            .map_err(|e| WayfarerError::Completion {
                message: e.to_string(),
                retriable: false,
            })?;

        let stream = async_stream::stream! {
            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(msg)) => {
                        if msg.data == "[DONE]" {
                            break;
                        }
                        let parsed: serde_json::Value = match serde_json::from_str(&msg.data) {
                            Ok(v) => v,
                            Err(e) => {
                                tracing::debug!("{provider_id}: skipping malformed chunk: {e}");
                                continue;
                            }
                        };
                        if let Some(delta) = parsed["choices"][0]["delta"]["content"].as_str() {
                            if !delta.is_empty() {
                                yield Ok(delta.to_string());
                            }
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        yield Err(WayfarerError::Completion {
                            message: e.to_string(),
                            retriable: matches!(e, reqwest_eventsource::Error::Transport(_)),
                        });
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
