//! Generic OpenAI-compatible generator.
//! Most LLM APIs follow the same `/v1/chat/completions` format, so a single
//! implementation covers OpenAI, OpenRouter, Groq, Mistral and friends.

use super::TextGenerator;
use crate::config::GeneratorConfig;
use crate::http::build_client;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAiCompatibleGenerator {
    model: String,
    temperature: f64,
    api_key: Option<String>,
    /// Pre-computed chat completions URL (avoids `format!` per request).
    cached_chat_url: String,
    client: Client,
}

impl OpenAiCompatibleGenerator {
    pub fn new(base_url: &str, api_key: Option<&str>, model: &str, temperature: f64) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let cached_chat_url = if base_url.contains("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            model: model.to_string(),
            temperature,
            api_key: api_key.map(ToString::to_string),
            cached_chat_url,
            client: build_client(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            &config.base_url,
            config.api_key.as_deref(),
            &config.model,
            config.temperature,
        )
    }

    fn chat_completions_url(&self) -> &str {
        &self.cached_chat_url
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        if self.api_key.is_none() {
            anyhow::bail!("generator API key not set (export KRILL_LLM_API_KEY)");
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let mut builder = self.client.post(self.chat_completions_url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .context("chat completions request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            anyhow::bail!("chat completions error ({status}): {body}");
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("chat completions JSON decode failed")?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("no completion choices in response"))
    }
}
