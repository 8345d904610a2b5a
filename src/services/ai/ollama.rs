use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{with_system_prompt, LlmProvider, Message, MAX_REPLY_TOKENS, TEMPERATURE};

pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<ReplyMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    fn request<'a>(&'a self, system_prompt: &str, messages: &[Message]) -> OllamaRequest<'a> {
        OllamaRequest {
            model: &self.model,
            messages: with_system_prompt(system_prompt, messages),
            stream: false,
            options: OllamaOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_REPLY_TOKENS,
            },
        }
    }
}

// Ollama reports failures such as an unknown model in an `error` field.
fn reply_text(response: OllamaResponse) -> anyhow::Result<String> {
    if let Some(error) = response.error {
        anyhow::bail!("Ollama error: {error}");
    }
    response
        .message
        .map(|m| m.content)
        .ok_or_else(|| anyhow::anyhow!("missing content in Ollama response"))
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let data: OllamaResponse = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&self.request(system_prompt, messages))
            .send()
            .await
            .context("failed to call Ollama API")?
            .json()
            .await
            .context("failed to parse Ollama response")?;

        reply_text(data)
    }
}
