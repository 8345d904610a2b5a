use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{with_system_prompt, LlmProvider, Message, MAX_REPLY_TOKENS, TEMPERATURE};

/// Any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request<'a>(&'a self, system_prompt: &str, messages: &[Message]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: with_system_prompt(system_prompt, messages),
            max_tokens: MAX_REPLY_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

fn reply_text(response: CompletionResponse) -> anyhow::Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow::anyhow!("missing content in chat completions response"))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request(system_prompt, messages))
            .send()
            .await
            .context("failed to call chat completions API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("chat completions API error ({status}): {body}");
        }

        let data: CompletionResponse = resp
            .json()
            .await
            .context("failed to parse chat completions response")?;
        reply_text(data)
    }
}
