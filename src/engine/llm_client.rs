//! Blocking client for an OpenAI-compatible chat completions endpoint.
//! Defaults target a local LM Studio server; env vars override.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";
const DEFAULT_MODEL: &str = "local-model";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl LlmClient {
    /// Configure from the environment: `LLM_BASE_URL`, `LLM_MODEL`,
    /// `LLM_TEMPERATURE`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let temperature = std::env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.7);
        info!("llm client: base_url={base_url} model={model} temperature={temperature}");
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url,
            model,
            temperature,
        })
    }

    /// One chat turn: system framing plus the actor's task prompt, returning
    /// the raw completion text.
    pub fn chat(&self, system: &str, user: &str) -> Result<String> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&req)
            .send()
            .context("sending chat completion request")?
            .error_for_status()
            .context("chat completion request rejected")?
            .json::<ChatCompletionResponse>()
            .context("decoding chat completion response")?;

        let content = resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;
        debug!("llm response ({} chars)", content.len());
        Ok(content)
    }

    /// Probe the endpoint's model listing, for a startup sanity check.
    pub fn test_connection(&self) -> Result<String> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{}/models", self.base_url))
            .send()
            .context("probing models endpoint")?
            .json()
            .context("decoding models listing")?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}
