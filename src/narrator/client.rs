//! Chat-completions client for the remote text-generation endpoint.

use crate::error::{ReportError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Sampling parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Something that turns a prompt into a passage of text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier reported in the narrative metadata.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String>;
}

/// Connection settings for [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
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
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatClient {
    config: ChatConfig,
    http_client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        info!("Using model {} at {}", config.model, config.api_url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ReportError::remote(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        debug!("Sending {} prompt characters", prompt.len());

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReportError::remote(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    ReportError::remote(format!("cannot connect to {}", self.config.api_url))
                } else {
                    ReportError::remote(format!("failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::remote(format!("API error {}: {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReportError::remote(format!("failed to parse response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ReportError::remote("response contained no text"))
    }
}
