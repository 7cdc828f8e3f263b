//! Chat-completion client for match predictions
//!
//! One non-streaming request per prompt against an OpenAI-compatible
//! `/chat/completions` endpoint. No retries: a failed call fails the match.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{LlmConfig, DEFAULT_LLM_URL};
use crate::error::{Result, TippError};
use crate::secrets::{Credentials, Secret};

/// Anything that turns a prompt into a prediction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn request(&self, prompt: &str) -> Result<String>;
}

/// Prediction client configuration
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub api_key: Option<Secret>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl PredictionConfig {
    /// Settings from config, endpoint and key from the resolved credentials
    pub fn new(llm: &LlmConfig, credentials: &Credentials) -> Self {
        Self {
            api_key: credentials.llm_api_key.clone(),
            base_url: credentials
                .llm_base_url
                .as_ref()
                .map(|url| url.expose().to_string())
                .unwrap_or_else(|| DEFAULT_LLM_URL.to_string()),
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            system_prompt: system_prompt(&llm.tournament),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Fixed system instruction naming the tournament
pub fn system_prompt(tournament: &str) -> String {
    format!("Du bist ein deutscher Fußballexperte zur {}", tournament)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion client
pub struct PredictionClient {
    config: PredictionConfig,
    http: Client,
}

impl PredictionClient {
    pub fn new(config: PredictionConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| TippError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Send one prompt and return the first choice's text
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.config.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!("Sending prediction request to {} ({} prompt chars)", url, prompt.len());

        let mut builder = self.http.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key.expose());
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API error: {} - {}", status, body);
            return Err(TippError::Llm(format!("API error: {} - {}", status, body)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| TippError::Llm(format!("Failed to parse completion: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TippError::Llm("Completion contained no message".to_string()))?;

        debug!("Prediction received: {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl Predictor for PredictionClient {
    async fn request(&self, prompt: &str) -> Result<String> {
        self.chat(prompt).await
    }
}
