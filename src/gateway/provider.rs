//! Completion backends
//!
//! One logical operation against an OpenAI-compatible chat-completions API
//! (DeepSeek by default). The rest of the crate only sees the
//! [`CompletionBackend`] trait, so tests inject their own backend.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::GatewayError;
use crate::utils::ellipsize;

/// A single completion call: prompt, optional system framing, sampling
/// temperature, and whether the API should be asked for a JSON object.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: f32,
    pub json_object: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: 0.2,
            json_object: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json_object = true;
        self
    }
}

/// Opaque completion capability: `complete(request) -> text`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

/// Connection settings for the completion API, read from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Reads `DEEPSEEK_API_KEY` (required), `EIGHTD_BASE_URL`, `EIGHTD_MODEL`
    /// and `EIGHTD_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = env::var("DEEPSEEK_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GatewayError::MissingApiKey)?;

        let base_url = env::var("EIGHTD_BASE_URL")
            .unwrap_or_else(|_| "https://api.deepseek.com".to_string());
        let model = env::var("EIGHTD_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string());
        let timeout_secs = env::var("EIGHTD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        Ok(Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// reqwest-based backend for DeepSeek or any OpenAI-compatible endpoint.
pub struct DeepSeekBackend {
    client: Client,
    config: GatewayConfig,
}

impl DeepSeekBackend {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionBackend for DeepSeekBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature,
        });
        if request.json_object {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(model = %self.config.model, json = request.json_object, "sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: ellipsize(&body, 500),
            });
        }

        let payload: Value = response.json().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GatewayError::EmptyCompletion)?;

        debug!(bytes = content.len(), "completion received");
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_defaults() {
        let request = CompletionRequest::new("hello")
            .with_temperature(0.1)
            .expect_json();
        assert_eq!(request.prompt, "hello");
        assert!(request.system.is_none());
        assert!(request.json_object);
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }
}
