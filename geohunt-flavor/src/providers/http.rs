//! HTTP flavor provider speaking the Anthropic Messages API.

use crate::{build_prompt, FlavorContext, FlavorKind, FlavorProvider};
use async_trait::async_trait;
use geohunt_core::FlavorError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

const PROVIDER_ID: &str = "http";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const API_VERSION: &str = "2023-06-01";

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings for [`HttpFlavorProvider`].
#[derive(Clone)]
pub struct HttpFlavorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Concurrent in-flight requests.
    pub max_concurrent: usize,
}

impl HttpFlavorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 120,
            max_concurrent: 4,
        }
    }

    /// Load from environment variables. `None` when no API key is set.
    ///
    /// - `GEOHUNT_FLAVOR_API_KEY`: provider API key (required)
    /// - `GEOHUNT_FLAVOR_BASE_URL`: API base URL (default: Anthropic v1)
    /// - `GEOHUNT_FLAVOR_MODEL`: model name
    /// - `GEOHUNT_FLAVOR_MAX_TOKENS`: completion budget (default: 120)
    /// - `GEOHUNT_FLAVOR_MAX_CONCURRENT`: concurrent requests (default: 4)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEOHUNT_FLAVOR_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEOHUNT_FLAVOR_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("GEOHUNT_FLAVOR_MODEL") {
            config.model = model;
        }
        config.max_tokens = std::env::var("GEOHUNT_FLAVOR_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.max_tokens);
        config.max_concurrent = std::env::var("GEOHUNT_FLAVOR_MAX_CONCURRENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.max_concurrent);
        Some(config)
    }
}

impl std::fmt::Debug for HttpFlavorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFlavorConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("max_concurrent", &self.max_concurrent)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Join the text blocks of a response body.
fn extract_text(body: &str) -> Result<String, FlavorError> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| FlavorError::InvalidResponse {
            provider: PROVIDER_ID.to_string(),
            reason: format!("Failed to parse response: {}", e),
        })?;
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        return Err(FlavorError::InvalidResponse {
            provider: PROVIDER_ID.to_string(),
            reason: "no text content".to_string(),
        });
    }
    Ok(text)
}

fn error_for_status(status: StatusCode, body: &str) -> FlavorError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    FlavorError::RequestFailed {
        provider: PROVIDER_ID.to_string(),
        status: status.as_u16(),
        message,
    }
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Flavor provider calling a hosted language model.
pub struct HttpFlavorProvider {
    client: Client,
    config: HttpFlavorConfig,
    rate_limiter: Arc<Semaphore>,
}

impl HttpFlavorProvider {
    pub fn new(config: HttpFlavorConfig) -> Self {
        let permits = config.max_concurrent.max(1);
        Self {
            client: Client::new(),
            config,
            rate_limiter: Arc::new(Semaphore::new(permits)),
        }
    }
}

#[async_trait]
impl FlavorProvider for HttpFlavorProvider {
    async fn generate(
        &self,
        kind: FlavorKind,
        context: &FlavorContext,
    ) -> Result<String, FlavorError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| FlavorError::RequestFailed {
                provider: PROVIDER_ID.to_string(),
                status: 0,
                message: format!("Rate limiter error: {}", e),
            })?;

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: build_prompt(kind, context),
            }],
        };

        let url = format!("{}/messages", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlavorError::RequestFailed {
                provider: PROVIDER_ID.to_string(),
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FlavorError::InvalidResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to read body: {}", e),
            })?;

        if status.is_success() {
            extract_text(&text)
        } else {
            Err(error_for_status(status, &text))
        }
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

impl std::fmt::Debug for HttpFlavorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFlavorProvider")
            .field("config", &self.config)
            .finish()
    }
}
