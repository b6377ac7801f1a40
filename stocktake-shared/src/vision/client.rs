//! Vision model client
//!
//! [`VisionModel`] is the seam between scanning and the model provider.
//! [`OpenAiVisionClient`] talks to the OpenAI chat completions API; tests
//! substitute their own implementation.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::normalize::{normalize_detections, NormalizeError};
use super::prompt::InventoryKind;
use crate::models::detected_item::DetectedItem;

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision-capable model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const MAX_TOKENS: u32 = 1000;

/// Vision client errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the provider
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Response held no message content
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// Response body wasn't the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Model output couldn't be normalized
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Image passed to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Publicly reachable image URL
    Url(String),

    /// Base64-encoded image bytes
    Base64 { data: String, mime_type: String },
}

impl ImageSource {
    /// URL form accepted by the `image_url` content part
    pub fn to_url(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Base64 { data, mime_type } => {
                format!("data:{};base64,{}", mime_type, data)
            }
        }
    }
}

/// A model that answers a text prompt about an image
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Returns the model's raw text answer
    async fn complete(&self, prompt: &str, image: &ImageSource) -> Result<String, VisionError>;
}

/// Runs a scan prompt for `kind` and normalizes the answer
pub async fn scan_image(
    model: &dyn VisionModel,
    image: &ImageSource,
    kind: InventoryKind,
) -> Result<Vec<DetectedItem>, VisionError> {
    let raw = model.complete(&kind.prompt(), image).await?;

    let items = normalize_detections(&raw).map_err(|e| {
        warn!(error = %e, kind = %kind, "Could not normalize vision response");
        e
    })?;

    info!(kind = %kind, items = items.len(), "Image scanned");
    Ok(items)
}

/// OpenAI client settings
#[derive(Debug, Clone)]
pub struct OpenAiVisionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiVisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChoiceRaw>,
}

#[derive(Debug, Deserialize)]
struct ChoiceRaw {
    message: MessageRaw,
}

#[derive(Debug, Deserialize)]
struct MessageRaw {
    content: Option<String>,
}

/// OpenAI chat completions client
#[derive(Debug, Clone)]
pub struct OpenAiVisionClient {
    http_client: Client,
    config: OpenAiVisionConfig,
}

impl OpenAiVisionClient {
    pub fn new(config: OpenAiVisionConfig) -> Result<Self, VisionError> {
        if config.api_key.trim().is_empty() {
            return Err(VisionError::Config("OpenAI API key is empty".to_string()));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VisionError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request<'a>(&'a self, prompt: &'a str, image: &ImageSource) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image.to_url() },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
        }
    }
}

fn first_content(response: ChatResponseRaw) -> Result<String, VisionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(VisionError::EmptyResponse)
}

#[async_trait]
impl VisionModel for OpenAiVisionClient {
    async fn complete(&self, prompt: &str, image: &ImageSource) -> Result<String, VisionError> {
        let start = Instant::now();
        let request = self.build_request(prompt, image);

        let response = self
            .http_client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Vision request failed");
                VisionError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Vision API error");
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        debug!(
            model = %self.config.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Vision completion"
        );

        first_content(raw)
    }
}
