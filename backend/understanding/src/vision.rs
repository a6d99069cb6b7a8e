/// Vision backends: Gemini `generateContent` and OpenAI-compatible chat
/// completions, both asked for a strictly typed JSON reply.
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use leadscan_core::{VisionModel, VisionRequest, VisionResponse};

use crate::prompt::to_gemini_schema;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Supported vision providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionProviderKind {
    Gemini,
    OpenAi,
}

impl VisionProviderKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-4o",
        }
    }
}

/// Build a backend for `kind`. `base_url` overrides the public endpoint.
pub fn create_backend(
    kind: VisionProviderKind,
    api_key: impl Into<String>,
    base_url: Option<&str>,
    timeout: Duration,
) -> Arc<dyn VisionModel> {
    match kind {
        VisionProviderKind::Gemini => {
            let mut backend = GeminiVision::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                backend = backend.with_base_url(url);
            }
            Arc::new(backend)
        }
        VisionProviderKind::OpenAi => {
            let mut backend = OpenAiVision::new(api_key).with_timeout(timeout);
            if let Some(url) = base_url {
                backend = backend.with_base_url(url);
            }
            Arc::new(backend)
        }
    }
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

pub struct GeminiVision {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiVision {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Request body: every image as an inline part, then the instruction.
fn gemini_body(request: &VisionRequest) -> serde_json::Value {
    let mut parts: Vec<serde_json::Value> = request
        .images
        .iter()
        .map(|image| json!({ "inlineData": { "mimeType": image.mime_type, "data": image.data } }))
        .collect();
    parts.push(json!({ "text": request.instruction }));
    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": to_gemini_schema(&request.response_schema),
        }
    })
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

/// Text of the first candidate. Without one, the whole body is returned so
/// it is rejected as malformed along with what the service actually sent.
fn gemini_reply_text(body: &str) -> String {
    let text: String = serde_json::from_str::<GeminiResponse>(body)
        .ok()
        .and_then(|resp| resp.candidates.into_iter().next())
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        warn!("Gemini reply has no candidate text");
        return body.to_string();
    }
    text
}

#[async_trait]
impl VisionModel for GeminiVision {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        info!("[Vision] Extracting via Gemini {}", request.model);

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&gemini_body(request))
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Gemini returned {}: {}", status, resp.text().await.unwrap_or_default());
        }
        let body = resp.text().await.context("Failed to read Gemini response")?;
        let text = gemini_reply_text(&body);

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(latency_ms, chars = text.len(), "Gemini reply");
        Ok(VisionResponse {
            content: text,
            provider: "gemini".to_string(),
            model: request.model.clone(),
            latency_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible
// ---------------------------------------------------------------------------

pub struct OpenAiVision {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiVision {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn openai_body(request: &VisionRequest) -> serde_json::Value {
    let mut content = vec![json!({ "type": "text", "text": request.instruction })];
    content.extend(request.images.iter().map(|image| {
        json!({ "type": "image_url", "image_url": { "url": image.to_data_url() } })
    }));
    json!({
        "model": request.model,
        "messages": [{ "role": "user", "content": content }],
        "response_format": {
            "type": "json_schema",
            "json_schema": { "name": "lead_fields", "schema": request.response_schema }
        }
    })
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Content of the first choice, or the whole body when there is none.
fn openai_reply_text(body: &str) -> String {
    let content = serde_json::from_str::<ChatResponse>(body)
        .ok()
        .and_then(|resp| resp.choices.into_iter().next())
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    if content.trim().is_empty() {
        warn!("OpenAI reply has no message content");
        return body.to_string();
    }
    content
}

#[async_trait]
impl VisionModel for OpenAiVision {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        info!("[Vision] Extracting via OpenAI {}", request.model);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&openai_body(request))
            .send()
            .await
            .context("OpenAI HTTP request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("OpenAI returned {}: {}", status, resp.text().await.unwrap_or_default());
        }
        let body = resp.text().await.context("Failed to read OpenAI response")?;
        let content = openai_reply_text(&body);

        Ok(VisionResponse {
            content,
            provider: "openai".to_string(),
            model: request.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
