use anyhow::Result;
use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::types::{CapturedImage, LeadFields};

/// A hosted multimodal model that answers a prompt about a set of images.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// Send one request carrying every image and return the raw reply text.
    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision model.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub instruction: String,
    /// Images in capture order.
    pub images: Vec<CapturedImage>,
    /// JSON schema the reply must follow.
    pub response_schema: serde_json::Value,
}

/// Response from a vision model.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

/// Turns the images of one capture session into lead fields.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, images: &[CapturedImage]) -> Result<LeadFields, ExtractionError>;
}

/// Key-value persistence. Reads return the last written value; writes are
/// last-write-wins and complete before returning.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
