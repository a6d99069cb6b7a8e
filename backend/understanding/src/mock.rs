use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use leadscan_core::{VisionModel, VisionRequest, VisionResponse};

/// A vision backend that returns a canned reply and records every request.
#[derive(Clone)]
pub struct MockVision {
    reply: Result<String, String>,
    requests: Arc<Mutex<Vec<VisionRequest>>>,
}

impl MockVision {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            reply: Ok(content.into()),
            requests: Arc::default(),
        }
    }

    /// A backend whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisionModel for MockVision {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &VisionRequest) -> Result<VisionResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.reply {
            Ok(content) => Ok(VisionResponse {
                content: content.clone(),
                provider: "mock".to_string(),
                model: request.model.clone(),
                latency_ms: 0,
            }),
            Err(message) => anyhow::bail!("{message}"),
        }
    }
}
