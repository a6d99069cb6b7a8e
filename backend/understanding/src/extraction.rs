//! The extraction client: one vision request per capture session, and strict
//! validation of whatever comes back.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use leadscan_core::{
    CapturedImage, ExtractionError, Extractor, LeadFields, VisionModel, VisionRequest,
};

use crate::prompt::{EXTRACTION_INSTRUCTION, RESPONSE_SCHEMA};

pub struct ExtractionClient {
    backend: Arc<dyn VisionModel>,
    model: String,
}

impl ExtractionClient {
    pub fn new(backend: Arc<dyn VisionModel>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn provider(&self) -> &str {
        self.backend.name()
    }

    fn build_request(&self, images: &[CapturedImage]) -> VisionRequest {
        VisionRequest {
            model: self.model.clone(),
            instruction: EXTRACTION_INSTRUCTION.to_string(),
            images: images.to_vec(),
            response_schema: RESPONSE_SCHEMA.clone(),
        }
    }
}

#[async_trait]
impl Extractor for ExtractionClient {
    async fn extract(&self, images: &[CapturedImage]) -> Result<LeadFields, ExtractionError> {
        if images.is_empty() {
            return Err(ExtractionError::NoImages);
        }
        let request = self.build_request(images);
        info!(
            provider = self.backend.name(),
            model = %self.model,
            images = images.len(),
            "Sending images for extraction"
        );

        let response = self
            .backend
            .generate(&request)
            .await
            .map_err(ExtractionError::RequestFailed)?;
        debug!(latency_ms = response.latency_ms, "Extraction reply received");

        parse_lead_fields(&response.content).inspect_err(|err| {
            if let ExtractionError::MalformedResponse { reason, raw } = err {
                warn!(reason = %reason, raw = %raw, "Could not parse extracted data");
            }
        })
    }
}

/// Validate a model reply against the lead field schema.
///
/// The reply must be a JSON object. Recognized fields must be strings or
/// null, absent ones become empty strings, unknown keys are ignored. An
/// object with none of the recognized fields is rejected.
pub fn parse_lead_fields(raw: &str) -> Result<LeadFields, ExtractionError> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(ExtractionError::malformed("empty response", raw));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::malformed(format!("invalid JSON: {e}"), raw))?;
    let Value::Object(map) = value else {
        return Err(ExtractionError::malformed("expected a JSON object", raw));
    };

    let mut fields = LeadFields::default();
    let mut recognized = 0usize;
    for (key, value) in &map {
        let Some(slot) = fields.field_mut(key) else {
            debug!(key = %key, "Ignoring unexpected field");
            continue;
        };
        recognized += 1;
        match value {
            Value::String(s) => *slot = s.trim().to_string(),
            Value::Null => {}
            other => {
                return Err(ExtractionError::malformed(
                    format!("field {key} is not a string: {other}"),
                    raw,
                ));
            }
        }
    }
    if recognized == 0 {
        return Err(ExtractionError::malformed("no lead fields in response", raw));
    }
    Ok(fields)
}

/// Drop a single surrounding Markdown code fence, if any.
fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
