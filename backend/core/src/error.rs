use thiserror::Error;
use uuid::Uuid;

/// Message shown to the user for any failed extraction.
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to extract data. Please try clearer photos.";

/// Camera access failures. Always recoverable by falling back to file upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the extraction client.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no images to extract from")]
    NoImages,

    /// The outbound call failed: network, auth, rate limit, or model error.
    #[error("extraction request failed: {0}")]
    RequestFailed(#[source] anyhow::Error),

    /// The model answered, but not with the expected JSON object.
    #[error("malformed extraction response: {reason}")]
    MalformedResponse { reason: String, raw: String },
}

impl ExtractionError {
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// The generic, retry-suggesting message for this failure.
    pub fn user_message(&self) -> &'static str {
        EXTRACTION_FAILED_MESSAGE
    }
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Inserting an id that is already present. Ids are generated fresh, so
    /// this indicates a caller bug.
    #[error("record id {0} already exists")]
    DuplicateRecordId(Uuid),

    #[error("failed to persist records: {0}")]
    Persist(#[source] anyhow::Error),
}
