use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something that happened during a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new scan was started
    ScanStarted,
    /// The camera could not be opened; upload only
    CameraFallback,
    /// An image was added to the buffer
    ImageAdded,
    /// An image was removed from the buffer
    ImageRemoved,
    /// The user cancelled the scan
    ScanCancelled,
    /// Images were sent for extraction
    ExtractionStarted,
    /// A record was created from the extraction
    RecordCreated,
    /// Extraction failed
    ExtractionFailed,
    /// The session went back to idle
    SessionIdle,
}

impl Event {
    pub fn new(session_id: Uuid, kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            timestamp: Utc::now(),
            kind,
            payload,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let session_id = Uuid::new_v4();
        let event = Event::new(
            session_id,
            EventKind::ImageAdded,
            serde_json::json!({"count": 1}),
        );
        assert_eq!(event.session_id, session_id);
        assert_eq!(event.kind, EventKind::ImageAdded);
    }

    #[test]
    fn test_event_kind_display() {
        assert_eq!(EventKind::ScanStarted.to_string(), "scan_started");
        assert_eq!(EventKind::ExtractionFailed.to_string(), "extraction_failed");
    }
}
