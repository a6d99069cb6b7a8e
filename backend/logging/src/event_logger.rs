//! Scan Event Logger
//!
//! Writes controller events to the `scan_events` target after redaction.

use chrono::{DateTime, Utc};
use leadscan_core::{Event, EventKind};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    /// Redacted JSON payload.
    pub payload: String,
}

impl EventLogEntry {
    pub fn from_event(event: &Event) -> Self {
        Self {
            session_id: event.session_id.to_string(),
            timestamp: event.timestamp,
            kind: event.kind.clone(),
            payload: redact_sensitive_data(&event.payload.to_string()),
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    pub fn log_event(event: &Event) {
        let entry = EventLogEntry::from_event(event);
        info!(
            target: "scan_events",
            session = %entry.session_id,
            kind = %entry.kind,
            payload = %entry.payload,
            "Scan event"
        );
    }
}

/// Log every event published on `rx` until the sender goes away.
pub fn spawn_event_logger(mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => EventLogger::log_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn entry_payload_is_redacted() {
        let event = Event::new(
            Uuid::new_v4(),
            EventKind::RecordCreated,
            json!({ "company": "Acme", "email": "jane@acme.com" }),
        );
        let entry = EventLogEntry::from_event(&event);
        assert!(entry.payload.contains("Acme"));
        assert!(!entry.payload.contains("jane@acme.com"));
        assert_eq!(entry.kind, EventKind::RecordCreated);
    }

    #[tokio::test]
    async fn logger_task_ends_when_sender_drops() {
        let (tx, rx) = broadcast::channel(4);
        let handle = spawn_event_logger(rx);
        tx.send(Event::new(Uuid::new_v4(), EventKind::ScanStarted, json!({})))
            .unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
