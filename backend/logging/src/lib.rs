//! Logging for LeadScan.
//!
//! Console and rolling-file output, redaction of contact details and keys,
//! and the scan event log.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{spawn_event_logger, EventLogEntry, EventLogger};
pub use logger::{init_logger, LOG_FILE_NAME};
pub use redact::redact_sensitive_data;
