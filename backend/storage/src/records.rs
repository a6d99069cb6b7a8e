//! Per-identity record collection, newest first.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use leadscan_core::{render_csv, KeyValueStore, LeadRecord, StoreError};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Storage key holding `email`'s records.
pub fn records_key(email: &str) -> String {
    format!("leads_{email}")
}

/// Counts shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    pub total: usize,
    pub today: usize,
}

/// The records of one identity. Every mutation rewrites the whole collection.
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    records: Vec<LeadRecord>,
}

impl RecordStore {
    /// Load `email`'s collection. Missing or corrupt data yields an empty one.
    pub fn open(kv: Arc<dyn KeyValueStore>, email: &str) -> Self {
        let key = records_key(email);
        let records = match kv.get(&key) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<LeadRecord>>(&raw).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Stored records are corrupt; starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored records; starting empty");
                Vec::new()
            }
        };
        debug!(key = %key, count = records.len(), "Opened record store");
        Self { kv, key, records }
    }

    pub fn list(&self) -> &[LeadRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&LeadRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Insert a new record at the front.
    pub fn insert_front(&mut self, record: LeadRecord) -> Result<(), StoreError> {
        if self.contains(record.id) {
            return Err(StoreError::DuplicateRecordId(record.id));
        }
        let id = record.id;
        self.records.insert(0, record);
        if let Err(e) = self.persist() {
            self.records.remove(0);
            return Err(e);
        }
        info!(id = %id, total = self.records.len(), "Stored record");
        Ok(())
    }

    /// Remove the record with `id`, if present.
    pub fn remove(&mut self, id: Uuid) -> Result<Option<LeadRecord>, StoreError> {
        let Some(pos) = self.records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let removed = self.records.remove(pos);
        if let Err(e) = self.persist() {
            self.records.insert(pos, removed);
            return Err(e);
        }
        info!(id = %id, total = self.records.len(), "Deleted record");
        Ok(Some(removed))
    }

    /// CSV of the whole collection in stored order.
    pub fn export(&self) -> String {
        render_csv(&self.records)
    }

    /// Total records and those created since local midnight.
    pub fn stats(&self, now: DateTime<Local>) -> RecordStats {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|t| Local.from_local_datetime(&t).earliest())
            .map(|t| t.timestamp_millis())
            .unwrap_or(i64::MIN);
        self.stats_since(midnight)
    }

    pub fn stats_since(&self, since_ms: i64) -> RecordStats {
        RecordStats {
            total: self.records.len(),
            today: self.records.iter().filter(|r| r.timestamp >= since_ms).count(),
        }
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| StoreError::Persist(e.into()))?;
        self.kv.set(&self.key, &json).map_err(StoreError::Persist)
    }
}
