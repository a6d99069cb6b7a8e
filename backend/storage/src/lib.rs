//! Persistence for LeadScan: a key-value port with in-memory and file
//! backends, the per-identity record store, and the signed-in identity.

pub mod identity;
pub mod kv;
pub mod records;

pub use identity::{IdentityStore, IDENTITY_KEY};
pub use kv::{InMemoryKvStore, JsonFileKvStore};
pub use records::{records_key, RecordStats, RecordStore};
