use std::sync::Arc;

use leadscan_core::{Identity, KeyValueStore};
use tracing::warn;

/// Key holding the signed-in identity descriptor.
pub const IDENTITY_KEY: &str = "leadscan_user";

/// Remembers who is signed in across runs.
#[derive(Clone)]
pub struct IdentityStore {
    kv: Arc<dyn KeyValueStore>,
}

impl IdentityStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The persisted identity, if any. Unreadable or corrupt data counts as
    /// signed out.
    pub fn load(&self) -> Option<Identity> {
        let raw = match self.kv.get(IDENTITY_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read stored identity");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "Stored identity is corrupt; ignoring"))
            .ok()
    }

    pub fn save(&self, identity: &Identity) -> anyhow::Result<()> {
        self.kv.set(IDENTITY_KEY, &serde_json::to_string(identity)?)
    }

    /// Forget the identity. Record collections are left untouched.
    pub fn clear(&self) -> anyhow::Result<()> {
        self.kv.remove(IDENTITY_KEY)
    }
}
