//! The signed-in identity together with its record collection.

use std::sync::Arc;

use anyhow::Result;
use leadscan_core::{Identity, KeyValueStore};
use leadscan_storage::{IdentityStore, RecordStore};
use tracing::info;

use crate::error::AuthError;

struct Active {
    identity: Identity,
    records: RecordStore,
}

pub struct Workspace {
    kv: Arc<dyn KeyValueStore>,
    identities: IdentityStore,
    active: Option<Active>,
}

impl Workspace {
    /// Open the workspace, restoring the last signed-in identity if any.
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let identities = IdentityStore::new(kv.clone());
        let mut workspace = Self {
            kv,
            identities,
            active: None,
        };
        if let Some(identity) = workspace.identities.load() {
            info!(email = %identity.email, "Restored session");
            workspace.activate(identity);
        }
        workspace
    }

    /// Make `identity` the active one. Its collection replaces whatever was
    /// visible before.
    pub fn sign_in(&mut self, identity: Identity) -> Result<&Identity> {
        self.identities.save(&identity)?;
        info!(email = %identity.email, "Switched identity");
        Ok(&self.activate(identity).identity)
    }

    /// Forget the active identity. Its records stay on disk.
    pub fn sign_out(&mut self) -> Result<Option<Identity>> {
        self.identities.clear()?;
        let previous = self.active.take().map(|active| active.identity);
        if let Some(identity) = &previous {
            info!(email = %identity.email, "Signed out");
        }
        Ok(previous)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.active.as_ref().map(|active| &active.identity)
    }

    pub fn records(&self) -> Result<&RecordStore, AuthError> {
        self.active
            .as_ref()
            .map(|active| &active.records)
            .ok_or(AuthError::NotSignedIn)
    }

    pub fn records_mut(&mut self) -> Result<&mut RecordStore, AuthError> {
        self.active
            .as_mut()
            .map(|active| &mut active.records)
            .ok_or(AuthError::NotSignedIn)
    }

    fn activate(&mut self, identity: Identity) -> &Active {
        let records = RecordStore::open(self.kv.clone(), &identity.email);
        self.active.insert(Active { identity, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscan_core::{LeadFields, LeadRecord};
    use leadscan_storage::InMemoryKvStore;
    use uuid::Uuid;

    fn record(company: &str) -> LeadRecord {
        LeadRecord::new(
            Uuid::new_v4(),
            LeadFields {
                company_name: company.into(),
                ..Default::default()
            },
            1,
        )
    }

    #[test]
    fn nothing_is_visible_when_signed_out() {
        let ws = Workspace::open(Arc::new(InMemoryKvStore::new()));
        assert!(ws.identity().is_none());
        assert!(matches!(ws.records(), Err(AuthError::NotSignedIn)));
    }

    #[test]
    fn switching_identity_swaps_the_collection() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
        let mut ws = Workspace::open(kv);

        ws.sign_in(Identity::new("x@acme.com", "X")).unwrap();
        ws.records_mut().unwrap().insert_front(record("X Corp")).unwrap();
        ws.records_mut().unwrap().insert_front(record("X Two")).unwrap();
        assert_eq!(ws.records().unwrap().len(), 2);

        ws.sign_in(Identity::new("y@acme.com", "Y")).unwrap();
        assert!(ws.records().unwrap().is_empty());

        ws.sign_in(Identity::new("x@acme.com", "X")).unwrap();
        assert_eq!(ws.records().unwrap().len(), 2);
    }

    #[test]
    fn session_is_restored_on_open() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
        {
            let mut ws = Workspace::open(kv.clone());
            ws.sign_in(Identity::new("x@acme.com", "X")).unwrap();
            ws.records_mut().unwrap().insert_front(record("X Corp")).unwrap();
        }
        let ws = Workspace::open(kv);
        assert_eq!(ws.identity().map(|i| i.email.as_str()), Some("x@acme.com"));
        assert_eq!(ws.records().unwrap().len(), 1);
    }

    #[test]
    fn sign_out_keeps_records_for_next_time() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKvStore::new());
        let mut ws = Workspace::open(kv.clone());
        ws.sign_in(Identity::new("x@acme.com", "X")).unwrap();
        ws.records_mut().unwrap().insert_front(record("X Corp")).unwrap();

        let previous = ws.sign_out().unwrap();
        assert_eq!(previous.map(|i| i.email), Some("x@acme.com".to_string()));
        assert!(ws.identity().is_none());
        assert!(Workspace::open(kv.clone()).identity().is_none());

        ws.sign_in(Identity::new("x@acme.com", "X")).unwrap();
        assert_eq!(ws.records().unwrap().len(), 1);
    }
}
