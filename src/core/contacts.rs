//! Emergency contact directory backed by the secret store

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::clock::Clock;
use crate::core::store::{CredentialStore, StoreError};
use crate::types::{decode_record, encode_record, Contact, NewContact, RecordError};
use crate::CONTACTS_KEY;

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("invalid contact: {0}")]
    InvalidInput(&'static str),

    #[error("contact not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unreadable contact list: {0}")]
    Record(#[from] RecordError),
}

/// Ordered contact list; append and remove only
pub struct ContactDirectory {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    /// Held across read-modify-write of the list
    lock: Mutex<()>,
}

impl ContactDirectory {
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            lock: Mutex::new(()),
        }
    }

    /// All contacts in insertion order
    pub async fn list(&self) -> Result<Vec<Contact>, ContactError> {
        let contacts: Vec<Contact> = match self.store.get(CONTACTS_KEY).await? {
            Some(raw) => decode_record(&raw)?,
            None => Vec::new(),
        };
        tracing::debug!(count = contacts.len(), "contacts loaded");
        Ok(contacts)
    }

    /// First contact added; the single target of one-recipient flows
    pub async fn primary(&self) -> Result<Option<Contact>, ContactError> {
        Ok(self.list().await?.into_iter().next())
    }

    /// Contacts opted into intruder alerts, in insertion order
    pub async fn intruder_recipients(&self) -> Result<Vec<Contact>, ContactError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(Contact::receives_intruder_alert)
            .collect())
    }

    /// Append a contact
    pub async fn add(
        &self,
        person: NewContact,
        receive_intruder_alert: bool,
    ) -> Result<Contact, ContactError> {
        let name = person.name.trim();
        let phone = person.phone.trim();
        if name.is_empty() {
            return Err(ContactError::InvalidInput("name is required"));
        }
        if phone.is_empty() {
            return Err(ContactError::InvalidInput("phone is required"));
        }

        let _guard = self.lock.lock().await;
        let mut contacts = self.list().await?;
        let now = self.clock.now();

        // Two adds within one millisecond must still get distinct ids
        let base = format!("contact_{}", now.timestamp_millis());
        let mut id = base.clone();
        let mut n = 1;
        while contacts.iter().any(|c| c.id == id) {
            id = format!("{}_{}", base, n);
            n += 1;
        }

        let contact = Contact {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
            added_at: now,
            receive_intruder_alert,
        };
        contacts.push(contact.clone());
        self.store.set(CONTACTS_KEY, &encode_record(&contacts)?).await?;

        tracing::info!(contact_id = %contact.id, name = %contact.name, "contact saved");
        Ok(contact)
    }

    /// Remove by id
    pub async fn remove(&self, contact_id: &str) -> Result<(), ContactError> {
        let _guard = self.lock.lock().await;
        let contacts = self.list().await?;
        let before = contacts.len();
        let remaining: Vec<Contact> =
            contacts.into_iter().filter(|c| c.id != contact_id).collect();
        if remaining.len() == before {
            return Err(ContactError::NotFound(contact_id.to_string()));
        }

        self.store.set(CONTACTS_KEY, &encode_record(&remaining)?).await?;
        tracing::info!(contact_id, "contact removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Store that yields to the scheduler on every call
    struct YieldingStore(MemoryStore);

    #[async_trait]
    impl CredentialStore for YieldingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            tokio::task::yield_now().await;
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.delete(key).await
        }
    }

    fn directory(store: Arc<MemoryStore>) -> ContactDirectory {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap(),
        ));
        ContactDirectory::new(store, clock)
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = directory(Arc::new(MemoryStore::new()));
        assert!(dir.list().await.unwrap().is_empty());
        assert!(dir.primary().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_keeps_insertion_order_and_unique_ids() {
        let dir = directory(Arc::new(MemoryStore::new()));
        let a = dir.add(NewContact::new(" Ana ", " 51 1111 "), true).await.unwrap();
        let b = dir.add(NewContact::new("Bia", "51 2222"), false).await.unwrap();

        assert_eq!(a.name, "Ana");
        assert_eq!(a.phone, "51 1111");
        assert_ne!(a.id, b.id);

        let all = dir.list().await.unwrap();
        assert_eq!(all.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["Ana", "Bia"]);
        assert_eq!(dir.primary().await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_concurrent_adds_keep_both_contacts() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap(),
        ));
        let dir = ContactDirectory::new(Arc::new(YieldingStore(MemoryStore::new())), clock);

        let (a, b) = tokio::join!(
            dir.add(NewContact::new("Ana", "1"), true),
            dir.add(NewContact::new("Bia", "2"), true)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.id, b.id);

        let all = dir.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|c| c.id == a.id));
        assert!(all.iter().any(|c| c.id == b.id));
    }

    #[tokio::test]
    async fn test_concurrent_add_and_remove() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap(),
        ));
        let dir = ContactDirectory::new(Arc::new(YieldingStore(MemoryStore::new())), clock);
        let ana = dir.add(NewContact::new("Ana", "1"), true).await.unwrap();

        let (removed, added) = tokio::join!(
            dir.remove(&ana.id),
            dir.add(NewContact::new("Bia", "2"), true)
        );
        removed.unwrap();
        let bia = added.unwrap();

        let all = dir.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, bia.id);
    }

    #[tokio::test]
    async fn test_intruder_recipients_filter() {
        let dir = directory(Arc::new(MemoryStore::new()));
        dir.add(NewContact::new("Ana", "1"), false).await.unwrap();
        let bia = dir.add(NewContact::new("Bia", "2"), true).await.unwrap();

        let recipients = dir.intruder_recipients().await.unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].id, bia.id);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = directory(Arc::new(MemoryStore::new()));
        let a = dir.add(NewContact::new("Ana", "1"), true).await.unwrap();
        dir.add(NewContact::new("Bia", "2"), true).await.unwrap();

        dir.remove(&a.id).await.unwrap();
        assert_eq!(dir.list().await.unwrap().len(), 1);
        assert!(matches!(dir.remove(&a.id).await, Err(ContactError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let dir = directory(Arc::new(MemoryStore::new()));
        assert!(matches!(
            dir.add(NewContact::new("Ana", "   "), true).await,
            Err(ContactError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_legacy_records() {
        let store = Arc::new(MemoryStore::with_entries([(
            CONTACTS_KEY,
            r#"[{"id":"contact_1","name":"Mãe","phone":"51985330121","addedAt":"2023-11-01T10:00:00.000Z"}]"#,
        )]));
        let dir = directory(store);
        let recipients = dir.intruder_recipients().await.unwrap();
        assert_eq!(recipients.len(), 1);
    }
}
