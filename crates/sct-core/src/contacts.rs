//! Contact book: named public keys, unique by key.

use std::sync::Arc;

use sct_crypto::PublicKey;
use serde::{Deserialize, Serialize};

use crate::store::{load_list, save_list, Store, StoreError, CONTACTS_SLOT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    /// base64, 32 bytes
    pub public_key: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, public_key: &PublicKey) -> Self {
        Self {
            name: name.into(),
            public_key: public_key.to_base64(),
        }
    }
}

pub struct ContactBook<S: Store> {
    store: Arc<S>,
}

impl<S: Store> ContactBook<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Insert `contact`, replacing any entry with the same public key.
    pub async fn save(&self, contact: Contact) -> Result<(), StoreError> {
        let mut contacts: Vec<Contact> = load_list(&*self.store, CONTACTS_SLOT).await?;
        match contacts.iter_mut().find(|c| c.public_key == contact.public_key) {
            Some(existing) => *existing = contact,
            None => contacts.push(contact),
        }
        save_list(&*self.store, CONTACTS_SLOT, &contacts).await
    }

    pub async fn list(&self) -> Result<Vec<Contact>, StoreError> {
        load_list(&*self.store, CONTACTS_SLOT).await
    }

    /// First contact named `name`.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Contact>, StoreError> {
        Ok(self.list().await?.into_iter().find(|c| c.name == name))
    }

    /// Remove the contact with `public_key`. Returns whether one was removed.
    pub async fn delete(&self, public_key: &str) -> Result<bool, StoreError> {
        let mut contacts: Vec<Contact> = load_list(&*self.store, CONTACTS_SLOT).await?;
        let before = contacts.len();
        contacts.retain(|c| c.public_key != public_key);
        let removed = contacts.len() != before;
        save_list(&*self.store, CONTACTS_SLOT, &contacts).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use sct_crypto::MessageCrypto;

    fn book() -> (Arc<InMemoryStore>, ContactBook<InMemoryStore>) {
        let store = InMemoryStore::new_shared();
        (store.clone(), ContactBook::new(store))
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let (_, book) = book();
        let alice = MessageCrypto::generate().public_key();
        let bob = MessageCrypto::generate().public_key();

        book.save(Contact::new("alice", &alice)).await.unwrap();
        book.save(Contact::new("bob", &bob)).await.unwrap();

        let contacts = book.list().await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "alice");
        assert_eq!(contacts[1].public_key, bob.to_base64());
    }

    #[tokio::test]
    async fn test_save_upserts_by_public_key() {
        let (_, book) = book();
        let key = MessageCrypto::generate().public_key();

        book.save(Contact::new("old name", &key)).await.unwrap();
        book.save(Contact::new("new name", &key)).await.unwrap();

        let contacts = book.list().await.unwrap();
        assert_eq!(contacts, vec![Contact::new("new name", &key)]);
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let (_, book) = book();
        let key = MessageCrypto::generate().public_key();
        book.save(Contact::new("carol", &key)).await.unwrap();

        assert_eq!(
            book.find_by_name("carol").await.unwrap().map(|c| c.public_key),
            Some(key.to_base64())
        );
        assert_eq!(book.find_by_name("dave").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_, book) = book();
        let key = MessageCrypto::generate().public_key();
        book.save(Contact::new("erin", &key)).await.unwrap();

        assert!(book.delete(&key.to_base64()).await.unwrap());
        assert!(!book.delete(&key.to_base64()).await.unwrap());
        assert!(book.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_shape() {
        let (store, book) = book();
        let key = MessageCrypto::generate().public_key();
        book.save(Contact::new("frank", &key)).await.unwrap();

        let raw = store.get(CONTACTS_SLOT).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["name"], "frank");
        assert_eq!(value[0]["publicKey"], key.to_base64());
    }

    #[tokio::test]
    async fn test_corrupt_slot() {
        let (store, book) = book();
        store.set(CONTACTS_SLOT, "{oops".to_string()).await.unwrap();
        assert!(matches!(
            book.list().await,
            Err(StoreError::DataCorruption { .. })
        ));
    }
}
