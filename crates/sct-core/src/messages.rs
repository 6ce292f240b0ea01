//! Message log: encrypted packets kept alongside who sent them and to whom.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::store::{load_list, save_list, Store, StoreError, MESSAGES_SLOT};

const MESSAGE_ID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: String,
    pub sender_public_key: String,
    pub sender_name: String,
    pub receiver_public_key: String,
    /// Transport packet as produced by `MessageCrypto::encrypt`.
    pub encrypted_data: String,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl StoredMessage {
    /// New record with a random id, stamped now.
    pub fn new(
        sender_public_key: impl Into<String>,
        sender_name: impl Into<String>,
        receiver_public_key: impl Into<String>,
        encrypted_data: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let mut id = [0u8; MESSAGE_ID_LEN];
        getrandom::getrandom(&mut id)
            .map_err(|e| StoreError::OperationFailed(format!("failed to generate id: {e}")))?;

        Ok(Self {
            id: hex::encode(id),
            sender_public_key: sender_public_key.into(),
            sender_name: sender_name.into(),
            receiver_public_key: receiver_public_key.into(),
            encrypted_data: encrypted_data.into(),
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}

pub struct MessageLog<S: Store> {
    store: Arc<S>,
}

impl<S: Store> MessageLog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn append(&self, message: StoredMessage) -> Result<(), StoreError> {
        let mut messages: Vec<StoredMessage> =
            load_list(&*self.store, MESSAGES_SLOT).await?;
        messages.push(message);
        save_list(&*self.store, MESSAGES_SLOT, &messages).await
    }

    /// All messages in insertion order.
    pub async fn list(&self) -> Result<Vec<StoredMessage>, StoreError> {
        load_list(&*self.store, MESSAGES_SLOT).await
    }

    /// Remove the message with `id`. Returns whether one was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut messages: Vec<StoredMessage> =
            load_list(&*self.store, MESSAGES_SLOT).await?;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        let removed = messages.len() != before;
        save_list(&*self.store, MESSAGES_SLOT, &messages).await?;
        Ok(removed)
    }
}
