//! Storage abstraction for SCT's persisted slots.
//!
//! Everything SCT persists is a JSON string under a named slot: the wrapped
//! private key, the contact list, the message log. This module defines the
//! `Store` trait and an in-memory implementation for tests and ephemeral use.
//!
//! Stores give no multi-slot transactions. Concurrent writers to the same slot
//! race; the last write wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Prefix shared by every slot SCT writes.
pub const SLOT_PREFIX: &str = "secure_chat_tool_";

/// Slot holding the wrapped private key envelope.
pub const PRIVATE_KEY_SLOT: &str = "secure_chat_tool_private_key";

/// Slot holding the contact list.
pub const CONTACTS_SLOT: &str = "secure_chat_tool_contacts";

/// Slot holding the message log.
pub const MESSAGES_SLOT: &str = "secure_chat_tool_messages";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("storage operation failed: {0}")]
    OperationFailed(String),

    #[error("data corruption detected in {slot}: {reason}")]
    DataCorruption { slot: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// Store Trait
// ============================================================================

/// Key-value storage over named slots.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read a slot.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the slot is set
    /// * `Ok(None)` if it is absent
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a slot wholesale.
    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError>;

    /// Remove a slot. Removing an absent slot succeeds.
    async fn remove(&self, slot: &str) -> Result<(), StoreError>;

    /// Names of all slots currently set.
    async fn slots(&self) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
        (**self).get(slot).await
    }

    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError> {
        (**self).set(slot, value).await
    }

    async fn remove(&self, slot: &str) -> Result<(), StoreError> {
        (**self).remove(slot).await
    }

    async fn slots(&self) -> Result<Vec<String>, StoreError> {
        (**self).slots().await
    }
}

/// Read a JSON list slot; an absent slot is an empty list.
pub(crate) async fn load_list<S, T>(store: &S, slot: &str) -> Result<Vec<T>, StoreError>
where
    S: Store + ?Sized,
    T: DeserializeOwned,
{
    match store.get(slot).await? {
        Some(json) => serde_json::from_str(&json).map_err(|e| StoreError::DataCorruption {
            slot: slot.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(Vec::new()),
    }
}

/// Overwrite a JSON list slot.
pub(crate) async fn save_list<S, T>(store: &S, slot: &str, items: &[T]) -> Result<(), StoreError>
where
    S: Store + ?Sized,
    T: Serialize + Sync,
{
    let json =
        serde_json::to_string(items).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.set(slot, json).await
}

/// Erase every slot under `SLOT_PREFIX`.
///
/// Returns the number of slots removed.
pub async fn clear_all_data<S: Store + ?Sized>(store: &S) -> Result<usize, StoreError> {
    let mut removed = 0;
    for slot in store.slots().await? {
        if slot.starts_with(SLOT_PREFIX) {
            store.remove(&slot).await?;
            removed += 1;
        }
    }
    tracing::info!(removed, "cleared all application data");
    Ok(removed)
}

// ============================================================================
// In-Memory Store Implementation
// ============================================================================

/// Thread-safe in-memory store for tests and ephemeral sessions.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory store wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of slots currently set.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Whether no slot is set.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().await.get(slot).cloned())
    }

    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError> {
        self.slots.write().await.insert(slot.to_string(), value);
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<(), StoreError> {
        self.slots.write().await.remove(slot);
        Ok(())
    }

    async fn slots(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.slots.read().await.keys().cloned().collect())
    }
}
