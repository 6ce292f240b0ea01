//! SCT Core - key persistence and local records for Secure Chat Tool.
//!
//! This crate implements:
//! - Storage abstraction over string slots (in-memory and file-backed)
//! - Key vault: password-wrapped private key in a single slot
//! - Key manager: load / generate / clear orchestration for the local identity
//! - Contact book and message log

#![forbid(unsafe_code)]

// Infrastructure
pub mod store;
pub mod file_store;

// Services
pub mod vault;
pub mod identity;
pub mod contacts;
pub mod messages;

#[cfg(test)]
mod proptests;

pub use contacts::{Contact, ContactBook};
pub use file_store::FileStore;
pub use identity::{IdentityError, KeyManager, LoadOutcome};
pub use messages::{MessageLog, StoredMessage};
pub use store::{clear_all_data, InMemoryStore, Store, StoreError};
pub use vault::{KeyVault, VaultError};
