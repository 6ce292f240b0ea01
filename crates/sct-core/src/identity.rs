//! Local identity: the key pair in use, backed by the vault.

use std::sync::Arc;

use sct_crypto::{CryptoError, KdfParams, MessageCrypto};
use thiserror::Error;

use crate::store::Store;
use crate::vault::{KeyVault, VaultError};

/// Identity errors
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result of `KeyManager::load_key_pair`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NoStoredKey,
}

/// Owns the active key pair and its wrapped copy.
///
/// The stored secret is the base64 private key as returned by
/// `MessageCrypto::private_key_base64`.
pub struct KeyManager<S: Store> {
    vault: KeyVault<S>,
    crypto: Option<MessageCrypto>,
}

impl<S: Store> KeyManager<S> {
    pub fn new(store: Arc<S>, params: KdfParams) -> Self {
        Self {
            vault: KeyVault::new(store, params),
            crypto: None,
        }
    }

    pub fn vault(&self) -> &KeyVault<S> {
        &self.vault
    }

    /// Unwrap the stored private key and make it the active key pair.
    ///
    /// A missing envelope is not an error. A wrong password is, and leaves
    /// the current key pair untouched.
    pub async fn load_key_pair(&mut self, password: &str) -> Result<LoadOutcome, IdentityError> {
        let secret = match self.vault.unwrap(password).await {
            Ok(secret) => secret,
            Err(VaultError::NotFound) => {
                tracing::info!("no stored key pair");
                return Ok(LoadOutcome::NoStoredKey);
            }
            Err(e) => return Err(e.into()),
        };

        let encoded = std::str::from_utf8(&secret).map_err(|_| {
            CryptoError::InvalidKeyMaterial("stored key is not valid text".to_string())
        })?;
        let crypto = MessageCrypto::from_private_key_base64(encoded)?;

        tracing::info!(public_key = %crypto.public_key(), "key pair loaded");
        self.crypto = Some(crypto);
        Ok(LoadOutcome::Loaded)
    }

    /// Generate a fresh key pair, persist it under `password`, then activate it.
    ///
    /// If persisting fails the previous key pair stays active.
    pub async fn generate_key_pair(&mut self, password: &str) -> Result<(), IdentityError> {
        let crypto = MessageCrypto::generate();
        let secret = crypto.private_key_base64();
        self.vault.wrap(secret.as_bytes(), password).await?;

        tracing::info!(public_key = %crypto.public_key(), "generated new key pair");
        self.crypto = Some(crypto);
        Ok(())
    }

    /// Drop the active key pair and erase the stored envelope.
    pub async fn clear_key_pair(&mut self) {
        self.crypto = None;
        self.vault.clear().await;
        tracing::warn!("key pair cleared");
    }

    pub fn has_key_pair(&self) -> bool {
        self.crypto.is_some()
    }

    pub fn public_key_base64(&self) -> Option<String> {
        self.crypto.as_ref().map(MessageCrypto::public_key_base64)
    }

    pub fn crypto(&self) -> Option<&MessageCrypto> {
        self.crypto.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, PRIVATE_KEY_SLOT};

    fn manager(store: Arc<InMemoryStore>) -> KeyManager<InMemoryStore> {
        KeyManager::new(store, KdfParams::insecure_for_tests())
    }

    #[tokio::test]
    async fn test_load_without_stored_key() {
        let mut keys = manager(InMemoryStore::new_shared());
        assert_eq!(keys.load_key_pair("pw").await.unwrap(), LoadOutcome::NoStoredKey);
        assert!(!keys.has_key_pair());
        assert_eq!(keys.public_key_base64(), None);
    }

    #[tokio::test]
    async fn test_generate_then_load_in_new_session() {
        let store = InMemoryStore::new_shared();

        let mut first = manager(store.clone());
        first.generate_key_pair("pw").await.unwrap();
        let public = first.public_key_base64().unwrap();

        let mut second = manager(store);
        assert_eq!(second.load_key_pair("pw").await.unwrap(), LoadOutcome::Loaded);
        assert_eq!(second.public_key_base64().unwrap(), public);
    }

    #[tokio::test]
    async fn test_wrong_password_keeps_state() {
        let store = InMemoryStore::new_shared();
        manager(store.clone()).generate_key_pair("pw").await.unwrap();

        let mut keys = manager(store);
        let err = keys.load_key_pair("nope").await.unwrap_err();
        assert!(matches!(
            err,
            IdentityError::Vault(VaultError::WrongPasswordOrTampered)
        ));
        assert!(!keys.has_key_pair());
    }

    #[tokio::test]
    async fn test_stored_garbage_key_is_invalid_material() {
        let store = InMemoryStore::new_shared();
        let keys = manager(store.clone());
        keys.vault().wrap(b"not a key", "pw").await.unwrap();

        let mut keys = manager(store);
        assert!(matches!(
            keys.load_key_pair("pw").await,
            Err(IdentityError::Crypto(CryptoError::InvalidKeyMaterial(_)))
        ));
        assert!(!keys.has_key_pair());
    }

    #[tokio::test]
    async fn test_failed_generate_keeps_previous_pair() {
        let store = InMemoryStore::new_shared();
        let mut keys = manager(store.clone());
        keys.generate_key_pair("pw").await.unwrap();
        let before = keys.public_key_base64();

        let mut broken = KeyManager {
            vault: KeyVault::new(
                store,
                KdfParams {
                    memory_kib: 1,
                    iterations: 0,
                    parallelism: 0,
                },
            ),
            crypto: keys.crypto.take(),
        };
        assert!(broken.generate_key_pair("pw").await.is_err());
        assert_eq!(broken.public_key_base64(), before);
    }

    #[tokio::test]
    async fn test_clear_key_pair() {
        let store = InMemoryStore::new_shared();
        let mut keys = manager(store.clone());
        keys.generate_key_pair("pw").await.unwrap();

        keys.clear_key_pair().await;

        assert!(!keys.has_key_pair());
        assert!(store.get(PRIVATE_KEY_SLOT).await.unwrap().is_none());
        assert_eq!(keys.load_key_pair("pw").await.unwrap(), LoadOutcome::NoStoredKey);
    }

    #[tokio::test]
    async fn test_loaded_pair_decrypts_earlier_messages() {
        let store = InMemoryStore::new_shared();
        let peer = MessageCrypto::generate();

        let mut keys = manager(store.clone());
        keys.generate_key_pair("pw").await.unwrap();
        let me = keys.crypto().unwrap().public_key();
        let packet = peer.encrypt("still readable", &me).unwrap();

        let mut reloaded = manager(store);
        reloaded.load_key_pair("pw").await.unwrap();
        let opened = reloaded
            .crypto()
            .unwrap()
            .decrypt(&packet, &peer.public_key())
            .unwrap();
        assert_eq!(opened.message, "still readable");
    }
}
