//! Password-wrapped private key kept in a single store slot.

use std::sync::Arc;

use sct_crypto::{open_secret, seal_secret, EnvelopeError, KdfParams, KeyEnvelope};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::store::{Store, StoreError, PRIVATE_KEY_SLOT};

/// Errors from vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("no stored key")]
    NotFound,

    /// Covers both a wrong password and a modified envelope.
    #[error("wrong password or tampered envelope")]
    WrongPasswordOrTampered,

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("failed to seal key: {0}")]
    Sealing(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<EnvelopeError> for VaultError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::WrongPasswordOrTampered => VaultError::WrongPasswordOrTampered,
            EnvelopeError::Malformed(reason) => VaultError::Malformed(reason),
            EnvelopeError::KeyDerivation(reason) => VaultError::Sealing(reason),
            EnvelopeError::EncryptionFailed => VaultError::Sealing("encryption failed".to_string()),
        }
    }
}

/// Wraps a secret under a password and persists the envelope in `S`.
pub struct KeyVault<S: Store> {
    store: Arc<S>,
    params: KdfParams,
}

impl<S: Store> KeyVault<S> {
    pub fn new(store: Arc<S>, params: KdfParams) -> Self {
        Self { store, params }
    }

    /// Seal `secret` under `password` and overwrite the stored envelope.
    ///
    /// If sealing fails the store is not touched.
    pub async fn wrap(&self, secret: &[u8], password: &str) -> Result<KeyEnvelope, VaultError> {
        let envelope = seal_secret(secret, password, &self.params)?;
        let json = envelope.to_json().map_err(|e| VaultError::Sealing(e.to_string()))?;
        self.store.set(PRIVATE_KEY_SLOT, json).await?;
        tracing::debug!("private key wrapped and stored");
        Ok(envelope)
    }

    /// Read the stored envelope and open it with `password`.
    pub async fn unwrap(&self, password: &str) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let json = self
            .store
            .get(PRIVATE_KEY_SLOT)
            .await?
            .ok_or(VaultError::NotFound)?;
        let envelope = KeyEnvelope::from_json(&json)?;
        self.unwrap_envelope(&envelope, password)
    }

    /// Open an envelope the caller already holds.
    pub fn unwrap_envelope(
        &self,
        envelope: &KeyEnvelope,
        password: &str,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        match open_secret(envelope, password, &self.params) {
            Ok(secret) => {
                tracing::debug!("private key unwrapped");
                Ok(secret)
            }
            Err(e) => {
                if e == EnvelopeError::WrongPasswordOrTampered {
                    tracing::warn!("failed to unwrap private key");
                }
                Err(e.into())
            }
        }
    }

    /// Erase the stored envelope. Never fails.
    pub async fn clear(&self) {
        if let Err(e) = self.store.remove(PRIVATE_KEY_SLOT).await {
            tracing::warn!(error = %e, "failed to clear stored key");
        }
    }

    pub async fn has_stored_key(&self) -> bool {
        match self.store.get(PRIVATE_KEY_SLOT).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to check for stored key");
                false
            }
        }
    }
}
