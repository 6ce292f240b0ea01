//! Password-wrapped secrets for at-rest storage.
//!
//! `seal_secret` derives a wrapping key from the password and a fresh salt,
//! then encrypts the secret with XChaCha20-Poly1305 under a fresh nonce.
//! The resulting `KeyEnvelope` keeps the `{salt, nonce, encrypted}` shape,
//! each field base64-encoded.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::codec::{decode_fixed, from_base64, random_bytes, to_base64};
use crate::error::EnvelopeError;
use crate::kdf::{derive_wrapping_key, KdfParams, SALT_LEN};
use crate::packet::{NONCE_LEN, TAG_LEN};

/// Persisted wrapped-key record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEnvelope {
    /// base64, 16 bytes
    pub salt: String,
    /// base64, 24 bytes
    pub nonce: String,
    /// base64 ciphertext with appended tag
    pub encrypted: String,
}

impl KeyEnvelope {
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(json).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }
}

/// Wrap `secret` under `password`.
pub fn seal_secret(
    secret: &[u8],
    password: &str,
    params: &KdfParams,
) -> Result<KeyEnvelope, EnvelopeError> {
    let salt: [u8; SALT_LEN] = random_bytes().map_err(|_| EnvelopeError::EncryptionFailed)?;
    let nonce: [u8; NONCE_LEN] = random_bytes().map_err(|_| EnvelopeError::EncryptionFailed)?;

    let key = derive_wrapping_key(password, &salt, params)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let encrypted = cipher
        .encrypt(XNonce::from_slice(&nonce), secret)
        .map_err(|_| EnvelopeError::EncryptionFailed)?;

    Ok(KeyEnvelope {
        salt: to_base64(&salt),
        nonce: to_base64(&nonce),
        encrypted: to_base64(&encrypted),
    })
}

/// Recover the secret from `envelope` with `password`.
///
/// A wrong password and a tampered envelope are indistinguishable.
pub fn open_secret(
    envelope: &KeyEnvelope,
    password: &str,
    params: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
    let salt = decode_fixed::<SALT_LEN>(&envelope.salt)
        .map_err(|e| EnvelopeError::Malformed(format!("salt: {e}")))?;
    let nonce = decode_fixed::<NONCE_LEN>(&envelope.nonce)
        .map_err(|e| EnvelopeError::Malformed(format!("nonce: {e}")))?;
    let encrypted = from_base64(&envelope.encrypted)
        .map_err(|e| EnvelopeError::Malformed(format!("encrypted: {e}")))?;
    if encrypted.len() < TAG_LEN {
        return Err(EnvelopeError::Malformed(
            "encrypted: shorter than the authentication tag".to_string(),
        ));
    }

    let key = derive_wrapping_key(password, &salt, params)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    cipher
        .decrypt(XNonce::from_slice(&nonce), encrypted.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| EnvelopeError::WrongPasswordOrTampered)
}
