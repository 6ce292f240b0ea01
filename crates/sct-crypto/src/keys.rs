//! X25519 key pairs and public keys.
//!
//! The private scalar lives in an `x25519_dalek::StaticSecret`, which is
//! zeroized when the owning `KeyPair` is dropped.

use std::fmt;

use rand_core::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::codec::{from_base64, to_base64};
use crate::error::CryptoError;

/// Length of X25519 public and private keys.
pub const KEY_LEN: usize = 32;

/// A 32-byte X25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a public key from a slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyMaterial(format!(
                "public key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Parse a base64-encoded public key as shared between users.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        let bytes =
            from_base64(text).map_err(|e| CryptoError::InvalidKeyMaterial(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        to_base64(&self.0)
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// An X25519 key pair. Immutable once built.
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self::from_secret(secret)
    }

    /// Rebuild a key pair from a stored 32-byte private key.
    ///
    /// The public key is derived deterministically from the scalar.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, CryptoError> {
        let bytes: Zeroizing<[u8; KEY_LEN]> =
            Zeroizing::new(private_key.try_into().map_err(|_| {
                CryptoError::InvalidKeyMaterial(format!(
                    "private key must be {KEY_LEN} bytes, got {}",
                    private_key.len()
                ))
            })?);
        Ok(Self::from_secret(StaticSecret::from(*bytes)))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Raw private scalar. Only for wrap/persist flows.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// X25519 agreement with a peer.
    ///
    /// Returns `None` for a non-contributory result (peer sent a low-order
    /// point), which would otherwise yield a predictable all-zero secret.
    pub(crate) fn diffie_hellman(&self, peer: &PublicKey) -> Option<Zeroizing<[u8; KEY_LEN]>> {
        let shared = self.secret.diffie_hellman(&peer.to_x25519());
        if !shared.was_contributory() {
            return None;
        }
        Some(Zeroizing::new(shared.to_bytes()))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}
