//! Error types for message and envelope cryptography.
//!
//! Authentication failures carry no detail: a wrong key, a tampered
//! ciphertext and a wrong password all look the same to the caller.

/// Errors from `MessageCrypto` construction, `encrypt` and `decrypt`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("malformed packet: {0}")]
    PacketMalformed(String),
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("decrypted message is not valid UTF-8")]
    DecodeFailed,
}

/// Errors from sealing and opening password-wrapped key envelopes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("wrong password or tampered envelope")]
    WrongPasswordOrTampered,
}
