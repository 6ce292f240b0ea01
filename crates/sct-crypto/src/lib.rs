#![forbid(unsafe_code)]

//! SCT cryptography.
//!
//! - `message`: X25519 box encryption of text messages into self-describing packets
//! - `envelope`: password-wrapped secrets for at-rest storage
//! - `kdf`: Argon2id password key derivation
//! - `codec`: base64 and fixed-length byte helpers shared by both

pub mod codec;
pub mod error;
pub mod keys;
pub mod packet;
pub mod message;

pub mod kdf;
pub mod envelope;

#[cfg(test)]
mod proptests;

pub use envelope::{open_secret, seal_secret, KeyEnvelope};
pub use error::{CryptoError, EnvelopeError};
pub use kdf::KdfParams;
pub use keys::{KeyPair, PublicKey};
pub use message::{DecryptedMessage, MessageCrypto};
pub use packet::EncryptedPacket;
