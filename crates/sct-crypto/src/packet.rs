//! Wire format for encrypted messages.
//!
//! A packet travels as base64 of its UTF-8 JSON serialization. The JSON object
//! has exactly six fields in any order; unknown or missing fields are
//! rejected.

use serde::{Deserialize, Serialize};

use crate::codec::{decode_fixed, from_base64, to_base64};
use crate::error::CryptoError;
use crate::keys::{PublicKey, KEY_LEN};

/// Algorithm tag naming the primitives actually used by `MessageCrypto`.
pub const ALG_TAG: &str = "X25519-HKDF-SHA256+XChaCha20-Poly1305";

/// XChaCha20 nonce length.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Self-describing encrypted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptedPacket {
    /// Informational algorithm tag.
    pub alg: String,
    /// Sender public key used for the key agreement (base64).
    pub epk: String,
    /// Per-message nonce (base64, 24 bytes).
    pub nonce: String,
    /// Ciphertext with appended tag (base64).
    pub ct: String,
    /// Reserved. Always empty; a non-empty value is rejected on decode.
    pub sig: String,
    /// Sender public key (base64), duplicate of `epk`.
    #[serde(rename = "senderPub")]
    pub sender_pub: String,
}

/// Binary fields of a packet after structural validation.
#[derive(Debug, Clone)]
pub(crate) struct PacketParts {
    pub epk: PublicKey,
    pub sender_pub: PublicKey,
    pub nonce: [u8; NONCE_LEN],
    pub ct: Vec<u8>,
}

impl EncryptedPacket {
    pub(crate) fn new(sender: &PublicKey, nonce: &[u8; NONCE_LEN], ct: &[u8]) -> Self {
        Self {
            alg: ALG_TAG.to_string(),
            epk: sender.to_base64(),
            nonce: to_base64(nonce),
            ct: to_base64(ct),
            sig: String::new(),
            sender_pub: sender.to_base64(),
        }
    }

    /// JSON → UTF-8 → base64.
    pub fn to_transport(&self) -> Result<String, CryptoError> {
        let json = serde_json::to_vec(self).map_err(|_| CryptoError::EncryptionFailed)?;
        Ok(to_base64(&json))
    }

    /// base64 → UTF-8 → JSON.
    pub fn from_transport(text: &str) -> Result<Self, CryptoError> {
        let raw = from_base64(text).map_err(|e| malformed("packet", e))?;
        let json = std::str::from_utf8(&raw).map_err(|e| malformed("packet", e))?;
        serde_json::from_str(json).map_err(|e| malformed("packet", e))
    }

    /// Decode and length-check every binary field.
    pub(crate) fn parts(&self) -> Result<PacketParts, CryptoError> {
        if !self.sig.is_empty() {
            return Err(CryptoError::PacketMalformed(
                "sig is reserved and must be empty".to_string(),
            ));
        }
        if self.alg != ALG_TAG {
            tracing::debug!(alg = %self.alg, "packet carries unexpected algorithm tag");
        }

        let epk = decode_fixed::<KEY_LEN>(&self.epk).map_err(|e| malformed("epk", e))?;
        let sender_pub =
            decode_fixed::<KEY_LEN>(&self.sender_pub).map_err(|e| malformed("senderPub", e))?;
        let nonce = decode_fixed::<NONCE_LEN>(&self.nonce).map_err(|e| malformed("nonce", e))?;
        let ct = from_base64(&self.ct).map_err(|e| malformed("ct", e))?;
        if ct.len() < TAG_LEN {
            return Err(CryptoError::PacketMalformed(format!(
                "ct: shorter than the {TAG_LEN}-byte tag"
            )));
        }

        Ok(PacketParts {
            epk: PublicKey::from_bytes(epk),
            sender_pub: PublicKey::from_bytes(sender_pub),
            nonce,
            ct,
        })
    }
}

fn malformed(field: &str, err: impl std::fmt::Display) -> CryptoError {
    CryptoError::PacketMalformed(format!("{field}: {err}"))
}
