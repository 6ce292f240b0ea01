//! Message encryption between two X25519 key holders.
//!
//! Box construction:
//!
//! ```text
//! shared = X25519(own_private, peer_public)
//! key    = HKDF-SHA256(ikm = shared, info = "sct-box-v1" || sender_pub || receiver_pub)
//! ct     = XChaCha20-Poly1305(key, nonce24, plaintext, aad = ALG_TAG)
//! ```
//!
//! Both sides derive the same key: the sender uses (own, receiver) and the
//! receiver uses (expected sender, own). The nonce is 24 fresh random bytes
//! per call and is carried in the packet.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::codec::{constant_time_compare, from_base64, random_bytes, to_base64};
use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey, KEY_LEN};
use crate::packet::{EncryptedPacket, ALG_TAG, NONCE_LEN};

const BOX_INFO: &[u8] = b"sct-box-v1";

/// Plaintext recovered by `MessageCrypto::decrypt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedMessage {
    pub message: String,
    /// The caller-supplied sender key, base64.
    #[serde(rename = "senderPub")]
    pub sender_pub: String,
}

/// Encrypts and decrypts messages under one local key pair.
///
/// Holds no mutable state; a single instance can serve concurrent callers.
#[derive(Debug)]
pub struct MessageCrypto {
    keys: KeyPair,
}

impl MessageCrypto {
    /// New instance with a freshly generated key pair.
    pub fn generate() -> Self {
        Self {
            keys: KeyPair::generate(),
        }
    }

    pub fn from_key_pair(keys: KeyPair) -> Self {
        Self { keys }
    }

    /// Restore from a raw 32-byte private key.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, CryptoError> {
        KeyPair::from_private_key(private_key).map(Self::from_key_pair)
    }

    /// Restore from a base64 private key as returned by `private_key_base64`.
    pub fn from_private_key_base64(private_key: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            from_base64(private_key).map_err(|e| CryptoError::InvalidKeyMaterial(e.to_string()))?,
        );
        Self::from_private_key(&bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    /// Public key, base64. Safe to display and share.
    pub fn public_key_base64(&self) -> String {
        self.keys.public_key().to_base64()
    }

    /// Private key, base64. Only for wrap/persist flows; never log it.
    pub fn private_key_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(to_base64(self.keys.private_key_bytes().as_slice()))
    }

    /// Encrypt `message` for `receiver` and return the transport string.
    pub fn encrypt(&self, message: &str, receiver: &PublicKey) -> Result<String, CryptoError> {
        self.encrypt_packet(message, receiver)?.to_transport()
    }

    /// Encrypt `message` for `receiver` and return the packet structure.
    pub fn encrypt_packet(
        &self,
        message: &str,
        receiver: &PublicKey,
    ) -> Result<EncryptedPacket, CryptoError> {
        let nonce: [u8; NONCE_LEN] = random_bytes().map_err(|_| CryptoError::EncryptionFailed)?;

        let sender = self.keys.public_key();
        let shared = self
            .keys
            .diffie_hellman(receiver)
            .ok_or(CryptoError::EncryptionFailed)?;
        let key = box_key(&shared, &sender, receiver).ok_or(CryptoError::EncryptionFailed)?;

        let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
        let ct = cipher
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: message.as_bytes(),
                    aad: ALG_TAG.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;

        tracing::debug!(receiver = %receiver, ct_len = ct.len(), "encrypted message");

        Ok(EncryptedPacket::new(&sender, &nonce, &ct))
    }

    /// Decrypt a transport string from `expected_sender`.
    ///
    /// The packet's `epk` and `senderPub` must both name `expected_sender`;
    /// trust in that key is established out-of-band (the contact book).
    pub fn decrypt(
        &self,
        packet: &str,
        expected_sender: &PublicKey,
    ) -> Result<DecryptedMessage, CryptoError> {
        let packet = EncryptedPacket::from_transport(packet)?;
        self.decrypt_packet(&packet, expected_sender)
    }

    /// Decrypt an already parsed packet from `expected_sender`.
    pub fn decrypt_packet(
        &self,
        packet: &EncryptedPacket,
        expected_sender: &PublicKey,
    ) -> Result<DecryptedMessage, CryptoError> {
        let parts = packet.parts()?;

        let epk_ok = constant_time_compare(parts.epk.as_bytes(), expected_sender.as_bytes());
        let sender_ok =
            constant_time_compare(parts.sender_pub.as_bytes(), expected_sender.as_bytes());
        if !(epk_ok & sender_ok) {
            return Err(CryptoError::DecryptionFailed);
        }

        let receiver = self.keys.public_key();
        let shared = self
            .keys
            .diffie_hellman(expected_sender)
            .ok_or(CryptoError::DecryptionFailed)?;
        let key =
            box_key(&shared, expected_sender, &receiver).ok_or(CryptoError::DecryptionFailed)?;

        let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(
                    XNonce::from_slice(&parts.nonce),
                    Payload {
                        msg: &parts.ct,
                        aad: ALG_TAG.as_bytes(),
                    },
                )
                .map_err(|_| CryptoError::DecryptionFailed)?,
        );

        let message = String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::DecodeFailed)?;

        tracing::debug!(sender = %expected_sender, "decrypted message");

        Ok(DecryptedMessage {
            message,
            sender_pub: expected_sender.to_base64(),
        })
    }
}

fn box_key(
    shared: &[u8; KEY_LEN],
    sender: &PublicKey,
    receiver: &PublicKey,
) -> Option<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(None, shared);

    let mut info = Vec::with_capacity(BOX_INFO.len() + 2 * KEY_LEN);
    info.extend_from_slice(BOX_INFO);
    info.extend_from_slice(sender.as_bytes());
    info.extend_from_slice(receiver.as_bytes());

    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(&info, &mut key[..]).ok()?;
    Some(key)
}
