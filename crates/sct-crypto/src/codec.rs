//! Byte encoding helpers shared by the packet and envelope formats.
//!
//! All textual byte fields use standard base64 with padding, so packets stay
//! readable by any `btoa`/`atob`-style decoder on the other end.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use constant_time_eq::constant_time_eq;

/// Length-or-alphabet failure while decoding a base64 field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// Encode bytes as padded standard base64.
pub fn to_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode padded standard base64.
pub fn from_base64(text: &str) -> Result<Vec<u8>, CodecError> {
    BASE64
        .decode(text.trim())
        .map_err(|e| CodecError::InvalidBase64(e.to_string()))
}

/// Decode base64 into an exact-size array.
///
/// ```rust
/// use sct_crypto::codec::{decode_fixed, to_base64};
///
/// let encoded = to_base64(&[7u8; 24]);
/// let nonce: [u8; 24] = decode_fixed(&encoded).unwrap();
/// assert_eq!(nonce, [7u8; 24]);
/// assert!(decode_fixed::<32>(&encoded).is_err());
/// ```
pub fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], CodecError> {
    let bytes = from_base64(text)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::InvalidLength {
            expected: N,
            got: bytes.len(),
        })
}

/// Compare two byte slices in constant time.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq(a, b)
}

/// Fill a fixed-size array from the OS CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], getrandom::Error> {
    let mut out = [0u8; N];
    getrandom::getrandom(&mut out)?;
    Ok(out)
}
