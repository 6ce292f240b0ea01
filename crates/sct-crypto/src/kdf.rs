//! Password → wrapping key derivation.
//!
//! Argon2id seeded with the per-envelope salt. Parameters are not stored in
//! the envelope, so sealing and opening must use the same `KdfParams`.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::EnvelopeError;

/// Wrapping key length (XChaCha20-Poly1305 key).
pub const WRAP_KEY_LEN: usize = 32;

/// Salt length stored in every envelope.
pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// Argon2id defaults: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// Cheap parameters for tests. Never use for real keys.
    pub fn insecure_for_tests() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Check that Argon2 accepts these parameters.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        self.argon2_params().map(|_| ())
    }

    fn argon2_params(&self) -> Result<Params, EnvelopeError> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(WRAP_KEY_LEN),
        )
        .map_err(|e| EnvelopeError::KeyDerivation(e.to_string()))
    }
}

/// Derive the 32-byte wrapping key for `password` and `salt`.
pub fn derive_wrapping_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; WRAP_KEY_LEN]>, EnvelopeError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.argon2_params()?);

    let mut key = Zeroizing::new([0u8; WRAP_KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| EnvelopeError::KeyDerivation(e.to_string()))?;
    Ok(key)
}
