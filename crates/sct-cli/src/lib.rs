//! SCT CLI - end-to-end encrypted messages from the command line
//!
//! This crate provides a command-line interface for:
//! - Generating and unlocking the password-protected key pair
//! - Managing contacts
//! - Encrypting and decrypting message packets
//! - Browsing the local message log

pub mod cli;
pub mod config;
pub mod output;

#[cfg(test)]
mod proptests;

pub use cli::{Cli, CliError};
pub use config::{CliOverrides, Config, ConfigError};
pub use output::{JsonResponse, OutputFormat, OutputFormatter, SuccessMessage};

use clap::error::ErrorKind;
use sct_core::{IdentityError, StoreError, VaultError};
use sct_crypto::CryptoError;

/// Exit codes for CLI operations
///
/// Exit codes provide machine-readable status for scripting and automation:
/// - 0: Success - operation completed successfully
/// - 1: General error - unspecified error occurred
/// - 2: Authentication failed - wrong password or packet failed to decrypt
/// - 5: Invalid input - bad arguments or data provided
/// - 6: Not found - no stored key, unknown contact or message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Authentication failed (exit code 2)
    AuthenticationFailed = 2,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
    /// Requested item does not exist (exit code 6)
    NotFound = 6,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::AuthenticationFailed => "AUTH_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::NotFound => "NOT_FOUND",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::AuthenticationFailed => "Wrong password or message failed to authenticate",
            ExitCode::InvalidInput => "Invalid arguments or data provided",
            ExitCode::NotFound => "Key, contact or message not found",
        }
    }

    /// Exit code for a command line clap refused.
    ///
    /// Help and version requests are not failures; everything else is bad input.
    pub fn from_clap_error(error: &clap::Error) -> Self {
        match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
            _ => ExitCode::InvalidInput,
        }
    }

    /// Pick the exit code for a failed command.
    ///
    /// Walks the error chain and uses the first error with a specific mapping.
    pub fn from_error(error: &anyhow::Error) -> Self {
        error
            .chain()
            .find_map(Self::from_cause)
            .unwrap_or(ExitCode::GeneralError)
    }

    fn from_cause(cause: &(dyn std::error::Error + 'static)) -> Option<Self> {
        if let Some(e) = cause.downcast_ref::<CliError>() {
            return Some(match e {
                CliError::NoKeyPair | CliError::ContactNotFound(_) | CliError::MessageNotFound(_) => {
                    ExitCode::NotFound
                }
                CliError::UnknownPeer(_) | CliError::InvalidInput(_) => ExitCode::InvalidInput,
            });
        }
        if let Some(e) = cause.downcast_ref::<IdentityError>() {
            return match e {
                IdentityError::Vault(v) => Self::from_cause(v),
                IdentityError::Crypto(c) => Self::from_cause(c),
            };
        }
        if let Some(e) = cause.downcast_ref::<VaultError>() {
            return Some(match e {
                VaultError::NotFound => ExitCode::NotFound,
                VaultError::WrongPasswordOrTampered => ExitCode::AuthenticationFailed,
                VaultError::Malformed(_) | VaultError::Sealing(_) | VaultError::Store(_) => {
                    ExitCode::GeneralError
                }
            });
        }
        if let Some(e) = cause.downcast_ref::<CryptoError>() {
            return Some(match e {
                CryptoError::DecryptionFailed => ExitCode::AuthenticationFailed,
                CryptoError::InvalidKeyMaterial(_)
                | CryptoError::PacketMalformed(_)
                | CryptoError::DecodeFailed => ExitCode::InvalidInput,
                CryptoError::EncryptionFailed => ExitCode::GeneralError,
            });
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return Some(ExitCode::InvalidInput);
        }
        if cause.downcast_ref::<StoreError>().is_some() {
            return Some(ExitCode::GeneralError);
        }
        None
    }
}
