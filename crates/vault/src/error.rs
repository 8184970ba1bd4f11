//! # Vault Errors
//!
//! This module defines the [`VaultError`] enum returned by every vault operation: model
//! edits, password wrapping, file encoding and decoding, and backup handling.

use std::borrow::Cow;
use tzpass_crypto::CryptoError;
use tzpass_oracle::DeviceError;

/// A specialized [`VaultError`] enum for vault-related failures.
#[tzpass_derive::tzpass_error]
pub enum VaultError {
    /// Malformed or truncated file bytes, or a decrypted value with a broken layout.
    #[error("Format error{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The integrity tag did not match.
    ///
    /// Either the file was modified or the outer key came back wrong from the device (another
    /// device, or a failed unwrap). Nothing was decrypted.
    #[error("Integrity check failed{}: {message}", format_context(.context))]
    Integrity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unsupported vault version{}: found {found}, supported {supported}", format_context(.context))]
    UnsupportedVersion { found: u32, supported: u32, context: Option<Cow<'static, str>> },

    #[error("Password group already exists{}: {name}", format_context(.context))]
    DuplicateGroup { name: String, context: Option<Cow<'static, str>> },

    #[error("Password group not found{}: {name}", format_context(.context))]
    GroupNotFound { name: String, context: Option<Cow<'static, str>> },

    #[error("Pair not found{}: index {index} in group {group}", format_context(.context))]
    PairNotFound { group: String, index: usize, context: Option<Cow<'static, str>> },

    /// Backup key material is generated once per vault.
    #[error("Backup key already initialized{}", format_context(.context))]
    BackupExists { context: Option<Cow<'static, str>> },

    #[error("Cryptographic failure{}: {source}", format_context(.context))]
    Crypto { source: CryptoError, context: Option<Cow<'static, str>> },

    /// The key-wrap device refused, timed out or disconnected.
    #[error("Device failure{}: {source}", format_context(.context))]
    Device { source: DeviceError, context: Option<Cow<'static, str>> },

    /// RSA key generation, encoding or OAEP failure.
    #[error("Backup error{}: {message}", format_context(.context))]
    Backup { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during Postcard serialization or deserialization.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: postcard::Error, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal vault error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl VaultError {
    pub(crate) fn format(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Format { message: message.into(), context: None }
    }

    /// `true` when the device reported that the human declined.
    #[must_use]
    pub const fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Device { source: DeviceError::UserRejected { .. }, .. })
    }
}
