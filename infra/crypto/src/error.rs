//! # Crypto Errors
//!
//! This module defines the [`CryptoError`] enum used by the padding codec, the symmetric
//! envelope and the key schedule.

use std::borrow::Cow;

/// A specialized [`CryptoError`] enum for symmetric primitive failures.
#[tzpass_derive::tzpass_error]
pub enum CryptoError {
    /// Malformed input: bad padding, or a ciphertext that is not a whole number of blocks.
    #[error("Format error{}: {message}", format_context(.context))]
    Format { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Cipher key of the wrong size.
    #[error("Invalid key length{}: expected {expected} bytes, got {actual}", format_context(.context))]
    InvalidKeyLength { expected: usize, actual: usize, context: Option<Cow<'static, str>> },

    /// Initialization vector of the wrong size.
    #[error("Invalid IV length{}: expected {expected} bytes, got {actual}", format_context(.context))]
    InvalidIvLength { expected: usize, actual: usize, context: Option<Cow<'static, str>> },

    /// The operating system RNG could not be read.
    #[error("Random generator failure{}: {message}", format_context(.context))]
    Random { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// HKDF expansion failed.
    #[error("Key derivation failure{}: {message}", format_context(.context))]
    KeyDerivation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal crypto error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
