//! Symmetric building blocks of the tzpass vault file.
//!
//! ## Outer Envelope
//!
//! The vault body is protected by AES-256-CBC plus an HMAC-SHA256 tag computed over the
//! ciphertext:
//!
//! ```text
//! body = CBC(enc_key, iv, pad(plaintext))
//! tag  = HMAC(mac_key, body)
//! ```
//!
//! `enc_key` and `mac_key` are expanded from one 32-byte [`OuterKey`] by
//! [`SessionKeys::derive`]. Only the outer key itself ever leaves the process, wrapped by the
//! hardware oracle.
//!
//! ## Examples
//!
//! ```rust
//! use tzpass_crypto::prelude::*;
//!
//! # fn main() -> Result<(), CryptoError> {
//! let keys = SessionKeys::generate()?;
//! let iv = random_array::<IV_LEN>()?;
//!
//! let body = encrypt(b"groups", &iv, keys.encryption_key())?;
//! let tag = tag::compute(keys.authentication_key(), &body)?;
//!
//! assert!(tag::verify(keys.authentication_key(), &body, &tag)?);
//! assert_eq!(decrypt(&body, &iv, keys.encryption_key())?.as_slice(), b"groups");
//! # Ok(())
//! # }
//! ```

pub mod envelope;
mod error;
pub mod keys;
pub mod padding;
mod random;
pub mod tag;

pub use envelope::{IV_LEN, KEY_LEN, decrypt, decrypt_blocks, encrypt, encrypt_blocks};
pub use error::{CryptoError, CryptoErrorExt};
pub use keys::{OuterKey, SessionKeys};
pub use padding::{BLOCK_SIZE, pad, unpad};
pub use random::{fill_random, random_array};
pub use tag::TAG_LEN;

pub mod prelude {
    pub use crate::envelope::{IV_LEN, KEY_LEN, decrypt, encrypt};
    pub use crate::error::{CryptoError, CryptoErrorExt};
    pub use crate::keys::{OuterKey, SessionKeys};
    pub use crate::random::random_array;
    pub use crate::tag::{self, TAG_LEN};
}
