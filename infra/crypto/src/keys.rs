//! Outer key handling and the per-save key schedule.
//!
//! The vault file carries a single oracle-wrapped 32-byte [`OuterKey`]. Separate
//! encryption and authentication subkeys are expanded from it with HKDF-SHA256, so the
//! CBC envelope and the HMAC tag never share a key.

use crate::envelope::KEY_LEN;
use crate::error::CryptoError;
use crate::random::fill_random;
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

const HKDF_SALT: &[u8] = b"tzpass.vault.v1";
const INFO_ENCRYPTION: &[u8] = b"tzpw:outer:enc";
const INFO_AUTHENTICATION: &[u8] = b"tzpw:outer:mac";

/// The 32-byte secret wrapped by the device and stored in the vault header.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OuterKey([u8; KEY_LEN]);

impl OuterKey {
    /// Draws a fresh key from the system RNG.
    ///
    /// # Errors
    /// Returns [`CryptoError::Random`] if the system RNG is unavailable.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut key = [0u8; KEY_LEN];
        fill_random(&mut key)?;
        Ok(Self(key))
    }

    /// Copies key material out of an unwrapped oracle response.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKeyLength`] unless `bytes` is exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: bytes.len(),
            context: Some("outer key".into()),
        })?;
        Ok(Self(key))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for OuterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OuterKey(..)")
    }
}

/// Subkeys used for one save or one load.
///
/// Wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    outer: OuterKey,
    encryption: [u8; KEY_LEN],
    authentication: [u8; KEY_LEN],
}

impl SessionKeys {
    /// Generates a fresh outer key and expands its subkeys.
    ///
    /// # Errors
    /// * [`CryptoError::Random`] if the system RNG is unavailable.
    /// * [`CryptoError::KeyDerivation`] if HKDF expansion fails.
    pub fn generate() -> Result<Self, CryptoError> {
        Self::derive(OuterKey::generate()?)
    }

    /// Expands the encryption and authentication subkeys of `outer`.
    ///
    /// # Errors
    /// Returns [`CryptoError::KeyDerivation`] if HKDF expansion fails.
    pub fn derive(outer: OuterKey) -> Result<Self, CryptoError> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), outer.as_bytes());
        let mut encryption = [0u8; KEY_LEN];
        let mut authentication = [0u8; KEY_LEN];

        hk.expand(INFO_ENCRYPTION, &mut encryption).map_err(|_| CryptoError::KeyDerivation {
            message: "HKDF expansion failed for encryption key".into(),
            context: None,
        })?;
        hk.expand(INFO_AUTHENTICATION, &mut authentication).map_err(|_| {
            CryptoError::KeyDerivation {
                message: "HKDF expansion failed for authentication key".into(),
                context: None,
            }
        })?;

        Ok(Self { outer, encryption, authentication })
    }

    #[must_use]
    pub const fn outer(&self) -> &OuterKey {
        &self.outer
    }

    /// Key of the AES-256-CBC envelope.
    #[must_use]
    pub const fn encryption_key(&self) -> &[u8; KEY_LEN] {
        &self.encryption
    }

    /// Key of the HMAC-SHA256 tag.
    #[must_use]
    pub const fn authentication_key(&self) -> &[u8; KEY_LEN] {
        &self.authentication
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}
