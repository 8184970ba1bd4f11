//! Offline backup keys.
//!
//! An RSA-2048 key pair is generated once per vault. The private key never touches the disk
//! in the clear:
//!
//! ```text
//! ephemeral          = random[32]
//! wrapped_private    = CBC(ephemeral, iv, pad(pkcs8_der(private)))
//! wrapped_ephemeral  = oracle.wrap(BKUP, "Decrypt backup key?", ephemeral)
//! ```
//!
//! Anything sealed with [`BackupKeyMaterial::seal`] (RSA-OAEP with SHA-256) can later be opened
//! by whoever holds the device, after [`BackupKeyMaterial::recover`] and a button press.

use crate::error::{VaultError, VaultErrorExt};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::rand_core::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use tracing::{debug, info};
use tzpass_crypto::{IV_LEN, KEY_LEN, decrypt, encrypt, fill_random, random_array};
use tzpass_oracle::{KeyWrapOracle, WrapContext};
use zeroize::Zeroizing;

/// RSA modulus size.
pub const RSA_BITS: usize = 2048;

/// Largest plaintext [`BackupKeyMaterial::seal`] accepts: `k - 2 * hLen - 2` for OAEP-SHA-256.
pub const MAX_SEAL_LEN: usize = RSA_BITS / 8 - 2 * 32 - 2;

fn backup_error(context: &'static str) -> impl FnOnce(rsa::Error) -> VaultError {
    move |e| VaultError::Backup { message: e.to_string().into(), context: Some(context.into()) }
}

/// Public half of the backup pair plus the wrapped private half.
///
/// Stored, serialized with postcard, in the backup slot of the vault file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupKeyMaterial {
    public_key: Vec<u8>,
    wrapped_private_key: Vec<u8>,
    wrapped_ephemeral_key: Vec<u8>,
    ephemeral_iv: [u8; IV_LEN],
}

impl BackupKeyMaterial {
    /// Generates a key pair and wraps its private half through `oracle`.
    ///
    /// The wrap itself needs no confirmation; every later unwrap does.
    pub fn generate<O>(oracle: &O) -> Result<Self, VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        debug!(bits = RSA_BITS, "Generating backup key pair");
        let private = RsaPrivateKey::new(&mut OsRng, RSA_BITS)
            .map_err(backup_error("Generating RSA key"))?;

        let public_key = private
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| VaultError::Backup {
                message: e.to_string().into(),
                context: Some("Encoding public key".into()),
            })?
            .as_bytes()
            .to_vec();
        let private_der = private.to_pkcs8_der().map_err(|e| VaultError::Backup {
            message: e.to_string().into(),
            context: Some("Encoding private key".into()),
        })?;

        let mut ephemeral = Zeroizing::new([0u8; KEY_LEN]);
        fill_random(ephemeral.as_mut_slice())?;
        let ephemeral_iv = random_array::<IV_LEN>()?;

        let wrapped_private_key = encrypt(private_der.as_bytes(), &ephemeral_iv, ephemeral.as_slice())?;
        let wrapped_ephemeral_key = oracle
            .wrap(&WrapContext::backup_key(), ephemeral.as_slice())
            .context("Wrapping backup key")?;

        info!(public_key_len = public_key.len(), "Backup key material generated");
        Ok(Self { public_key, wrapped_private_key, wrapped_ephemeral_key, ephemeral_iv })
    }

    /// SPKI DER encoding of the public key.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key
    }

    pub fn public_key(&self) -> Result<RsaPublicKey, VaultError> {
        RsaPublicKey::from_public_key_der(&self.public_key).map_err(|e| VaultError::Backup {
            message: e.to_string().into(),
            context: Some("Decoding public key".into()),
        })
    }

    /// Encrypts `plaintext` to the backup public key with RSA-OAEP (SHA-256).
    ///
    /// # Errors
    /// [`VaultError::Backup`] if `plaintext` exceeds [`MAX_SEAL_LEN`] or the key is corrupt.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        if plaintext.len() > MAX_SEAL_LEN {
            return Err(VaultError::Backup {
                message: format!("{} bytes exceeds the {MAX_SEAL_LEN} byte limit", plaintext.len())
                    .into(),
                context: Some("Sealing to backup key".into()),
            });
        }
        self.public_key()?
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(backup_error("Sealing to backup key"))
    }

    /// Unwraps the ephemeral key on the device and decrypts the private key.
    ///
    /// # Errors
    /// * [`VaultError::Device`] if the device refuses; the human always has to confirm.
    /// * [`VaultError::Backup`] if the private key does not decrypt or parse, which is what
    ///   a different device produces.
    pub fn recover<O>(&self, oracle: &O) -> Result<RecoveredBackup, VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        let ephemeral = oracle
            .unwrap(&WrapContext::backup_key(), &self.wrapped_ephemeral_key)
            .context("Unwrapping backup key")?;

        let der = decrypt(&self.wrapped_private_key, &self.ephemeral_iv, &ephemeral).map_err(|e| {
            VaultError::Backup {
                message: e.to_string().into(),
                context: Some("Decrypting private key".into()),
            }
        })?;
        let private = RsaPrivateKey::from_pkcs8_der(&der).map_err(|e| VaultError::Backup {
            message: e.to_string().into(),
            context: Some("Decoding private key".into()),
        })?;

        info!("Backup private key recovered");
        Ok(RecoveredBackup { private })
    }

    #[cfg(test)]
    pub(crate) fn placeholder() -> Self {
        Self {
            public_key: vec![0x30],
            wrapped_private_key: vec![0; 16],
            wrapped_ephemeral_key: vec![0; KEY_LEN],
            ephemeral_iv: [0; IV_LEN],
        }
    }
}

impl fmt::Debug for BackupKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupKeyMaterial")
            .field("public_key_len", &self.public_key.len())
            .field("wrapped_private_key_len", &self.wrapped_private_key.len())
            .finish_non_exhaustive()
    }
}

/// The decrypted backup private key. Zeroized on drop.
pub struct RecoveredBackup {
    private: RsaPrivateKey,
}

impl RecoveredBackup {
    /// Decrypts data produced by [`BackupKeyMaterial::seal`].
    pub fn open(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        self.private
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map(Zeroizing::new)
            .map_err(backup_error("Opening sealed data"))
    }

    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        self.private.to_public_key()
    }
}

impl fmt::Debug for RecoveredBackup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveredBackup").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_seal_len_for_oaep_sha256() {
        assert_eq!(MAX_SEAL_LEN, 190);
    }

    #[test]
    fn test_placeholder_debug_omits_bytes() {
        let rendered = format!("{:?}", BackupKeyMaterial::placeholder());
        assert!(rendered.contains("public_key_len: 1"));
    }
}
