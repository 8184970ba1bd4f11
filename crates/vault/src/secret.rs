//! Per-password wrapping.
//!
//! A value is wrapped directly by the device under the group's name:
//!
//! ```text
//! wrapped = oracle.wrap(GRUP, group, pad(random[16] || password))
//! ```
//!
//! The device wraps deterministically, so the random first block is what keeps two equal
//! passwords from producing equal ciphertexts.

use crate::error::{VaultError, VaultErrorExt};
use tzpass_crypto::{BLOCK_SIZE, pad, random_array, unpad};
use tzpass_oracle::{KeyWrapOracle, WrapContext};
use zeroize::Zeroizing;

/// Length of the random block prepended to every password.
pub const PREFIX_LEN: usize = BLOCK_SIZE;

/// Wraps `plaintext` for storage in `group`.
///
/// # Errors
/// [`VaultError::Crypto`] if the RNG fails, [`VaultError::Device`] if the device refuses.
pub fn encrypt_password<O>(oracle: &O, plaintext: &[u8], group: &str) -> Result<Vec<u8>, VaultError>
where
    O: KeyWrapOracle + ?Sized,
{
    let mut buf = Zeroizing::new(Vec::with_capacity(PREFIX_LEN + plaintext.len()));
    buf.extend_from_slice(&random_array::<PREFIX_LEN>()?);
    buf.extend_from_slice(plaintext);
    let padded = Zeroizing::new(pad(&buf));

    oracle.wrap(&WrapContext::group(group), &padded).context("Encrypting password")
}

/// Unwraps a value produced by [`encrypt_password`] under the same `group`.
///
/// # Errors
/// * [`VaultError::Device`] if the device refuses.
/// * [`VaultError::Format`] if the padding is broken or nothing remains after the random
///   block. This is also what a value wrapped under another group name usually yields.
pub fn decrypt_password<O>(
    oracle: &O,
    ciphertext: &[u8],
    group: &str,
) -> Result<Zeroizing<Vec<u8>>, VaultError>
where
    O: KeyWrapOracle + ?Sized,
{
    let padded = oracle.unwrap(&WrapContext::group(group), ciphertext).context("Decrypting password")?;

    let unpadded = unpad(&padded).map_err(|e| VaultError::Format {
        message: e.to_string().into(),
        context: Some(format!("password in group {group}").into()),
    })?;
    if unpadded.len() < PREFIX_LEN {
        return Err(VaultError::Format {
            message: format!("{} bytes is shorter than the random prefix", unpadded.len()).into(),
            context: Some(format!("password in group {group}").into()),
        });
    }

    Ok(Zeroizing::new(unpadded[PREFIX_LEN..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tzpass_oracle::SoftOracle;

    fn device() -> SoftOracle {
        SoftOracle::new([0x44; 32])
    }

    #[test]
    fn test_same_password_wraps_differently() {
        let oracle = device();
        let a = encrypt_password(&oracle, b"hunter2", "mail").unwrap();
        let b = encrypt_password(&oracle, b"hunter2", "mail").unwrap();
        assert_ne!(a, b);

        assert_eq!(decrypt_password(&oracle, &a, "mail").unwrap().as_slice(), b"hunter2");
        assert_eq!(decrypt_password(&oracle, &b, "mail").unwrap().as_slice(), b"hunter2");
    }

    #[test]
    fn test_ciphertext_length_includes_prefix_and_padding() {
        let oracle = device();
        assert_eq!(encrypt_password(&oracle, b"", "g").unwrap().len(), 32);
        assert_eq!(encrypt_password(&oracle, &[0; 15], "g").unwrap().len(), 32);
        assert_eq!(encrypt_password(&oracle, &[0; 16], "g").unwrap().len(), 48);
    }

    #[test]
    fn test_empty_password_roundtrips() {
        let oracle = device();
        let wrapped = encrypt_password(&oracle, b"", "g").unwrap();
        assert!(decrypt_password(&oracle, &wrapped, "g").unwrap().is_empty());
    }

    #[test]
    fn test_value_without_prefix_is_format_error() {
        let oracle = device();
        // A single padded block carries fewer bytes than the random prefix.
        let wrapped = oracle.wrap(&WrapContext::group("g"), &pad(b"short")).unwrap();
        let err = decrypt_password(&oracle, &wrapped, "g").unwrap_err();
        assert!(matches!(err, VaultError::Format { .. }));
    }

    #[test]
    fn test_rejection_is_reported_as_device_error() {
        let wrapped = encrypt_password(&device(), b"pw", "g").unwrap();
        let err = decrypt_password(&device().rejecting(), &wrapped, "g").unwrap_err();
        assert!(err.is_user_rejection());
    }
}
