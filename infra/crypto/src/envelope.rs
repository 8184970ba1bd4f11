//! AES-256-CBC envelope.
//!
//! [`encrypt`]/[`decrypt`] pad and unpad with [`crate::padding`]; [`encrypt_blocks`]/
//! [`decrypt_blocks`] operate on block-aligned input without touching padding.
//!
//! CBC is malleable. Nothing coming out of [`decrypt`] may be trusted before the
//! ciphertext has been checked with [`crate::tag::verify`].

use crate::error::CryptoError;
use crate::padding::{BLOCK_SIZE, pad, unpad};
use aes::Aes256;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroizing;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

/// AES-256 key size.
pub const KEY_LEN: usize = 32;

/// CBC initialization vector size.
pub const IV_LEN: usize = BLOCK_SIZE;

/// Pads `plaintext` and encrypts it under `key`/`iv`.
///
/// # Errors
/// * [`CryptoError::InvalidKeyLength`] if `key` is not 32 bytes.
/// * [`CryptoError::InvalidIvLength`] if `iv` is not 16 bytes.
pub fn encrypt(plaintext: &[u8], iv: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_params(key, iv)?;
    encrypt_in_place(pad(plaintext), iv, key)
}

/// Decrypts `ciphertext` and strips its padding.
///
/// # Errors
/// * [`CryptoError::InvalidKeyLength`] / [`CryptoError::InvalidIvLength`] on bad parameters.
/// * [`CryptoError::Format`] if the ciphertext is not block aligned or the padding is invalid.
pub fn decrypt(
    ciphertext: &[u8],
    iv: &[u8],
    key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    check_params(key, iv)?;
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Format {
            message: format!("Ciphertext length {} is not a multiple of {BLOCK_SIZE}", ciphertext.len())
                .into(),
            context: None,
        });
    }

    let padded = decrypt_in_place(ciphertext, iv, key)?;
    let plaintext = unpad(&padded)?;
    Ok(Zeroizing::new(plaintext.to_vec()))
}

/// Encrypts block-aligned `data` without padding.
///
/// # Errors
/// * [`CryptoError::InvalidKeyLength`] / [`CryptoError::InvalidIvLength`] on bad parameters.
/// * [`CryptoError::Format`] if `data` is empty or not a multiple of 16 bytes.
pub fn encrypt_blocks(data: &[u8], iv: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_params(key, iv)?;
    check_aligned(data)?;
    encrypt_in_place(data.to_vec(), iv, key)
}

/// Decrypts block-aligned `data` without removing padding.
///
/// # Errors
/// * [`CryptoError::InvalidKeyLength`] / [`CryptoError::InvalidIvLength`] on bad parameters.
/// * [`CryptoError::Format`] if `data` is empty or not a multiple of 16 bytes.
pub fn decrypt_blocks(
    data: &[u8],
    iv: &[u8],
    key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    check_params(key, iv)?;
    check_aligned(data)?;
    decrypt_in_place(data, iv, key)
}

fn encrypt_in_place(mut buf: Vec<u8>, iv: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let len = buf.len();
    let cipher = Encryptor::new_from_slices(key, iv).map_err(|_| CryptoError::Internal {
        message: "Cipher rejected validated key material".into(),
        context: None,
    })?;

    cipher.encrypt_padded_mut::<NoPadding>(&mut buf, len).map_err(|_| CryptoError::Format {
        message: "Plaintext is not block aligned".into(),
        context: Some("AES-CBC encryption".into()),
    })?;

    Ok(buf)
}

fn decrypt_in_place(
    data: &[u8],
    iv: &[u8],
    key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut buf = Zeroizing::new(data.to_vec());
    let cipher = Decryptor::new_from_slices(key, iv).map_err(|_| CryptoError::Internal {
        message: "Cipher rejected validated key material".into(),
        context: None,
    })?;

    cipher.decrypt_padded_mut::<NoPadding>(&mut buf).map_err(|_| CryptoError::Format {
        message: "Ciphertext is not block aligned".into(),
        context: Some("AES-CBC decryption".into()),
    })?;

    Ok(buf)
}

fn check_params(key: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
    if key.len() != KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
            context: None,
        });
    }
    if iv.len() != IV_LEN {
        return Err(CryptoError::InvalidIvLength { expected: IV_LEN, actual: iv.len(), context: None });
    }
    Ok(())
}

fn check_aligned(data: &[u8]) -> Result<(), CryptoError> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Format {
            message: format!("{} bytes is not a whole number of blocks", data.len()).into(),
            context: None,
        });
    }
    Ok(())
}
