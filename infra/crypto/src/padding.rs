//! Reversible block padding for the 16-byte AES block.
//!
//! `n = 16 - (len % 16)` bytes of value `n` are appended, so an already aligned input
//! gains a full block of `0x10`.

use crate::error::CryptoError;

/// Cipher block size used throughout the vault.
pub const BLOCK_SIZE: usize = 16;

/// Pads `data` to the next block boundary.
#[must_use]
pub fn pad(data: &[u8]) -> Vec<u8> {
    let n = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
    let mut out = Vec::with_capacity(data.len() + n);
    out.extend_from_slice(data);
    // n is in 1..=16
    #[allow(clippy::cast_possible_truncation)]
    out.resize(data.len() + n, n as u8);
    out
}

/// Strips the padding appended by [`pad`].
///
/// # Errors
/// Returns [`CryptoError::Format`] if the input is empty or the last byte is `0`, larger
/// than the block size, or larger than the input.
pub fn unpad(data: &[u8]) -> Result<&[u8], CryptoError> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::Format {
            message: "Cannot unpad an empty buffer".into(),
            context: None,
        });
    };

    let n = usize::from(last);
    if n == 0 || n > BLOCK_SIZE || n > data.len() {
        return Err(CryptoError::Format {
            message: format!("Invalid padding length {n}").into(),
            context: Some(format!("input is {} bytes", data.len()).into()),
        });
    }

    Ok(&data[..data.len() - n])
}
