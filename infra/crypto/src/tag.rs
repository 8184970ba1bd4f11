//! HMAC-SHA256 integrity tags.

use crate::error::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Integrity tag size.
pub const TAG_LEN: usize = 32;

/// Computes the tag of `data` under `key`.
///
/// # Errors
/// Returns [`CryptoError::Internal`] if the MAC refuses the key (HMAC accepts any length,
/// so this indicates a bug rather than bad input).
pub fn compute(key: &[u8], data: &[u8]) -> Result<[u8; TAG_LEN], CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CryptoError::Internal {
        message: "HMAC init failed".into(),
        context: None,
    })?;
    mac.update(data);

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Recomputes the tag of `data` and compares it with `tag` in constant time.
///
/// A tag of the wrong length never verifies.
///
/// # Errors
/// See [`compute`].
pub fn verify(key: &[u8], data: &[u8], tag: &[u8]) -> Result<bool, CryptoError> {
    let expected = compute(key, data)?;
    Ok(constant_time_eq(&expected, tag))
}

/// Compares every byte and folds the differences, so the running time does not depend on
/// where the first mismatch is.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
