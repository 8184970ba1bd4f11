use crate::error::CryptoError;
use getrandom::fill;

/// Fills `buf` from the operating system CSPRNG.
///
/// # Errors
/// Returns [`CryptoError::Random`] if the system RNG is unavailable.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    fill(buf).map_err(|e| CryptoError::Random { message: e.to_string().into(), context: None })
}

/// Returns `N` fresh random bytes.
///
/// # Errors
/// Returns [`CryptoError::Random`] if the system RNG is unavailable.
pub fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    fill_random(&mut out)?;
    Ok(out)
}
