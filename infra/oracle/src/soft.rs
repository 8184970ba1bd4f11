//! In-memory stand-in for the hardware device.
//!
//! Every `(node path, label)` pair gets its own AES-256 key and IV, expanded from the master
//! secret with HMAC-SHA256:
//!
//! ```text
//! key = HMAC(secret, "tzpass.soft-oracle.key" || path || label)
//! iv  = HMAC(secret, "tzpass.soft-oracle.iv"  || path || label)[..16]
//! ```
//!
//! `path` is the index count followed by each index, and `label` is its byte length followed
//! by the UTF-8 bytes, all lengths and indices big-endian `u32`. Data is encrypted with
//! AES-256-CBC and no padding, so equal inputs under equal contexts wrap identically.

use crate::error::DeviceError;
use crate::node::{NodePath, WrapContext};
use crate::oracle::KeyWrapOracle;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use tzpass_crypto::{BLOCK_SIZE, IV_LEN, KEY_LEN, decrypt_blocks, encrypt_blocks, fill_random, tag};
use zeroize::Zeroizing;

const KEY_DOMAIN: &[u8] = b"tzpass.soft-oracle.key";
const IV_DOMAIN: &[u8] = b"tzpass.soft-oracle.iv";

/// Master secret size.
pub const SECRET_LEN: usize = 32;

/// Which direction a confirmation prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Wrap,
    Unwrap,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wrap => "wrap",
            Self::Unwrap => "unwrap",
        })
    }
}

/// What the device would display while waiting for the button.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmRequest<'a> {
    pub operation: Operation,
    pub node: NodePath,
    pub label: &'a str,
}

type Approver = dyn Fn(&ConfirmRequest<'_>) -> bool + Send + Sync;

const fn approve_all(_: &ConfirmRequest<'_>) -> bool {
    true
}

/// A deterministic software key-wrap device.
#[derive(Clone)]
pub struct SoftOracle {
    secret: Zeroizing<[u8; SECRET_LEN]>,
    approver: Arc<Approver>,
}

impl SoftOracle {
    /// Creates a device that approves every request.
    #[must_use]
    pub fn new(secret: [u8; SECRET_LEN]) -> Self {
        Self { secret: Zeroizing::new(secret), approver: Arc::new(approve_all) }
    }

    /// Creates a device with a fresh random master secret.
    ///
    /// # Errors
    /// Returns [`DeviceError::Internal`] if the system RNG is unavailable.
    pub fn generate() -> Result<Self, DeviceError> {
        let mut secret = Zeroizing::new([0u8; SECRET_LEN]);
        fill_random(secret.as_mut_slice()).map_err(|e| DeviceError::Internal {
            message: e.to_string().into(),
            context: Some("Generating device secret".into()),
        })?;
        Ok(Self { secret, approver: Arc::new(approve_all) })
    }

    /// Creates a device from a persisted master secret.
    ///
    /// # Errors
    /// Returns [`DeviceError::InvalidRequest`] unless `secret` is exactly 32 bytes.
    pub fn from_slice(secret: &[u8]) -> Result<Self, DeviceError> {
        let secret: [u8; SECRET_LEN] =
            secret.try_into().map_err(|_| DeviceError::InvalidRequest {
                message: format!("device secret must be {SECRET_LEN} bytes, got {}", secret.len())
                    .into(),
                context: None,
            })?;
        Ok(Self::new(secret))
    }

    /// Replaces the confirmation handler. Returning `false` rejects the request.
    #[must_use]
    pub fn with_approver(
        mut self,
        approver: impl Fn(&ConfirmRequest<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.approver = Arc::new(approver);
        self
    }

    /// Shorthand for a device whose button is never pressed.
    #[must_use]
    pub fn rejecting(self) -> Self {
        self.with_approver(|_| false)
    }

    /// The master secret, for persisting a development device.
    #[must_use]
    pub fn secret(&self) -> &[u8; SECRET_LEN] {
        &self.secret
    }

    fn confirm(&self, operation: Operation, ctx: &WrapContext<'_>) -> Result<(), DeviceError> {
        let request = ConfirmRequest { operation, node: ctx.node(), label: ctx.label() };
        if (self.approver)(&request) {
            Ok(())
        } else {
            Err(DeviceError::UserRejected {
                message: format!("{operation} of \"{}\" declined", ctx.label()).into(),
                context: Some(ctx.node().to_string().into()),
            })
        }
    }

    fn cipher_params(
        &self,
        ctx: &WrapContext<'_>,
    ) -> Result<(Zeroizing<[u8; KEY_LEN]>, [u8; IV_LEN]), DeviceError> {
        let encoded = encode_context(ctx)?;

        let mut input = Zeroizing::new(Vec::with_capacity(KEY_DOMAIN.len() + encoded.len()));
        input.extend_from_slice(KEY_DOMAIN);
        input.extend_from_slice(&encoded);
        let key = Zeroizing::new(tag::compute(self.secret.as_slice(), &input).map_err(internal)?);

        input.clear();
        input.extend_from_slice(IV_DOMAIN);
        input.extend_from_slice(&encoded);
        let digest = tag::compute(self.secret.as_slice(), &input).map_err(internal)?;

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&digest[..IV_LEN]);
        Ok((key, iv))
    }
}

impl KeyWrapOracle for SoftOracle {
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        debug!(node = %ctx.node(), label = ctx.label(), len = data.len(), "Wrapping on soft device");
        check_aligned(data)?;
        if ctx.confirm_on_wrap() {
            self.confirm(Operation::Wrap, ctx)?;
        }
        let (key, iv) = self.cipher_params(ctx)?;
        encrypt_blocks(data, &iv, key.as_slice()).map_err(internal)
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        debug!(node = %ctx.node(), label = ctx.label(), len = data.len(), "Unwrapping on soft device");
        check_aligned(data)?;
        if ctx.confirm_on_unwrap() {
            self.confirm(Operation::Unwrap, ctx)?;
        }
        let (key, iv) = self.cipher_params(ctx)?;
        decrypt_blocks(data, &iv, key.as_slice()).map_err(internal)
    }
}

impl fmt::Debug for SoftOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftOracle").finish_non_exhaustive()
    }
}

fn encode_context(ctx: &WrapContext<'_>) -> Result<Vec<u8>, DeviceError> {
    let indices = ctx.node().indices();
    let label = ctx.label().as_bytes();
    let too_long = |what: &str| DeviceError::InvalidRequest {
        message: format!("{what} too long").into(),
        context: None,
    };

    let mut out = Vec::with_capacity(8 + 4 * indices.len() + label.len());
    out.extend_from_slice(&u32::try_from(indices.len()).map_err(|_| too_long("node path"))?.to_be_bytes());
    for index in indices {
        out.extend_from_slice(&index.to_be_bytes());
    }
    out.extend_from_slice(&u32::try_from(label.len()).map_err(|_| too_long("label"))?.to_be_bytes());
    out.extend_from_slice(label);
    Ok(out)
}

fn check_aligned(data: &[u8]) -> Result<(), DeviceError> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(DeviceError::InvalidRequest {
            message: format!("{} bytes is not a non-empty multiple of {BLOCK_SIZE}", data.len())
                .into(),
            context: None,
        });
    }
    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn internal(err: tzpass_crypto::CryptoError) -> DeviceError {
    DeviceError::Internal { message: err.to_string().into(), context: None }
}
