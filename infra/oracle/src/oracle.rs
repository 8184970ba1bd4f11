use crate::error::DeviceError;
use crate::node::WrapContext;
use std::sync::Arc;
use zeroize::Zeroizing;

/// The wrap/unwrap primitive of a hardware key device.
///
/// Wrapping is deterministic for a fixed device secret, node path and label. Inputs must
/// already be a non-empty multiple of 16 bytes; padding is the caller's job. Either call may
/// block until the human answers on the device, as requested by the context's confirmation
/// flags.
pub trait KeyWrapOracle {
    /// Encrypts `data` under the key the device derives for `ctx`.
    ///
    /// # Errors
    /// Any [`DeviceError`]; the output is undefined on failure.
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError>;

    /// Inverse of [`KeyWrapOracle::wrap`] for the same `ctx`.
    ///
    /// # Errors
    /// Any [`DeviceError`]. An unwrap under a different device secret or label succeeds
    /// with garbage; callers detect that through their own integrity checks.
    fn unwrap(&self, ctx: &WrapContext<'_>, data: &[u8])
    -> Result<Zeroizing<Vec<u8>>, DeviceError>;
}

impl<O: KeyWrapOracle + ?Sized> KeyWrapOracle for &O {
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        (**self).wrap(ctx, data)
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        (**self).unwrap(ctx, data)
    }
}

impl<O: KeyWrapOracle + ?Sized> KeyWrapOracle for Box<O> {
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        (**self).wrap(ctx, data)
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        (**self).unwrap(ctx, data)
    }
}

impl<O: KeyWrapOracle + ?Sized> KeyWrapOracle for Arc<O> {
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        (**self).wrap(ctx, data)
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        (**self).unwrap(ctx, data)
    }
}
