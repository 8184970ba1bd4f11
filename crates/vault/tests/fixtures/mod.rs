#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use tzpass_oracle::prelude::*;
use tzpass_vault::prelude::*;
use zeroize::Zeroizing;

pub const SECRET: [u8; 32] = [0xA7; 32];
pub const OTHER_SECRET: [u8; 32] = [0x7A; 32];

/// Device that approves everything.
#[must_use]
pub fn device() -> SoftOracle {
    SoftOracle::new(SECRET)
}

/// Device holding a different master secret.
#[must_use]
pub fn other_device() -> SoftOracle {
    SoftOracle::new(OTHER_SECRET)
}

/// Counts every call that reaches the device.
#[derive(Debug)]
pub struct CountingOracle {
    inner: SoftOracle,
    calls: AtomicUsize,
}

impl CountingOracle {
    #[must_use]
    pub fn new(inner: SoftOracle) -> Self {
        Self { inner, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyWrapOracle for CountingOracle {
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.wrap(ctx, data)
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.unwrap(ctx, data)
    }
}

/// Two groups, three pairs, wrapped by [`device`].
///
/// # Panics
/// * If the soft device fails, which it never does when approving everything.
#[must_use]
pub fn sample_vault() -> Vault {
    let oracle = device();
    let mut vault = Vault::new();
    vault.add_group("mail").unwrap();
    vault.add_group("bank").unwrap();
    vault.add_secret(&oracle, "mail", "alice@example.com", "correct horse").unwrap();
    vault.add_secret(&oracle, "mail", "bob@example.com", "battery staple").unwrap();
    vault.add_secret(&oracle, "bank", "4242", "pin: 0000").unwrap();
    vault
}

/// Offsets of the body and tag in an encoded file without backup material.
#[must_use]
pub fn body_range(bytes: &[u8]) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
    let backup_len = usize::from(u16::from_be_bytes([bytes[56], bytes[57]]));
    let len_at = 58 + backup_len;
    let body_len = u32::from_be_bytes(bytes[len_at..len_at + 4].try_into().unwrap()) as usize;
    let body_start = len_at + 4;
    let tag_start = body_start + body_len;
    (body_start..tag_start, tag_start..tag_start + 32)
}

/// Asks for confirmation on every call, wraps included.
#[derive(Debug)]
pub struct ConfirmEverything(pub SoftOracle);

impl KeyWrapOracle for ConfirmEverything {
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        self.0.wrap(&ctx.clone().with_confirmation(true, true), data)
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        self.0.unwrap(&ctx.clone().with_confirmation(true, true), data)
    }
}
