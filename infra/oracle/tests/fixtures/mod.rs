use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tzpass_oracle::prelude::*;

pub const SECRET: [u8; 32] = [0xC3; 32];

/// Device that approves everything.
#[must_use]
pub fn device() -> SoftOracle {
    SoftOracle::new(SECRET)
}

/// Device that counts its confirmation prompts and approves them.
#[must_use]
pub fn counting_device() -> (SoftOracle, Arc<AtomicUsize>) {
    let prompts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&prompts);
    let oracle = device().with_approver(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        true
    });
    (oracle, prompts)
}
