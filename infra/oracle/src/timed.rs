//! Deadline guard around a blocking oracle.
//!
//! A device waiting for its button never returns on its own. [`TimedOracle`] moves each call
//! to a worker thread and stops waiting after the configured duration. The worker is left
//! detached; its late result is dropped.
//!
//! A device serves one request at a time. Until a timed-out worker has returned, every new
//! call fails fast with [`DeviceError::DeviceBusy`] instead of opening a second request.

use crate::error::DeviceError;
use crate::node::WrapContext;
use crate::oracle::KeyWrapOracle;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::warn;
use zeroize::Zeroizing;

/// Wraps an oracle and fails calls that outlive `timeout` with [`DeviceError::Timeout`].
///
/// Clones share the inner oracle and its in-flight state.
#[derive(Debug)]
pub struct TimedOracle<O> {
    inner: Arc<O>,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

impl<O> Clone for TimedOracle<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timeout: self.timeout,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Clears the in-flight flag when the worker is done with the device.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<O> TimedOracle<O>
where
    O: KeyWrapOracle + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(inner: O, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(inner), timeout)
    }

    #[must_use]
    pub fn from_arc(inner: Arc<O>, timeout: Duration) -> Self {
        Self { inner, timeout, in_flight: Arc::new(AtomicBool::new(false)) }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Whether a worker, possibly an abandoned one, is still talking to the device.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn call<T, F>(&self, ctx: &WrapContext<'_>, data: &[u8], op: F) -> Result<T, DeviceError>
    where
        T: Send + 'static,
        F: FnOnce(&O, &WrapContext<'static>, &[u8]) -> Result<T, DeviceError> + Send + 'static,
    {
        if self.in_flight.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
        {
            warn!(node = %ctx.node(), label = ctx.label(), "Previous oracle call still pending");
            return Err(DeviceError::DeviceBusy {
                message: "a previous request has not finished on the device".into(),
                context: Some(ctx.label().to_owned().into()),
            });
        }
        let guard = InFlight(Arc::clone(&self.in_flight));

        let (tx, rx) = mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);
        let owned_ctx = ctx.clone().into_owned();
        let owned_data = Zeroizing::new(data.to_vec());

        thread::Builder::new()
            .name("tzpass-oracle".into())
            .spawn(move || {
                let result = op(&*inner, &owned_ctx, &owned_data[..]);
                drop(guard);
                // The receiver is gone once the deadline passed.
                let _ = tx.send(result);
            })
            .map_err(|e| DeviceError::Internal {
                message: e.to_string().into(),
                context: Some("Spawning oracle worker".into()),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(node = %ctx.node(), label = ctx.label(), timeout = ?self.timeout, "Oracle call timed out");
                Err(DeviceError::Timeout {
                    after: self.timeout,
                    context: Some(ctx.label().to_owned().into()),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(DeviceError::Internal {
                message: "oracle worker exited without a result".into(),
                context: None,
            }),
        }
    }
}

impl<O> KeyWrapOracle for TimedOracle<O>
where
    O: KeyWrapOracle + Send + Sync + 'static,
{
    fn wrap(&self, ctx: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        self.call(ctx, data, |oracle, ctx, data| oracle.wrap(ctx, data))
    }

    fn unwrap(
        &self,
        ctx: &WrapContext<'_>,
        data: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
        self.call(ctx, data, |oracle, ctx, data| oracle.unwrap(ctx, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft::SoftOracle;

    #[derive(Debug)]
    struct Stalled(Duration);

    impl KeyWrapOracle for Stalled {
        fn wrap(&self, _: &WrapContext<'_>, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
            thread::sleep(self.0);
            Ok(data.to_vec())
        }

        fn unwrap(
            &self,
            _: &WrapContext<'_>,
            data: &[u8],
        ) -> Result<Zeroizing<Vec<u8>>, DeviceError> {
            thread::sleep(self.0);
            Ok(Zeroizing::new(data.to_vec()))
        }
    }

    #[test]
    fn test_passes_fast_results_through() {
        let oracle = TimedOracle::new(SoftOracle::new([4; 32]), Duration::from_secs(5));
        let ctx = WrapContext::group("mail");

        let wrapped = oracle.wrap(&ctx, &[1; 16]).unwrap();
        assert_eq!(wrapped, oracle.inner().wrap(&ctx, &[1; 16]).unwrap());
        assert_eq!(oracle.unwrap(&ctx, &wrapped).unwrap().as_slice(), &[1; 16]);
    }

    #[test]
    fn test_passes_device_errors_through() {
        let oracle = TimedOracle::new(SoftOracle::new([4; 32]).rejecting(), Duration::from_secs(5));
        let err = oracle.unwrap(&WrapContext::outer_key(), &[0; 32]).unwrap_err();
        assert!(matches!(err, DeviceError::UserRejected { .. }));
    }

    #[test]
    fn test_stalled_device_times_out() {
        let oracle = TimedOracle::new(Stalled(Duration::from_secs(2)), Duration::from_millis(50));
        let err = oracle.unwrap(&WrapContext::outer_key(), &[0; 32]).unwrap_err();
        assert!(matches!(err, DeviceError::Timeout { after, .. } if after == Duration::from_millis(50)));
    }

    #[test]
    fn test_abandoned_call_keeps_device_busy_until_it_returns() {
        let oracle = TimedOracle::new(Stalled(Duration::from_millis(300)), Duration::from_millis(20));
        let ctx = WrapContext::group("mail");

        let first = oracle.wrap(&ctx, &[1; 16]).unwrap_err();
        assert!(matches!(first, DeviceError::Timeout { .. }));
        assert!(oracle.is_busy());

        let second = oracle.clone().unwrap(&ctx, &[1; 16]).unwrap_err();
        assert!(matches!(second, DeviceError::DeviceBusy { .. }), "{second}");

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while oracle.is_busy() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!oracle.is_busy());

        let patient = TimedOracle::from_arc(Arc::clone(&oracle.inner), Duration::from_secs(5));
        assert_eq!(patient.wrap(&ctx, &[1; 16]).unwrap(), vec![1; 16]);
    }

    #[test]
    fn test_sequential_calls_are_not_busy() {
        let oracle = TimedOracle::new(SoftOracle::new([4; 32]), Duration::from_secs(5));
        let ctx = WrapContext::group("mail");
        for _ in 0..3 {
            oracle.wrap(&ctx, &[1; 16]).unwrap();
        }
        assert!(!oracle.is_busy());
    }
}
