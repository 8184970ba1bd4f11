//! # Device Errors
//!
//! Failures reported by a [`crate::KeyWrapOracle`]. Every variant aborts the enclosing vault
//! operation; none of them is retried automatically.

use std::borrow::Cow;
use std::time::Duration;

/// A specialized [`DeviceError`] enum for key-wrap oracle failures.
#[tzpass_derive::tzpass_error]
pub enum DeviceError {
    /// The human declined the request on the device.
    #[error("Request rejected on device{}: {message}", format_context(.context))]
    UserRejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The device is processing another request.
    #[error("Device busy{}: {message}", format_context(.context))]
    DeviceBusy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The device went away mid-call, or no session exists.
    #[error("Device connection error{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No answer within the configured deadline.
    #[error("Device timeout{}: no response after {after:?}", format_context(.context))]
    Timeout { after: Duration, context: Option<Cow<'static, str>> },

    /// The device refused the input itself (empty or not block aligned).
    #[error("Invalid oracle request{}: {message}", format_context(.context))]
    InvalidRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal device error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DeviceError {
    /// Shorthand used by approvers and tests.
    #[must_use]
    pub fn rejected(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UserRejected { message: message.into(), context: None }
    }
}
