//! Key-wrap oracle seam of the tzpass vault.
//!
//! The vault never sees a device master key. It asks a [`KeyWrapOracle`] to encrypt or decrypt
//! short block-aligned strings under a [`NodePath`] and a label, and the device may demand a
//! button press before answering.
//!
//! | Use | Path | Label |
//! |---|---|---|
//! | outer vault key | `TZPW/ULCK` | `Decrypt master key?` |
//! | password values | `TZPW/GRUP` | group name |
//! | backup ephemeral key | `TZPW/BKUP` | `Decrypt backup key?` |
//!
//! [`SoftOracle`] is a deterministic in-memory device for tests and development.
//! [`TimedOracle`] puts a deadline on any oracle.
//!
//! ```rust
//! use std::time::Duration;
//! use tzpass_oracle::prelude::*;
//!
//! # fn main() -> Result<(), DeviceError> {
//! let device = TimedOracle::new(SoftOracle::generate()?, Duration::from_secs(30));
//! let ctx = WrapContext::group("mail");
//!
//! let wrapped = device.wrap(&ctx, &[7u8; 32])?;
//! assert_eq!(device.unwrap(&ctx, &wrapped)?.as_slice(), &[7u8; 32]);
//! # Ok(())
//! # }
//! ```

mod error;
pub mod node;
mod oracle;
mod soft;
mod timed;

pub use error::{DeviceError, DeviceErrorExt};
pub use node::{NodePath, WrapContext};
pub use oracle::KeyWrapOracle;
pub use soft::{ConfirmRequest, Operation, SECRET_LEN, SoftOracle};
pub use timed::TimedOracle;

pub mod prelude {
    pub use crate::error::{DeviceError, DeviceErrorExt};
    pub use crate::node::{NodePath, WrapContext};
    pub use crate::oracle::KeyWrapOracle;
    pub use crate::soft::SoftOracle;
    pub use crate::timed::TimedOracle;
}
