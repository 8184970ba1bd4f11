//! A password vault rooted in a hardware key-wrap device.
//!
//! ## Layers
//!
//! * Every password value is wrapped by the device on its own, under the name of its group
//!   ([`encrypt_password`]). The device shows that name while asking for confirmation.
//! * The group table is encrypted as a whole under a fresh outer key on every save. The device
//!   wraps the outer key, and an HMAC tag over the whole file catches tampering and wrong
//!   devices before anything is decrypted ([`codec`]).
//! * An optional RSA key pair lets data be escrowed offline; its private half is wrapped
//!   through the device as well ([`BackupKeyMaterial`]).
//!
//! ## Example
//!
//! ```rust
//! use tzpass_oracle::SoftOracle;
//! use tzpass_vault::prelude::*;
//!
//! # fn main() -> Result<(), VaultError> {
//! let device = SoftOracle::new([7u8; 32]);
//!
//! let mut vault = Vault::new();
//! vault.add_group("mail")?;
//! vault.add_secret(&device, "mail", "alice@example.com", "hunter2")?;
//!
//! let bytes = codec::encode(&vault, &device)?;
//! let restored = codec::decode(&bytes, &device)?;
//!
//! assert_eq!(restored, vault);
//! assert_eq!(restored.reveal(&device, "mail", 0)?.as_str(), "hunter2");
//! # Ok(())
//! # }
//! ```

mod backup;
pub mod codec;
mod error;
mod model;
mod secret;
mod storage;

pub use backup::{BackupKeyMaterial, MAX_SEAL_LEN, RSA_BITS, RecoveredBackup};
pub use error::{VaultError, VaultErrorExt};
pub use model::{PasswordGroup, SecretPair, Vault};
pub use secret::{PREFIX_LEN, decrypt_password, encrypt_password};

pub mod prelude {
    pub use crate::backup::{BackupKeyMaterial, RecoveredBackup};
    pub use crate::codec;
    pub use crate::error::{VaultError, VaultErrorExt};
    pub use crate::model::{PasswordGroup, SecretPair, Vault};
    pub use crate::secret::{decrypt_password, encrypt_password};
}
