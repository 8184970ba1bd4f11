//! In-memory vault: named password groups holding ordered key/value pairs.
//!
//! Keys are plaintext. Values are ciphertexts produced by [`crate::encrypt_password`] under
//! the owning group's name, so moving a value to another name requires re-wrapping it.

use crate::backup::BackupKeyMaterial;
use crate::error::{VaultError, VaultErrorExt};
use crate::secret::{decrypt_password, encrypt_password};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use tzpass_oracle::KeyWrapOracle;
use zeroize::{Zeroize, Zeroizing};

/// A plaintext key and its wrapped value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPair {
    key: String,
    value: Vec<u8>,
}

impl SecretPair {
    #[must_use]
    pub fn new(key: impl Into<String>, encrypted_value: Vec<u8>) -> Self {
        Self { key: key.into(), value: encrypted_value }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn encrypted_value(&self) -> &[u8] {
        &self.value
    }
}

/// An ordered list of pairs under a unique name.
///
/// Pairs are addressed by position. [`PasswordGroup::remove_pair`] shifts every later pair
/// down by one, so indices obtained before a removal must be looked up again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordGroup {
    name: String,
    pairs: Vec<SecretPair>,
}

impl PasswordGroup {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), pairs: Vec::new() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pairs(&self) -> &[SecretPair] {
        &self.pairs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Appends a pair and returns its index.
    pub fn add_pair(&mut self, key: impl Into<String>, encrypted_value: Vec<u8>) -> usize {
        self.pairs.push(SecretPair::new(key, encrypted_value));
        self.pairs.len() - 1
    }

    pub fn pair(&self, index: usize) -> Result<&SecretPair, VaultError> {
        self.pairs.get(index).ok_or_else(|| self.missing(index))
    }

    pub fn update_pair(
        &mut self,
        index: usize,
        key: impl Into<String>,
        encrypted_value: Vec<u8>,
    ) -> Result<(), VaultError> {
        match self.pairs.get_mut(index) {
            Some(slot) => {
                *slot = SecretPair::new(key, encrypted_value);
                Ok(())
            },
            None => Err(self.missing(index)),
        }
    }

    /// Removes and returns the pair at `index`, shifting later pairs down.
    pub fn remove_pair(&mut self, index: usize) -> Result<SecretPair, VaultError> {
        if index >= self.pairs.len() {
            return Err(self.missing(index));
        }
        Ok(self.pairs.remove(index))
    }

    fn missing(&self, index: usize) -> VaultError {
        VaultError::PairNotFound { group: self.name.clone(), index, context: None }
    }
}

/// The decrypted contents of a vault file.
///
/// The outer key and IV are not part of this value; the codec draws fresh ones on every
/// encode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vault {
    pub(crate) groups: BTreeMap<String, PasswordGroup>,
    pub(crate) backup: Option<BackupKeyMaterial>,
}

impl Vault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups ordered by name.
    pub fn groups(&self) -> impl ExactSizeIterator<Item = &PasswordGroup> {
        self.groups.values()
    }

    #[must_use]
    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn group(&self, name: &str) -> Result<&PasswordGroup, VaultError> {
        self.groups.get(name).ok_or_else(|| not_found(name))
    }

    pub fn group_mut(&mut self, name: &str) -> Result<&mut PasswordGroup, VaultError> {
        self.groups.get_mut(name).ok_or_else(|| not_found(name))
    }

    /// Creates an empty group.
    ///
    /// # Errors
    /// [`VaultError::DuplicateGroup`] if the name is taken; the existing group is untouched.
    pub fn add_group(&mut self, name: &str) -> Result<&mut PasswordGroup, VaultError> {
        if self.groups.contains_key(name) {
            return Err(VaultError::DuplicateGroup { name: name.to_owned(), context: None });
        }
        debug!(group = name, "Adding password group");
        Ok(self.groups.entry(name.to_owned()).or_insert_with(|| PasswordGroup::new(name)))
    }

    pub fn remove_group(&mut self, name: &str) -> Result<PasswordGroup, VaultError> {
        self.groups.remove(name).ok_or_else(|| not_found(name))
    }

    /// Renames a group and re-wraps every value under the new name.
    ///
    /// Each value is unwrapped under `old` and wrapped under `new`, so the device may ask for
    /// one confirmation per pair. Renaming a group to its own name does nothing.
    ///
    /// # Errors
    /// * [`VaultError::GroupNotFound`] / [`VaultError::DuplicateGroup`] on bad names.
    /// * Any device or format error; the vault is left exactly as it was.
    pub fn rename_group<O>(&mut self, oracle: &O, old: &str, new: &str) -> Result<(), VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        let group = self.group(old)?;
        if old == new {
            return Ok(());
        }
        if self.groups.contains_key(new) {
            return Err(VaultError::DuplicateGroup { name: new.to_owned(), context: None });
        }

        let mut pairs = Vec::with_capacity(group.len());
        for pair in group.pairs() {
            let plaintext = decrypt_password(oracle, pair.encrypted_value(), old)
                .context(format!("Re-wrapping {old}/{}", pair.key()))?;
            let value = encrypt_password(oracle, &plaintext, new)
                .context(format!("Re-wrapping {old}/{}", pair.key()))?;
            pairs.push(SecretPair::new(pair.key(), value));
        }

        self.groups.remove(old);
        self.groups.insert(new.to_owned(), PasswordGroup { name: new.to_owned(), pairs });
        info!(from = old, to = new, "Password group renamed");
        Ok(())
    }

    /// Wraps `password` under `group` and appends it. Returns the new index.
    pub fn add_secret<O>(
        &mut self,
        oracle: &O,
        group: &str,
        key: &str,
        password: &str,
    ) -> Result<usize, VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        let target = self.group_mut(group)?;
        let value = encrypt_password(oracle, password.as_bytes(), group)?;
        Ok(target.add_pair(key, value))
    }

    /// Unwraps the value at `index` of `group`.
    ///
    /// # Errors
    /// [`VaultError::Format`] if the value is not valid UTF-8 once decrypted, besides the
    /// lookup and device errors.
    pub fn reveal<O>(
        &self,
        oracle: &O,
        group: &str,
        index: usize,
    ) -> Result<Zeroizing<String>, VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        let pair = self.group(group)?.pair(index)?;
        let mut plaintext = decrypt_password(oracle, pair.encrypted_value(), group)?;
        let text = String::from_utf8(std::mem::take(&mut *plaintext)).map_err(|e| {
            e.into_bytes().zeroize();
            VaultError::format("Password is not valid UTF-8")
        })?;
        Ok(Zeroizing::new(text))
    }

    #[must_use]
    pub const fn backup(&self) -> Option<&BackupKeyMaterial> {
        self.backup.as_ref()
    }

    /// Generates the vault's backup key pair.
    ///
    /// # Errors
    /// [`VaultError::BackupExists`] if the vault already has one, besides generation errors.
    pub fn init_backup<O>(&mut self, oracle: &O) -> Result<&BackupKeyMaterial, VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        if self.backup.is_some() {
            return Err(VaultError::BackupExists { context: None });
        }
        Ok(self.backup.insert(BackupKeyMaterial::generate(oracle)?))
    }

    pub(crate) fn from_parts(
        groups: Vec<PasswordGroup>,
        backup: Option<BackupKeyMaterial>,
    ) -> Result<Self, VaultError> {
        let mut map = BTreeMap::new();
        for group in groups {
            if map.contains_key(&group.name) {
                return Err(VaultError::format(format!("Duplicate group {:?} in file", group.name)));
            }
            map.insert(group.name.clone(), group);
        }
        Ok(Self { groups: map, backup })
    }
}

fn not_found(name: &str) -> VaultError {
    VaultError::GroupNotFound { name: name.to_owned(), context: None }
}
