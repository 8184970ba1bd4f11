//! Command execution.
//!
//! Every command that touches an existing vault loads it through the device, applies one
//! model operation and, when something changed, saves it back atomically.

use crate::args::Command;
use anyhow::{Context, Result, bail, ensure};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;
use tzpass_oracle::KeyWrapOracle;
use tzpass_vault::{Vault, encrypt_password};
use zeroize::Zeroizing;

/// Runs `command` against the vault at `vault_path`.
///
/// Command output goes to `out`. Passwords for `add` and `update` are read from the first
/// line of `input` before the device is asked for anything.
///
/// # Errors
/// Returns an error on any vault, device or I/O failure. The vault file is only replaced
/// after the whole command succeeded.
pub fn execute<O>(
    command: &Command,
    vault_path: &Path,
    oracle: &O,
    out: &mut dyn Write,
    input: &mut dyn Read,
) -> Result<()>
where
    O: KeyWrapOracle + ?Sized,
{
    match command {
        Command::Init => {
            ensure!(!vault_path.exists(), "{} already exists", vault_path.display());
            Vault::new().save(vault_path, oracle).context("Creating vault")?;
            info!(path = %vault_path.display(), "Vault created");
            writeln!(out, "Created {}", vault_path.display())?;
        },
        Command::Groups => {
            let vault = open(vault_path, oracle)?;
            for group in vault.groups() {
                writeln!(out, "{}\t{}", group.name(), group.len())?;
            }
        },
        Command::AddGroup { name } => {
            let mut vault = open(vault_path, oracle)?;
            vault.add_group(name)?;
            vault.save(vault_path, oracle)?;
            writeln!(out, "Added group {name}")?;
        },
        Command::RemoveGroup { name } => {
            let mut vault = open(vault_path, oracle)?;
            let removed = vault.remove_group(name)?;
            vault.save(vault_path, oracle)?;
            writeln!(out, "Removed group {name} ({} passwords)", removed.len())?;
        },
        Command::RenameGroup { old, new } => {
            let mut vault = open(vault_path, oracle)?;
            vault.rename_group(oracle, old, new)?;
            vault.save(vault_path, oracle)?;
            writeln!(out, "Renamed group {old} to {new}")?;
        },
        Command::List { group } => {
            let vault = open(vault_path, oracle)?;
            for (index, pair) in vault.group(group)?.pairs().iter().enumerate() {
                writeln!(out, "{index}\t{}", pair.key())?;
            }
        },
        Command::Add { group, key } => {
            let password = read_password(input)?;
            let mut vault = open(vault_path, oracle)?;
            let index = vault.add_secret(oracle, group, key, &password)?;
            vault.save(vault_path, oracle)?;
            writeln!(out, "Added {group}/{key} at index {index}")?;
        },
        Command::Update { group, index, key } => {
            let password = read_password(input)?;
            let mut vault = open(vault_path, oracle)?;
            // Fail on a bad index before the device is asked to wrap anything.
            vault.group(group)?.pair(*index)?;
            let value = encrypt_password(oracle, password.as_bytes(), group)?;
            vault.group_mut(group)?.update_pair(*index, key.as_str(), value)?;
            vault.save(vault_path, oracle)?;
            writeln!(out, "Updated {group}/{key} at index {index}")?;
        },
        Command::Show { group, index } => {
            let vault = open(vault_path, oracle)?;
            let password = vault.reveal(oracle, group, *index)?;
            writeln!(out, "{}", password.as_str())?;
        },
        Command::Remove { group, index } => {
            let mut vault = open(vault_path, oracle)?;
            let removed = vault.group_mut(group)?.remove_pair(*index)?;
            vault.save(vault_path, oracle)?;
            writeln!(out, "Removed {group}/{}", removed.key())?;
        },
        Command::BackupInit => {
            let mut vault = open(vault_path, oracle)?;
            let fingerprint = fingerprint(vault.init_backup(oracle)?.public_key_der());
            vault.save(vault_path, oracle)?;
            writeln!(out, "Backup key fingerprint: sha256:{fingerprint}")?;
        },
        Command::BackupSeal { input: source, output } => {
            let vault = open(vault_path, oracle)?;
            let Some(backup) = vault.backup() else {
                bail!("The vault has no backup key; run backup-init first");
            };
            let plaintext = Zeroizing::new(
                fs::read(source).with_context(|| format!("Reading {}", source.display()))?,
            );
            let sealed = backup.seal(&plaintext)?;
            fs::write(output, sealed).with_context(|| format!("Writing {}", output.display()))?;
            writeln!(out, "Sealed {} to {}", source.display(), output.display())?;
        },
        Command::BackupOpen { input: source, output } => {
            let vault = open(vault_path, oracle)?;
            let Some(backup) = vault.backup() else {
                bail!("The vault has no backup key");
            };
            let sealed =
                fs::read(source).with_context(|| format!("Reading {}", source.display()))?;
            let plaintext = backup.recover(oracle)?.open(&sealed)?;
            fs::write(output, plaintext.as_slice())
                .with_context(|| format!("Writing {}", output.display()))?;
            writeln!(out, "Opened {} to {}", source.display(), output.display())?;
        },
    }
    Ok(())
}

fn open<O>(path: &Path, oracle: &O) -> Result<Vault>
where
    O: KeyWrapOracle + ?Sized,
{
    Vault::load(path, oracle).with_context(|| format!("Opening {}", path.display()))
}

/// Reads one line without consuming anything past the newline.
fn read_password(input: &mut dyn Read) -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(Vec::new());
    let mut byte = [0u8; 1];
    while input.read(&mut byte).context("Reading password")? == 1 && byte[0] != b'\n' {
        line.push(byte[0]);
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    ensure!(!line.is_empty(), "Password must not be empty");
    let text = std::str::from_utf8(&line).context("Password is not valid UTF-8")?;
    Ok(Zeroizing::new(text.to_owned()))
}

/// Lowercase hex SHA-256 of the public key DER.
#[must_use]
pub fn fingerprint(public_key_der: &[u8]) -> String {
    hex::encode(Sha256::digest(public_key_der))
}
