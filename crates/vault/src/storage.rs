use crate::codec;
use crate::error::{VaultError, VaultErrorExt};
use crate::model::Vault;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use tzpass_oracle::KeyWrapOracle;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Vault {
    /// Encodes the vault and atomically replaces the file at `path`.
    ///
    /// The whole file is encoded, including the device round trip, before anything touches
    /// the disk. A refused or failed oracle call therefore leaves an existing file untouched.
    ///
    /// # Errors
    /// Any [`codec::encode`] error, or [`VaultError::Io`].
    pub fn save<O>(&self, path: impl AsRef<Path>, oracle: &O) -> Result<(), VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        let bytes = codec::encode(self, oracle)?;
        write_atomic(path.as_ref(), &bytes)
    }

    /// Reads and decodes the file at `path`.
    ///
    /// # Errors
    /// [`VaultError::Io`] if the file cannot be read, otherwise any [`codec::decode`] error.
    pub fn load<O>(path: impl AsRef<Path>, oracle: &O) -> Result<Self, VaultError>
    where
        O: KeyWrapOracle + ?Sized,
    {
        let path = path.as_ref();
        let bytes = fs::read(path).context(format!("Reading {}", path.display()))?;
        codec::decode(&bytes, oracle)
    }
}

/// Writes `data` to `target` with the atomic swap pattern.
///
/// 1. Data is written to a unique temporary file next to the target.
/// 2. The file is synced to hardware (`fsync`).
/// 3. The temporary file is renamed over the target.
/// 4. The parent directory is synced so the rename itself is durable.
///
/// A crash at any point leaves either the old file or the new one, never a mix.
pub(crate) fn write_atomic(target: &Path, data: &[u8]) -> Result<(), VaultError> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).context(format!("Creating {}", parent.display()))?;

    let temp = unique_tmp_path(target);
    if let Err(err) = write_synced(&temp, data) {
        let _ = fs::remove_file(&temp);
        return Err(err);
    }

    if let Err(err) = fs::rename(&temp, target) {
        if err.kind() == io::ErrorKind::AlreadyExists {
            fs::remove_file(target)
                .context(format!("Failed to replace existing file: {}", target.display()))?;
            fs::rename(&temp, target).context(format!(
                "Atomic swap failed: {} -> {}",
                temp.display(),
                target.display()
            ))?;
        } else {
            let _ = fs::remove_file(&temp);
            return Err(VaultError::Io {
                source: err,
                context: Some(
                    format!("Atomic swap failed: {} -> {}", temp.display(), target.display())
                        .into(),
                ),
            });
        }
    }

    sync_dir(&parent);
    debug!(path = %target.display(), bytes = data.len(), "Vault file saved atomically");
    Ok(())
}

fn write_synced(temp: &Path, data: &[u8]) -> Result<(), VaultError> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp)
        .context(format!("Temp creation failed: {}", temp.display()))?;
    file.write_all(data).context("Write failed")?;
    file.sync_all().context("Hardware sync failed")?;
    Ok(())
}

fn sync_dir(path: &Path) {
    match fs::File::open(path) {
        Ok(dir) => {
            if let Err(err) = dir.sync_all() {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn unique_tmp_path(target: &Path) -> PathBuf {
    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("vault");
    target.with_file_name(format!("{file_name}.tzpwtmp.{}.{counter}", std::process::id()))
}
