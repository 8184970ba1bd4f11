//! Development stand-in for the hardware device.
//!
//! The master secret of a [`SoftOracle`] lives hex-encoded in `oracle.seed_file`. Button
//! presses become `[y/N]` prompts on stderr unless `oracle.auto_confirm` is set.

use crate::config::OracleSettings;
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tzpass_oracle::{ConfirmRequest, SECRET_LEN, SoftOracle, TimedOracle};
use zeroize::Zeroizing;

pub type Device = TimedOracle<SoftOracle>;

/// Opens (or creates) the development device described by `settings`.
///
/// # Errors
/// Returns an error if the seed file is unreadable or malformed, or cannot be created.
pub fn open(settings: &OracleSettings) -> Result<Device> {
    let oracle = load_or_create(&settings.seed_file)?;
    let oracle = if settings.auto_confirm { oracle } else { oracle.with_approver(prompt) };
    Ok(TimedOracle::new(oracle, Duration::from_secs(settings.timeout_secs)))
}

fn load_or_create(path: &Path) -> Result<SoftOracle> {
    if path.exists() {
        let text = Zeroizing::new(
            fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?,
        );
        let secret = Zeroizing::new(
            hex::decode(text.trim()).with_context(|| format!("Decoding {}", path.display()))?,
        );
        if secret.len() != SECRET_LEN {
            bail!("{} must hold {SECRET_LEN} hex-encoded bytes", path.display());
        }
        return Ok(SoftOracle::from_slice(&secret)?);
    }

    let oracle = SoftOracle::generate()?;
    write_secret(path, &Zeroizing::new(hex::encode(oracle.secret())))?;
    info!(path = %path.display(), "Generated development device secret");
    Ok(oracle)
}

fn write_secret(path: &Path, hex_secret: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).with_context(|| format!("Creating {}", path.display()))?;
    file.write_all(hex_secret.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[allow(clippy::print_stderr)]
fn prompt(request: &ConfirmRequest<'_>) -> bool {
    eprint!("[device] {} {} \"{}\"? [y/N] ", request.operation, request.node, request.label);
    let _ = io::stderr().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(err) => {
            warn!(error = %err, "Could not read confirmation");
            false
        },
    }
}
