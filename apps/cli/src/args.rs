//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tzpass")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Password vault unlocked by a hardware key-wrap device")]
pub struct Cli {
    /// Configuration file (defaults to ./tzpass.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Vault file, overriding `vault.path`
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create an empty vault file
    Init,
    /// List password groups
    Groups,
    /// Create a password group
    AddGroup { name: String },
    /// Delete a password group and all its passwords
    RemoveGroup { name: String },
    /// Rename a group, re-encrypting every password under the new name
    RenameGroup { old: String, new: String },
    /// List the keys stored in a group
    List { group: String },
    /// Add a password (read from stdin) to a group
    Add { group: String, key: String },
    /// Replace the key and password (read from stdin) at an index
    Update { group: String, index: usize, key: String },
    /// Decrypt and print a password
    Show { group: String, index: usize },
    /// Delete the password at an index; later indices shift down
    Remove { group: String, index: usize },
    /// Generate the vault's offline backup key pair
    BackupInit,
    /// Encrypt a small file to the backup public key
    BackupSeal { input: PathBuf, output: PathBuf },
    /// Decrypt a sealed file with the recovered backup key
    BackupOpen { input: PathBuf, output: PathBuf },
}
