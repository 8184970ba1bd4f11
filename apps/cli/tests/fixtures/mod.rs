#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use tzpass_cli::args::Command;
use tzpass_cli::commands;
use tzpass_oracle::SoftOracle;

/// A fresh vault directory and an approving development device.
#[derive(Debug)]
pub struct Session {
    pub dir: TempDir,
    pub vault: PathBuf,
    pub oracle: SoftOracle,
}

impl Session {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("vault.tzpw");
        Self { dir, vault, oracle: SoftOracle::new([0x5C; 32]) }
    }

    /// Same as [`Session::new`] with `init` already run.
    pub fn initialized() -> Self {
        let session = Self::new();
        session.run(&Command::Init).unwrap();
        session
    }

    pub fn run(&self, command: &Command) -> anyhow::Result<String> {
        self.run_with_input(command, "")
    }

    pub fn run_with_input(&self, command: &Command, input: &str) -> anyhow::Result<String> {
        let mut out = Vec::new();
        commands::execute(command, &self.vault, &self.oracle, &mut out, &mut input.as_bytes())?;
        Ok(String::from_utf8(out).unwrap())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn add_group(name: &str) -> Command {
    Command::AddGroup { name: name.to_owned() }
}

pub fn add(group: &str, key: &str) -> Command {
    Command::Add { group: group.to_owned(), key: key.to_owned() }
}

pub fn show(group: &str, index: usize) -> Command {
    Command::Show { group: group.to_owned(), index }
}

pub fn list(group: &str) -> Command {
    Command::List { group: group.to_owned() }
}
