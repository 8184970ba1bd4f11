#![allow(clippy::print_stderr, clippy::print_stdout)]

use anyhow::Context;
use clap::Parser;
use std::io;
use tzpass_cli::args::Cli;
use tzpass_cli::config::AppConfig;
use tzpass_cli::{commands, device, init_logger};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = AppConfig::load(cli.config.as_deref()).context("Critical: Configuration is malformed")?;
    let _log = init_logger(&cfg.logging)?;

    let oracle = device::open(&cfg.oracle)?;
    let vault_path = cli.vault.unwrap_or(cfg.vault.path);

    // Unlocked handle: confirmation prompts read stdin too.
    commands::execute(&cli.command, &vault_path, &oracle, &mut io::stdout(), &mut io::stdin())
}
