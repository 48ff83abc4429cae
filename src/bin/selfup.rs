//! CLI binary for selfup.

use clap::{Parser, Subcommand};
use selfup::update::UpdateOutcome;
use selfup::{Updater, UpdaterConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// selfup: replace this executable with the latest published release.
#[derive(Parser)]
#[command(name = "selfup", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Download and install the latest release if it is newer.
    Update,

    /// Report whether a newer release is available without installing it.
    Check,
}

fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries the human-readable outcome.
    // Override with RUST_LOG=debug to see every step.
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("selfup=info")),
        )
        .finish();
    let logger = Dispatch::new(subscriber);
    tracing::dispatcher::set_global_default(logger.clone())?;

    let version = env!("CARGO_PKG_VERSION");
    println!("selfup {version}");

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let updater = Updater::from_config(&config, version).with_logger(logger);

    let code = match cli.command {
        Command::Update => run_update(&updater),
        Command::Check => run_check(&updater),
    };
    Ok(code)
}

/// Explicit path if given, otherwise the default path when it exists,
/// otherwise built-in defaults.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<UpdaterConfig> {
    if let Some(path) = path {
        return Ok(UpdaterConfig::from_file(path)?);
    }
    let default_path = UpdaterConfig::default_config_path();
    if default_path.is_file() {
        tracing::debug!(path = %default_path.display(), "loading default config");
        return Ok(UpdaterConfig::from_file(&default_path)?);
    }
    Ok(UpdaterConfig::default())
}

fn run_update(updater: &Updater) -> ExitCode {
    match updater.run() {
        Ok(UpdateOutcome::Updated { to, binary, .. }) => {
            println!("Update completed successfully! Installed {to} at {}", binary.display());
            ExitCode::SUCCESS
        }
        Ok(UpdateOutcome::AlreadyUpToDate { .. }) => {
            println!("Already up-to-date");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Update failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_check(updater: &Updater) -> ExitCode {
    match updater.check() {
        Ok(check) if check.update_available => {
            println!("Update available: {} -> {}", check.current, check.latest);
            ExitCode::SUCCESS
        }
        Ok(check) => {
            println!("Already up-to-date ({}, latest {})", check.current, check.latest);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Check failed: {e}");
            ExitCode::FAILURE
        }
    }
}
