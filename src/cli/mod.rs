//! CLI module — Clap argument parser, output helpers, and the host commands.
//!
//! The binary is not a user-facing secrets CLI.  It hosts the dispatcher
//! for a GUI process (`serve`) and offers a one-shot `call` for scripts.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::crypto::KeyringStorage;
use crate::errors::Result;
use crate::ipc::Dispatcher;
use crate::vault::SecretsStore;

/// SecretSafe: local encrypted secrets store for desktop apps.
#[derive(Parser)]
#[command(
    name = "secretsafe",
    about = "Local encrypted secrets store for desktop apps",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/secretsafe/config.toml)
    #[arg(long, global = true, env = "SECRETSAFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the secrets file and index (overrides config)
    #[arg(long, global = true, env = "SECRETSAFE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Answer JSON-lines requests on stdin until it closes
    Serve,

    /// Send a single request and print the response
    Call {
        /// Channel name (e.g. get-all-secret-names, get-secret, save-secret)
        channel: String,

        /// Request payload: JSON, or a bare secret name
        payload: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config` (or the default location) and apply
/// command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match cli.config.clone().or_else(Settings::default_path) {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };

    if let Some(dir) = &cli.data_dir {
        settings.data_dir = Some(dir.clone());
    }

    Ok(settings)
}

/// Build the dispatcher over the on-disk store described by `settings`.
pub fn build_dispatcher(settings: &Settings) -> Result<Dispatcher> {
    let data_dir = settings.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let storage = KeyringStorage::new(settings.keyring_service.clone());
    let dispatcher = Dispatcher::new(SecretsStore::open(settings, storage));

    #[cfg(feature = "audit-log")]
    let dispatcher = if settings.audit {
        match crate::audit::AuditLog::open(&data_dir) {
            Some(audit) => dispatcher.with_audit(audit),
            None => dispatcher,
        }
    } else {
        dispatcher
    };

    Ok(dispatcher)
}
