//! `secretsafe serve` — answer JSON-lines requests on stdin.

use std::io;

use tracing::info;

use crate::cli::{build_dispatcher, output};
use crate::config::Settings;
use crate::errors::Result;
use crate::ipc;

/// Execute the `serve` command.
pub fn execute(settings: &Settings) -> Result<()> {
    let dispatcher = build_dispatcher(settings)?;

    if !dispatcher.check_encryption_available() {
        output::warning("Encryption is not available: reads of existing secrets and all saves will fail.");
    }

    info!(data_dir = %settings.data_dir().display(), "serving requests on stdin");
    let stdin = io::stdin();
    let stdout = io::stdout();
    ipc::serve(&dispatcher, stdin.lock(), stdout.lock())?;

    Ok(())
}
