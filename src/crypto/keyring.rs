//! OS keyring access for the data key.
//!
//! Stores and retrieves the base64-encoded data key from the operating
//! system's secure credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: kernel keyutils
//!
//! All operations fail gracefully: if the keyring is unavailable, the
//! error is returned and the caller reports encryption as unavailable.

use crate::errors::{Result, SecretsError};

/// Account name of the data key entry inside the service.
const ACCOUNT: &str = "data-key";

fn entry(service: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(service, ACCOUNT)
        .map_err(|e| SecretsError::Keyring(format!("failed to create keyring entry: {e}")))
}

/// Store the encoded data key in the OS keyring.
pub fn store_key(service: &str, encoded: &str) -> Result<()> {
    entry(service)?
        .set_password(encoded)
        .map_err(|e| SecretsError::Keyring(format!("failed to store data key in keyring: {e}")))
}

/// Retrieve the encoded data key.
///
/// Returns `None` if no key has been stored yet (rather than an error).
pub fn load_key(service: &str) -> Result<Option<String>> {
    match entry(service)?.get_password() {
        Ok(encoded) => Ok(Some(encoded)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(SecretsError::Keyring(format!(
            "failed to read from keyring: {e}"
        ))),
    }
}

/// Returns `true` when the keyring answers at all, with or without an entry.
pub fn probe(service: &str) -> bool {
    load_key(service).is_ok()
}
