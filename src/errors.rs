use thiserror::Error;

/// All errors that can occur in SecretSafe.
///
/// The `Display` text of each variant is what the IPC boundary hands back
/// to the GUI in `{success: false, error}`, so keep it human-readable.
#[derive(Debug, Error)]
pub enum SecretsError {
    // --- Store errors ---
    #[error("Name and value are required")]
    Validation,

    #[error("Secret not found")]
    NotFound,

    #[error("Secret not found (index mismatch)")]
    IndexInconsistency,

    // --- Codec errors ---
    #[error("Encryption is not available on this system")]
    EncryptionUnavailable,

    #[error("Secrets file is corrupt or unreadable: {0}")]
    CorruptData(String),

    // --- Persistence errors ---
    #[error("Failed to save secrets: {0}")]
    PersistenceFailure(String),

    // --- Keyring errors ---
    #[error("Keyring error: {0}")]
    Keyring(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    Audit(String),

    // --- Boundary errors ---
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SecretsError {
    /// Stable short code for the error, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not-found",
            Self::IndexInconsistency => "index-inconsistency",
            Self::EncryptionUnavailable => "encryption-unavailable",
            Self::CorruptData(_) => "corrupt-data",
            Self::PersistenceFailure(_) => "persistence-failure",
            Self::Keyring(_) => "keyring",
            Self::Config(_) => "config",
            Self::Audit(_) => "audit",
            Self::InvalidRequest(_) => "invalid-request",
            Self::UnknownChannel(_) => "unknown-channel",
            Self::Io(_) => "io",
        }
    }
}

/// Convenience type alias for SecretSafe results.
pub type Result<T> = std::result::Result<T, SecretsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_is_stable() {
        assert_eq!(SecretsError::NotFound.to_string(), "Secret not found");
    }

    #[test]
    fn index_inconsistency_is_distinct_from_not_found() {
        let msg = SecretsError::IndexInconsistency.to_string();
        assert_ne!(msg, SecretsError::NotFound.to_string());
        assert!(msg.contains("index mismatch"));
        assert_eq!(SecretsError::IndexInconsistency.kind(), "index-inconsistency");
    }

    #[test]
    fn io_errors_convert() {
        let err: SecretsError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().contains("disk gone"));
    }
}
