use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SecretsError};

/// Application configuration, loaded from `config.toml`.
///
/// Every field has a sensible default so SecretSafe works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the secrets file, the index and the audit db.
    /// Defaults to the per-user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// File name of the encrypted secrets blob.
    #[serde(default = "default_secrets_file")]
    pub secrets_file: String,

    /// File name of the plaintext name index.
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Service name of the OS keyring entry holding the data key.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Record mutations in `audit.db` (only with the `audit-log` feature).
    #[serde(default = "default_audit")]
    pub audit: bool,

    /// Default tracing filter when `SECRETSAFE_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_secrets_file() -> String {
    "secrets.encrypted".to_string()
}

fn default_index_file() -> String {
    "secrets-index.json".to_string()
}

fn default_keyring_service() -> String {
    APP_NAME.to_string()
}

fn default_audit() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Directory name used under the platform config and data directories.
const APP_NAME: &str = "secretsafe";

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            secrets_file: default_secrets_file(),
            index_file: default_index_file(),
            keyring_service: default_keyring_service(),
            audit: default_audit(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the app's config directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `path`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;

        toml::from_str(&contents).map_err(|e| {
            SecretsError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// `<config_dir>/secretsafe/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(Self::FILE_NAME))
    }

    /// The effective data directory.
    ///
    /// Falls back to `./.secretsafe` on platforms without a data directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from(format!(".{APP_NAME}"))),
        }
    }

    /// Full path of the encrypted secrets file.
    pub fn secrets_path(&self) -> PathBuf {
        self.data_dir().join(&self.secrets_file)
    }

    /// Full path of the name index file.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir().join(&self.index_file)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert!(s.data_dir.is_none());
        assert_eq!(s.secrets_file, "secrets.encrypted");
        assert_eq!(s.index_file, "secrets-index.json");
        assert_eq!(s.keyring_service, "secretsafe");
        assert!(s.audit);
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(settings.secrets_file, "secrets.encrypted");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
data_dir = "/var/lib/secretsafe"
secrets_file = "vault.bin"
index_file = "names.json"
keyring_service = "secretsafe-test"
audit = false
log_level = "debug"
"#;
        let path = tmp.path().join("config.toml");
        fs::write(&path, config).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("/var/lib/secretsafe")));
        assert_eq!(settings.secrets_file, "vault.bin");
        assert_eq!(settings.index_file, "names.json");
        assert_eq!(settings.keyring_service, "secretsafe-test");
        assert!(!settings.audit);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "audit = false\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(!settings.audit);
        // Rest should be defaults
        assert_eq!(settings.index_file, "secrets-index.json");
        assert_eq!(settings.keyring_service, "secretsafe");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "not valid {{toml").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(SecretsError::Config(_))
        ));
    }

    #[test]
    fn paths_join_data_dir() {
        let s = Settings {
            data_dir: Some(PathBuf::from("/home/user/.local/share/secretsafe")),
            ..Settings::default()
        };
        assert_eq!(
            s.secrets_path(),
            PathBuf::from("/home/user/.local/share/secretsafe/secrets.encrypted")
        );
        assert_eq!(
            s.index_path(),
            PathBuf::from("/home/user/.local/share/secretsafe/secrets-index.json")
        );
    }
}
