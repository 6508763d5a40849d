//! Host secure-storage facility.
//!
//! SecretSafe never derives keys itself.  The 32-byte data key lives in the
//! operating system's credential store and the blob is sealed with it using
//! AES-256-GCM.  `SecureStorage` is the seam: the codec only sees
//! "encrypt these bytes" / "decrypt these bytes" and a capability query.
//!
//! The sealed layout is defined in `encryption`.

use std::cell::OnceCell;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::encryption;
pub use super::encryption::KEY_LEN;
use crate::errors::{Result, SecretsError};

/// Environment variable that overrides the keyring (base64, 32 bytes).
pub const MASTER_KEY_ENV: &str = "SECRETSAFE_MASTER_KEY";

/// Anything that can seal and unseal bytes with host-held key material.
pub trait SecureStorage: Send {
    /// Whether the facility can be used right now.
    fn is_encryption_available(&self) -> bool;

    /// Seal `plaintext`.  Fails with `EncryptionUnavailable` when there is
    /// no usable key material.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Unseal a blob produced by `encrypt`.  Tampered, truncated or foreign
    /// blobs fail with `CorruptData`.
    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>>;
}

/// A 32-byte data key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DataKey {
    bytes: [u8; KEY_LEN],
}

impl DataKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Parse a base64-encoded key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| SecretsError::Keyring(format!("data key is not valid base64: {e}")))?;

        if raw.len() != KEY_LEN {
            let len = raw.len();
            raw.zeroize();
            return Err(SecretsError::Keyring(format!(
                "data key must decode to exactly {KEY_LEN} bytes, got {len}"
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&raw);
        raw.zeroize();
        let key = Self::new(bytes);
        bytes.zeroize();
        Ok(key)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

fn seal(key: &DataKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    encryption::seal(key.as_bytes(), plaintext)
}

fn unseal(key: &DataKey, sealed: &[u8]) -> Result<Vec<u8>> {
    encryption::open(key.as_bytes(), sealed)
}

fn key_from_env() -> Option<Result<DataKey>> {
    match std::env::var(MASTER_KEY_ENV) {
        Ok(encoded) if !encoded.trim().is_empty() => Some(DataKey::from_base64(&encoded)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// KeyringStorage
// ---------------------------------------------------------------------------

/// Production backend: data key from `SECRETSAFE_MASTER_KEY` or the OS keyring.
///
/// The keyring is not touched until the first seal/unseal or capability
/// query, so building one is free.  Once resolved the key is cached for the
/// lifetime of the value.
pub struct KeyringStorage {
    service: String,
    key: OnceCell<DataKey>,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: OnceCell::new(),
        }
    }

    /// The resolved key.  With `create`, a missing keyring entry is filled
    /// with a freshly generated key; without it, a missing entry means any
    /// existing blob cannot be opened.
    fn key(&self, create: bool) -> Result<&DataKey> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        let resolved = match key_from_env() {
            Some(result) => {
                debug!("using data key from {MASTER_KEY_ENV}");
                result?
            }
            None => self.key_from_keyring(create)?,
        };

        // Single-threaded; the cell cannot have been filled in between.
        let _ = self.key.set(resolved);
        self.key.get().ok_or(SecretsError::EncryptionUnavailable)
    }

    #[cfg(feature = "keyring-store")]
    fn key_from_keyring(&self, create: bool) -> Result<DataKey> {
        match super::keyring::load_key(&self.service) {
            Ok(Some(encoded)) => {
                debug!(service = %self.service, "using data key from OS keyring");
                DataKey::from_base64(&encoded)
            }
            Ok(None) if create => {
                debug!(service = %self.service, "generating new data key in OS keyring");
                let key = DataKey::generate();
                super::keyring::store_key(&self.service, &key.to_base64())?;
                Ok(key)
            }
            Ok(None) => Err(SecretsError::CorruptData(
                "no data key in the OS keyring for this secrets file".into(),
            )),
            Err(e) => {
                warn!(error = %e, "OS keyring unavailable");
                Err(SecretsError::EncryptionUnavailable)
            }
        }
    }

    #[cfg(not(feature = "keyring-store"))]
    fn key_from_keyring(&self, _create: bool) -> Result<DataKey> {
        debug!(service = %self.service, "built without keyring support");
        Err(SecretsError::EncryptionUnavailable)
    }

    #[cfg(feature = "keyring-store")]
    fn keyring_available(&self) -> bool {
        super::keyring::probe(&self.service)
    }

    #[cfg(not(feature = "keyring-store"))]
    fn keyring_available(&self) -> bool {
        false
    }
}

impl SecureStorage for KeyringStorage {
    fn is_encryption_available(&self) -> bool {
        if self.key.get().is_some() {
            return true;
        }
        if let Some(result) = key_from_env() {
            return result.is_ok();
        }
        self.keyring_available()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        seal(self.key(true)?, plaintext)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        unseal(self.key(false)?, sealed)
    }
}

// ---------------------------------------------------------------------------
// StaticKeyStorage
// ---------------------------------------------------------------------------

/// Backend with key material handed in directly, or none at all.
///
/// Used by tests and by embedders that manage the key themselves.
pub struct StaticKeyStorage {
    key: Option<DataKey>,
}

impl StaticKeyStorage {
    pub fn new(key: DataKey) -> Self {
        Self { key: Some(key) }
    }

    /// A backend with a random key.
    pub fn generate() -> Self {
        Self::new(DataKey::generate())
    }

    /// A backend that reports encryption as unavailable.
    pub fn unavailable() -> Self {
        Self { key: None }
    }

    fn key(&self) -> Result<&DataKey> {
        self.key.as_ref().ok_or(SecretsError::EncryptionUnavailable)
    }
}

impl SecureStorage for StaticKeyStorage {
    fn is_encryption_available(&self) -> bool {
        self.key.is_some()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        seal(self.key()?, plaintext)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        unseal(self.key()?, sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_storage_roundtrip_carries_version_tag() {
        let storage = StaticKeyStorage::new(DataKey::new([7u8; KEY_LEN]));
        let sealed = storage.encrypt(b"hello").unwrap();
        assert_eq!(&sealed[..3], b"SS1");
        assert_eq!(storage.decrypt(&sealed).unwrap(), b"hello");
    }

    #[test]
    fn unavailable_storage_refuses_both_directions() {
        let storage = StaticKeyStorage::unavailable();
        assert!(!storage.is_encryption_available());
        assert!(matches!(
            storage.encrypt(b"x"),
            Err(SecretsError::EncryptionUnavailable)
        ));
        assert!(matches!(
            storage.decrypt(b"SS1whatever"),
            Err(SecretsError::EncryptionUnavailable)
        ));
    }

    #[test]
    fn missing_header_is_corrupt() {
        let storage = StaticKeyStorage::generate();
        let mut sealed = storage.encrypt(b"x").unwrap();
        sealed[0] = b'X';
        assert!(matches!(
            storage.decrypt(&sealed),
            Err(SecretsError::CorruptData(_))
        ));
    }

    #[test]
    fn different_keys_cannot_read_each_other() {
        let a = StaticKeyStorage::generate();
        let b = StaticKeyStorage::generate();
        let sealed = a.encrypt(b"secret").unwrap();
        assert!(matches!(b.decrypt(&sealed), Err(SecretsError::CorruptData(_))));
    }

    #[test]
    fn data_key_base64_roundtrip() {
        let key = DataKey::generate();
        let parsed = DataKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key.as_bytes(), parsed.as_bytes());
    }

    #[test]
    fn data_key_rejects_wrong_length() {
        let short = BASE64.encode([1u8; 16]);
        assert!(DataKey::from_base64(&short).is_err());
        assert!(DataKey::from_base64("not base64 at all!").is_err());
    }
}
