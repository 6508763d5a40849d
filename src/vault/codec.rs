//! Encrypted blob codec.
//!
//! Turns the whole secrets collection into one opaque byte blob and back:
//!
//! ```text
//! encode: Vec<Secret> -> JSON array -> SecureStorage::encrypt -> bytes
//! decode: bytes -> SecureStorage::decrypt -> JSON array -> Vec<Secret>
//! ```
//!
//! The codec knows nothing about names being unique; that is the store's job.
//! Plaintext JSON buffers are zeroized as soon as they are consumed.

use zeroize::Zeroizing;

use super::secret::Secret;
use crate::crypto::SecureStorage;
use crate::errors::{Result, SecretsError};

pub struct BlobCodec {
    storage: Box<dyn SecureStorage>,
}

impl BlobCodec {
    pub fn new(storage: impl SecureStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Capability query, independent of any encode/decode call.
    pub fn is_encryption_available(&self) -> bool {
        self.storage.is_encryption_available()
    }

    /// Serialize and seal a collection.
    pub fn encode(&self, collection: &[Secret]) -> Result<Vec<u8>> {
        if !self.is_encryption_available() {
            return Err(SecretsError::EncryptionUnavailable);
        }

        let json = Zeroizing::new(serde_json::to_vec(collection).map_err(|e| {
            SecretsError::PersistenceFailure(format!("failed to serialize secrets: {e}"))
        })?);

        self.storage.encrypt(&json)
    }

    /// Unseal and parse a blob produced by `encode`.
    pub fn decode(&self, blob: &[u8]) -> Result<Vec<Secret>> {
        if !self.is_encryption_available() {
            return Err(SecretsError::EncryptionUnavailable);
        }

        let json = Zeroizing::new(self.storage.decrypt(blob)?);

        serde_json::from_slice(&json)
            .map_err(|e| SecretsError::CorruptData(format!("decrypted data is not a secrets list: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::StaticKeyStorage;

    fn secret(name: &str, value: &str) -> Secret {
        Secret {
            name: name.into(),
            value: value.into(),
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn encode_then_decode_returns_same_collection() {
        let codec = BlobCodec::new(StaticKeyStorage::generate());
        let collection = vec![secret("b", "2"), secret("a", "1")];

        let blob = codec.encode(&collection).unwrap();
        assert_eq!(codec.decode(&blob).unwrap(), collection);
    }

    #[test]
    fn blob_does_not_contain_plaintext() {
        let codec = BlobCodec::new(StaticKeyStorage::generate());
        let blob = codec.encode(&[secret("api-key", "plaintext-marker")]).unwrap();

        let haystack = String::from_utf8_lossy(&blob);
        assert!(!haystack.contains("plaintext-marker"));
        assert!(!haystack.contains("api-key"));
    }

    #[test]
    fn unavailable_encryption_fails_both_ways() {
        let codec = BlobCodec::new(StaticKeyStorage::unavailable());
        assert!(!codec.is_encryption_available());
        assert!(matches!(
            codec.encode(&[]),
            Err(SecretsError::EncryptionUnavailable)
        ));
        assert!(matches!(
            codec.decode(b"anything"),
            Err(SecretsError::EncryptionUnavailable)
        ));
    }

    #[test]
    fn sealed_non_list_json_is_corrupt() {
        let storage = StaticKeyStorage::generate();
        let sealed = storage.encrypt(br#"{"secrets": "nope"}"#).unwrap();
        let codec = BlobCodec::new(storage);

        assert!(matches!(
            codec.decode(&sealed),
            Err(SecretsError::CorruptData(_))
        ));
    }
}
