//! The secrets store: create/read/update/delete/list over the blob.
//!
//! There is no in-memory cache.  Every call re-reads the blob, works on the
//! decoded collection and, for mutations, re-encodes and writes the whole
//! thing back before rebuilding the name index.  What is on disk is the
//! truth; a failed write leaves nothing half-committed in memory.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::codec::BlobCodec;
use super::index::NameIndex;
use super::ports::{BlobPort, FileBlobPort, IndexPort, JsonIndexPort};
use super::secret::{Secret, SecretInput, SecretMetadata};
use crate::config::Settings;
use crate::crypto::SecureStorage;
use crate::errors::{Result, SecretsError};

/// Whether `save` created a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

impl SaveOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "added",
            Self::Updated => "updated",
        }
    }
}

pub struct SecretsStore {
    codec: BlobCodec,
    blob: Box<dyn BlobPort>,
    index: NameIndex,
}

impl SecretsStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn new(
        codec: BlobCodec,
        blob: impl BlobPort + 'static,
        index: impl IndexPort + 'static,
    ) -> Self {
        Self {
            codec,
            blob: Box::new(blob),
            index: NameIndex::new(index),
        }
    }

    /// Store backed by the files named in `settings`.
    pub fn open(settings: &Settings, storage: impl SecureStorage + 'static) -> Self {
        let secrets_path = settings.secrets_path();
        let index_path = settings.index_path();
        debug!(
            secrets = %secrets_path.display(),
            index = %index_path.display(),
            "opening secrets store"
        );

        Self::new(
            BlobCodec::new(storage),
            FileBlobPort::new(secrets_path),
            JsonIndexPort::new(index_path),
        )
    }

    pub fn is_encryption_available(&self) -> bool {
        self.codec.is_encryption_available()
    }

    // ------------------------------------------------------------------
    // Index-only reads
    // ------------------------------------------------------------------

    /// All secret names, straight from the index.  Never decrypts.
    pub fn list_names(&self) -> Result<Vec<String>> {
        self.index.all()
    }

    /// Membership test against the index.  Never decrypts.
    pub fn exists(&self, name: &str) -> Result<bool> {
        self.index.contains(name)
    }

    // ------------------------------------------------------------------
    // Decrypting reads
    // ------------------------------------------------------------------

    /// Every record projected to metadata (no values).
    pub fn list_metadata(&self) -> Result<Vec<SecretMetadata>> {
        Ok(self.load()?.iter().map(Secret::metadata).collect())
    }

    /// Every record, values included.
    pub fn list_secrets(&self) -> Result<Vec<Secret>> {
        self.load()
    }

    /// A single record by name.
    ///
    /// `NotFound` if the index does not know the name; `IndexInconsistency`
    /// if the index knows it but the decrypted collection does not.  The
    /// latter is left for the caller to repair with `reconcile`.
    pub fn get(&self, name: &str) -> Result<Secret> {
        if !self.exists(name)? {
            return Err(SecretsError::NotFound);
        }

        self.load()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                warn!(name, "index lists secret but the secrets file does not contain it");
                SecretsError::IndexInconsistency
            })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add or replace a record.
    ///
    /// A replacement keeps the original `created_at`; `updated_at` always
    /// moves forward.  An empty `value` is accepted, a missing one is not.
    pub fn save(&self, input: SecretInput) -> Result<SaveOutcome> {
        let SecretInput {
            name,
            value,
            description,
        } = input;

        let value = match value {
            Some(v) if !name.is_empty() => v,
            _ => return Err(SecretsError::Validation),
        };

        let mut collection = self.load()?;
        let now = Utc::now();

        let outcome = match collection.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                let created_at = existing.created_at.unwrap_or(now);
                *existing = Secret {
                    name: name.clone(),
                    value,
                    description,
                    created_at: Some(created_at),
                    updated_at: Some(advance(existing.updated_at, now)),
                };
                SaveOutcome::Updated
            }
            None => {
                collection.push(Secret {
                    name: name.clone(),
                    value,
                    description,
                    created_at: Some(now),
                    updated_at: Some(now),
                });
                SaveOutcome::Created
            }
        };

        self.persist(&collection)?;
        info!(name = %name, outcome = outcome.as_str(), "secret saved");
        Ok(outcome)
    }

    /// Remove a record.
    ///
    /// `NotFound` if the index does not know the name.  If the index knows
    /// it but the collection does not, the removal is a no-op and the
    /// rewrite that follows brings the index back in line.
    pub fn delete(&self, name: &str) -> Result<()> {
        if !self.exists(name)? {
            return Err(SecretsError::NotFound);
        }

        let mut collection = self.load()?;
        let before = collection.len();
        collection.retain(|s| s.name != name);

        if collection.len() == before {
            debug!(name, "secret already absent from secrets file");
        }

        self.persist(&collection)?;
        info!(name, "secret deleted");
        Ok(())
    }

    /// Rebuild the name index from the decrypted collection.
    ///
    /// Returns the number of names now indexed.
    pub fn reconcile(&self) -> Result<usize> {
        self.index.reconcile(|| self.load())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Decode the persisted collection.  No blob yet means an empty one.
    fn load(&self) -> Result<Vec<Secret>> {
        match self.blob.read()? {
            Some(bytes) => self.codec.decode(&bytes),
            None => {
                debug!("no secrets file yet, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Encode and write the whole collection, then rebuild the index.
    ///
    /// Encoding happens before anything touches storage, so an encryption
    /// failure never overwrites the existing blob.
    fn persist(&self, collection: &[Secret]) -> Result<()> {
        let blob = self.codec.encode(collection)?;
        self.blob.write(&blob)?;
        self.index.rebuild_from(collection)
    }
}

/// `now`, unless the clock has not moved past `previous`; then just after it.
fn advance(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + Duration::milliseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::StaticKeyStorage;
    use crate::vault::ports::{MemoryBlobPort, MemoryIndexPort};

    fn store() -> (SecretsStore, MemoryBlobPort, MemoryIndexPort) {
        let blob = MemoryBlobPort::new();
        let index = MemoryIndexPort::new();
        let store = SecretsStore::new(
            BlobCodec::new(StaticKeyStorage::generate()),
            blob.clone(),
            index.clone(),
        );
        (store, blob, index)
    }

    #[test]
    fn advance_is_strictly_monotonic() {
        let t = Utc::now();
        assert_eq!(advance(None, t), t);
        assert!(advance(Some(t), t) > t);
        assert!(advance(Some(t + Duration::seconds(5)), t) > t + Duration::seconds(5));
        let later = t + Duration::seconds(1);
        assert_eq!(advance(Some(t), later), later);
    }

    #[test]
    fn save_reports_created_then_updated() {
        let (store, _, _) = store();
        assert_eq!(
            store.save(SecretInput::new("k", "1")).unwrap(),
            SaveOutcome::Created
        );
        assert_eq!(
            store.save(SecretInput::new("k", "2")).unwrap(),
            SaveOutcome::Updated
        );
        assert_eq!(store.list_names().unwrap(), vec!["k"]);
    }

    #[test]
    fn save_rejects_empty_name_and_missing_value() {
        let (store, blob, _) = store();

        let err = store.save(SecretInput::new("", "v")).unwrap_err();
        assert!(matches!(err, SecretsError::Validation));

        let missing = SecretInput {
            name: "k".into(),
            value: None,
            description: None,
        };
        assert!(matches!(store.save(missing), Err(SecretsError::Validation)));
        assert_eq!(blob.write_count(), 0);
    }

    #[test]
    fn get_distinguishes_absence_from_drift() {
        let (store, _, index) = store();
        assert!(matches!(store.get("nope"), Err(SecretsError::NotFound)));

        index.set_names(vec!["ghost".into()]);
        assert!(matches!(
            store.get("ghost"),
            Err(SecretsError::IndexInconsistency)
        ));

        store.reconcile().unwrap();
        assert!(matches!(store.get("ghost"), Err(SecretsError::NotFound)));
    }

    #[test]
    fn delete_of_drifted_name_repairs_index() {
        let (store, _, index) = store();
        store.save(SecretInput::new("real", "v")).unwrap();
        index.set_names(vec!["real".into(), "ghost".into()]);

        store.delete("ghost").unwrap();

        assert_eq!(index.names(), vec!["real"]);
        assert_eq!(store.get("real").unwrap().value, "v");
    }

    #[test]
    fn failed_blob_write_leaves_previous_state() {
        let (store, blob, index) = store();
        store.save(SecretInput::new("a", "1")).unwrap();

        blob.set_fail_writes(true);
        let err = store.save(SecretInput::new("a", "2")).unwrap_err();
        assert!(matches!(err, SecretsError::PersistenceFailure(_)));

        blob.set_fail_writes(false);
        assert_eq!(store.get("a").unwrap().value, "1");
        assert_eq!(index.names(), vec!["a"]);
    }

    #[test]
    fn index_write_failure_after_blob_commit_is_repaired_by_reconcile() {
        let (store, blob, index) = store();
        index.set_fail_writes(true);

        let err = store.save(SecretInput::new("a", "1")).unwrap_err();
        assert!(matches!(err, SecretsError::PersistenceFailure(_)));
        assert_eq!(blob.write_count(), 1);
        assert!(index.names().is_empty());
        assert!(matches!(store.get("a"), Err(SecretsError::NotFound)));

        index.set_fail_writes(false);
        assert_eq!(store.reconcile().unwrap(), 1);
        assert_eq!(store.get("a").unwrap().value, "1");
    }
}
