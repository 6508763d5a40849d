//! Plaintext index of secret names.
//!
//! Answers "does X exist" and "what names are there" without decrypting
//! the blob.  It is a cache: the decrypted collection is authoritative and
//! `reconcile` rebuilds the index from it.

use tracing::info;

use super::ports::IndexPort;
use super::secret::Secret;
use crate::errors::Result;

pub struct NameIndex {
    port: Box<dyn IndexPort>,
}

impl NameIndex {
    pub fn new(port: impl IndexPort + 'static) -> Self {
        Self {
            port: Box::new(port),
        }
    }

    /// Every indexed name, in collection order.
    pub fn all(&self) -> Result<Vec<String>> {
        self.port.load()
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.port.load()?.iter().any(|n| n == name))
    }

    /// Replace the index wholesale with the names in `collection`.
    pub fn rebuild_from(&self, collection: &[Secret]) -> Result<()> {
        let names: Vec<String> = collection.iter().map(|s| s.name.clone()).collect();
        self.port.store(&names)
    }

    /// Load the authoritative collection with `load` and rebuild from it.
    ///
    /// Returns the number of names now indexed.  If `load` fails the index
    /// is left untouched.
    pub fn reconcile<F>(&self, load: F) -> Result<usize>
    where
        F: FnOnce() -> Result<Vec<Secret>>,
    {
        let collection = load()?;
        self.rebuild_from(&collection)?;
        info!(count = collection.len(), "name index reconciled");
        Ok(collection.len())
    }
}
