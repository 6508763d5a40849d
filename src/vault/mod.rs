//! Vault module — the secrets persistence core.
//!
//! This module provides:
//! - `Secret`, `SecretInput` and `SecretMetadata` types (`secret`)
//! - The encrypted blob codec (`codec`)
//! - Blob and index persistence ports, on disk and in memory (`ports`)
//! - The plaintext name index (`index`)
//! - High-level `SecretsStore` for CRUD over the blob (`store`)

pub mod codec;
pub mod index;
pub mod ports;
pub mod secret;
pub mod store;

// Re-export the most commonly used items.
pub use codec::BlobCodec;
pub use index::NameIndex;
pub use ports::{BlobPort, FileBlobPort, IndexPort, JsonIndexPort, MemoryBlobPort, MemoryIndexPort};
pub use secret::{Secret, SecretInput, SecretMetadata};
pub use store::{SaveOutcome, SecretsStore};
