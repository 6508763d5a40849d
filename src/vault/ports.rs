//! Persistence ports.
//!
//! The store never touches the filesystem directly.  It talks to two ports:
//!
//! - a `BlobPort` holding the encrypted collection (opaque bytes), and
//! - an `IndexPort` holding the plaintext list of secret names.
//!
//! On-disk implementations write atomically (temp file + rename).  The
//! in-memory implementations share their state between clones so a test can
//! keep a handle, hand a clone to the store, and then inspect or corrupt
//! what was written.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{Result, SecretsError};

/// Key under which the index file keeps the list of names.
pub const SECRET_NAMES_KEY: &str = "secretNames";

/// Storage for the encrypted collection.
pub trait BlobPort: Send {
    /// The stored bytes, or `None` if nothing has been written yet.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored bytes.  Fails with `PersistenceFailure`.
    fn write(&self, bytes: &[u8]) -> Result<()>;
}

/// Storage for the plaintext name index.
pub trait IndexPort: Send {
    /// The stored names; empty when nothing has been stored.
    fn load(&self) -> Result<Vec<String>>;

    /// Replace the stored names.  Fails with `PersistenceFailure`.
    fn store(&self, names: &[String]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// On-disk ports
// ---------------------------------------------------------------------------

/// Write `bytes` to `path` **atomically**.
///
/// The temp file is in the same directory so the rename stays on one
/// filesystem.  With `private`, the file is created owner-only on Unix.
fn write_atomic(path: &Path, bytes: &[u8], private: bool) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    fs::rename(&tmp_path, path)
}

/// Encrypted blob kept in a single file.
pub struct FileBlobPort {
    path: PathBuf,
}

impl FileBlobPort {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobPort for FileBlobPort {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        write_atomic(&self.path, bytes, true).map_err(|e| {
            SecretsError::PersistenceFailure(format!("{}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), len = bytes.len(), "wrote secrets file");
        Ok(())
    }
}

/// Plaintext key/value JSON file holding the index under `secretNames`.
///
/// Other top-level keys in the file are preserved on every write.  An
/// unreadable file is treated as empty; reconciliation rewrites it.
pub struct JsonIndexPort {
    path: PathBuf,
}

impl JsonIndexPort {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        let contents = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "index file is not a JSON object, ignoring it");
                Ok(Map::new())
            }
        }
    }
}

impl IndexPort for JsonIndexPort {
    fn load(&self) -> Result<Vec<String>> {
        let mut map = self.read_map()?;
        match map.remove(SECRET_NAMES_KEY) {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "`{SECRET_NAMES_KEY}` is not a list of strings, ignoring it");
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    fn store(&self, names: &[String]) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(
            SECRET_NAMES_KEY.to_string(),
            Value::from(names.to_vec()),
        );

        let bytes = serde_json::to_vec_pretty(&Value::Object(map))
            .map_err(|e| SecretsError::PersistenceFailure(format!("index: {e}")))?;

        write_atomic(&self.path, &bytes, false).map_err(|e| {
            SecretsError::PersistenceFailure(format!("{}: {e}", self.path.display()))
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory ports
// ---------------------------------------------------------------------------

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct MemoryBlobState {
    bytes: Option<Vec<u8>>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory blob storage.  Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryBlobPort {
    state: Arc<Mutex<MemoryBlobState>>,
}

impl MemoryBlobPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `write` fail with `PersistenceFailure`.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Current stored bytes.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        lock(&self.state).bytes.clone()
    }

    /// Overwrite the stored bytes behind the store's back.
    pub fn set_bytes(&self, bytes: Option<Vec<u8>>) {
        lock(&self.state).bytes = bytes;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes
    }
}

impl BlobPort for MemoryBlobPort {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(lock(&self.state).bytes.clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(SecretsError::PersistenceFailure(
                "in-memory blob rejected the write".into(),
            ));
        }
        state.bytes = Some(bytes.to_vec());
        state.writes += 1;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryIndexState {
    names: Vec<String>,
    fail_writes: bool,
}

/// In-memory index storage.  Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryIndexPort {
    state: Arc<Mutex<MemoryIndexState>>,
}

impl MemoryIndexPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.state).names.clone()
    }

    /// Overwrite the stored names behind the store's back.
    pub fn set_names(&self, names: Vec<String>) {
        lock(&self.state).names = names;
    }
}

impl IndexPort for MemoryIndexPort {
    fn load(&self) -> Result<Vec<String>> {
        Ok(lock(&self.state).names.clone())
    }

    fn store(&self, names: &[String]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(SecretsError::PersistenceFailure(
                "in-memory index rejected the write".into(),
            ));
        }
        state.names = names.to_vec();
        Ok(())
    }
}
