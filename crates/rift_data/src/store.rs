//! Durable store contract and concrete stores.
//!
//! [`DocumentStore::open`] yields the single-writer [`DocumentHandle`] for a
//! record key. Open and close suspend (pending I/O); read and write operate
//! on the already-loaded record. Both bundled stores hold a session lock per
//! key: a second `open` while a handle is outstanding is refused, which backs
//! the "at most one open handle per participant" invariant.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::record::PlayerRecord;

/// Failures surfaced by a durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("store i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes did not decode as a record.
    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A handle for this key is already open.
    #[error("record '{0}' is already open")]
    Locked(String),
}

/// Single-writer access to one participant's durable record.
pub trait DocumentHandle: Send + 'static {
    /// Returns the current in-memory record.
    fn read(&self) -> PlayerRecord;

    /// Replace the record and persist it.
    fn write(&mut self, record: PlayerRecord) -> Result<(), StoreError>;

    /// Flush and release the handle, unlocking the key.
    fn close(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// An opaque durable document store.
pub trait DocumentStore: Send + Sync + 'static {
    /// The handle type produced by [`DocumentStore::open`].
    type Handle: DocumentHandle;

    /// Open the record under `key`, seeding it with `seed` when absent.
    fn open(
        &self,
        key: &str,
        seed: PlayerRecord,
    ) -> impl Future<Output = Result<Self::Handle, StoreError>> + Send;
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Mutex<std::collections::HashMap<String, PlayerRecord>>,
    open_keys: Mutex<HashSet<String>>,
}

/// In-memory store for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored record for `key`, bypassing the handle. Intended
    /// for assertions in tests.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<PlayerRecord> {
        self.inner
            .records
            .lock()
            .ok()
            .and_then(|records| records.get(key).cloned())
    }

    /// Returns `true` while a handle for `key` is open.
    #[must_use]
    pub fn is_open(&self, key: &str) -> bool {
        self.inner
            .open_keys
            .lock()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    fn lock_key(&self, key: &str) -> Result<(), StoreError> {
        let mut keys = self
            .inner
            .open_keys
            .lock()
            .map_err(|_| StoreError::Locked(key.to_string()))?;
        if !keys.insert(key.to_string()) {
            return Err(StoreError::Locked(key.to_string()));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    type Handle = MemoryHandle;

    async fn open(&self, key: &str, seed: PlayerRecord) -> Result<Self::Handle, StoreError> {
        self.lock_key(key)?;
        let record = {
            let mut records = self
                .inner
                .records
                .lock()
                .map_err(|_| StoreError::Locked(key.to_string()))?;
            records.entry(key.to_string()).or_insert(seed).clone()
        };
        Ok(MemoryHandle {
            key: key.to_string(),
            record,
            inner: Arc::clone(&self.inner),
        })
    }
}

/// Handle into a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryHandle {
    key: String,
    record: PlayerRecord,
    inner: Arc<MemoryInner>,
}

impl DocumentHandle for MemoryHandle {
    fn read(&self) -> PlayerRecord {
        self.record.clone()
    }

    fn write(&mut self, record: PlayerRecord) -> Result<(), StoreError> {
        let mut records = self
            .inner
            .records
            .lock()
            .map_err(|_| StoreError::Locked(self.key.clone()))?;
        records.insert(self.key.clone(), record.clone());
        self.record = record;
        Ok(())
    }

    async fn close(self) -> Result<(), StoreError> {
        if let Ok(mut keys) = self.inner.open_keys.lock() {
            keys.remove(&self.key);
        }
        Ok(())
    }
}

/// File-backed store: one JSON document per record key under a data
/// directory. Writes are write-through.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    open_keys: Arc<Mutex<HashSet<String>>>,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            open_keys: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DocumentStore for JsonFileStore {
    type Handle = JsonFileHandle;

    async fn open(&self, key: &str, seed: PlayerRecord) -> Result<Self::Handle, StoreError> {
        {
            let mut keys = self
                .open_keys
                .lock()
                .map_err(|_| StoreError::Locked(key.to_string()))?;
            if !keys.insert(key.to_string()) {
                return Err(StoreError::Locked(key.to_string()));
            }
        }
        let path = self.path_for(key);
        let loaded: Result<PlayerRecord, StoreError> = if path.exists() {
            std::fs::read(&path)
                .map_err(StoreError::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(StoreError::from))
        } else {
            Ok(seed)
        };
        let record = match loaded {
            Ok(record) => record,
            Err(e) => {
                // Failed opens must not leave the key locked.
                if let Ok(mut keys) = self.open_keys.lock() {
                    keys.remove(key);
                }
                return Err(e);
            }
        };
        Ok(JsonFileHandle {
            key: key.to_string(),
            path,
            record,
            open_keys: Arc::clone(&self.open_keys),
        })
    }
}

/// Handle into a [`JsonFileStore`].
#[derive(Debug)]
pub struct JsonFileHandle {
    key: String,
    path: PathBuf,
    record: PlayerRecord,
    open_keys: Arc<Mutex<HashSet<String>>>,
}

impl DocumentHandle for JsonFileHandle {
    fn read(&self) -> PlayerRecord {
        self.record.clone()
    }

    fn write(&mut self, record: PlayerRecord) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&record)?;
        std::fs::write(&self.path, bytes)?;
        self.record = record;
        Ok(())
    }

    async fn close(self) -> Result<(), StoreError> {
        if let Ok(mut keys) = self.open_keys.lock() {
            keys.remove(&self.key);
        }
        Ok(())
    }
}
