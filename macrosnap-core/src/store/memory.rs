//! In-memory store for tests and dry runs.
//!
//! Clones share the same underlying object, so a test can hand one clone to a
//! `TableStore` and inspect the other afterwards.

use super::{ObjectStore, StoreError};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    object: Option<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `bytes`.
    pub fn with_object(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.lock().object = Some(bytes.into());
        store
    }

    /// Every `get` fails with a network error.
    pub fn failing_reads(self) -> Self {
        self.lock().fail_reads = true;
        self
    }

    /// Every `put` fails with a network error.
    pub fn failing_writes(self) -> Self {
        self.lock().fail_writes = true;
        self
    }

    pub fn object(&self) -> Option<Vec<u8>> {
        self.lock().object.clone()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the state half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryStore {
    fn location(&self) -> String {
        "memory://table".to_string()
    }

    fn get(&self) -> Result<Vec<u8>, StoreError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(StoreError::Network("simulated read failure".into()));
        }
        state
            .object
            .clone()
            .ok_or_else(|| StoreError::NotFound(self.location()))
    }

    fn put(&self, bytes: &[u8], _content_type: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::Network("simulated write failure".into()));
        }
        state.object = Some(bytes.to_vec());
        state.writes += 1;
        Ok(())
    }
}
