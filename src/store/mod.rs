//! Store Module
//!
//! In-memory key/value map shared by every connection.
//!
//! ## Responsibilities
//! - Map byte-string keys to byte-string values
//! - Serialize concurrent access from connection workers
//!
//! ## Data Structure Choice
//! HashMap wrapped in a parking_lot RwLock:
//! - No ordering requirements (no flush, no range scans)
//! - Many concurrent GETs, SETs take the lock exclusively

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

/// Thread-safe key/value store
///
/// All methods take `&self`; share it between threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<Bytes, Bytes>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a key (write lock)
    ///
    /// Returns the previous value, if any.
    pub fn set(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Option<Bytes> {
        self.data.write().insert(key.into(), value.into())
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
