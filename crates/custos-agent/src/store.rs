//! Object store collaborator interface
//!
//! The object store is remote, content-addressed, and holds ciphertext
//! only; it has no decryption capability. Calls are fallible and
//! time-boxed by the backend; the session does not retry internally -
//! retries are a caller concern.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Errors from object store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No object exists at the locator
    #[error("Object not found: {locator}")]
    NotFound {
        /// The locator that resolved to nothing
        locator: String,
    },

    /// The backend failed (transient or permanent)
    #[error("Object store backend error: {message}")]
    Backend {
        /// Description of the backend failure
        message: String,
    },
}

/// Remote ciphertext-only storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the ciphertext at a locator.
    async fn get(&self, locator: &str) -> Result<Vec<u8>, StoreError>;

    /// Write ciphertext back to a locator.
    ///
    /// Only invoked after the session has checked a `write` scope for the
    /// target path.
    async fn put(&self, locator: &str, ciphertext: Vec<u8>) -> Result<(), StoreError>;
}

/// In-memory object store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, returning the store for chaining.
    pub fn with_object(self, locator: impl Into<String>, ciphertext: Vec<u8>) -> Self {
        self.objects.write().insert(locator.into(), ciphertext);
        self
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, locator: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .get(locator)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                locator: locator.to_string(),
            })
    }

    async fn put(&self, locator: &str, ciphertext: Vec<u8>) -> Result<(), StoreError> {
        self.objects.write().insert(locator.to_string(), ciphertext);
        Ok(())
    }
}
