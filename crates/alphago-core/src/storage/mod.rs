//! Durable key-value cache
//!
//! [`KeyValueStore`] is the raw backend contract: string keys mapping to
//! serialized blobs, surviving process restarts. [`DurableCache`] layers typed
//! JSON access on top with the read semantics the offline engine relies on:
//! a missing, unreadable, or undecodable entry reads as "no data".

mod memory;
mod migrations;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Asynchronous string-keyed blob store. Last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the blob stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete every key in `keys`; absent keys are ignored
    async fn remove(&self, keys: &[&str]) -> StorageResult<()>;
}

/// Typed JSON view over a [`KeyValueStore`]
#[derive(Clone)]
pub struct DurableCache {
    store: Arc<dyn KeyValueStore>,
}

impl DurableCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read and decode the value under `key`.
    ///
    /// Returns `None` when the key is absent, the backend fails, or the stored
    /// blob does not decode as `T`. Never errors.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!("Failed to read cache key '{}': {}", key, error);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Discarding undecodable cache entry '{}': {}", key, error);
                None
            }
        }
    }

    /// Encode and persist `value` under `key`
    pub async fn write<T: Serialize + ?Sized + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).await
    }

    /// Delete several keys in one call
    pub async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        self.store.remove(keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cache_with(store: Arc<MemoryStore>) -> DurableCache {
        DurableCache::new(store)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_read_missing_key_is_none() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        let value: Option<Vec<String>> = cache.read("missing").await;
        assert!(value.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_write_then_read() {
        let cache = cache_with(Arc::new(MemoryStore::new()));
        cache
            .write("list", &vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let value: Option<Vec<String>> = cache.read("list").await;
        assert_eq!(value, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_undecodable_entry_reads_as_none() {
        let store = Arc::new(MemoryStore::new());
        store.set("list", "{not json").await.unwrap();
        let cache = cache_with(store);

        let value: Option<Vec<String>> = cache.read("list").await;
        assert!(value.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_backend_read_failure_reads_as_none() {
        let store = Arc::new(MemoryStore::new());
        store.set("list", "[]").await.unwrap();
        store.fail_reads(true);
        let cache = cache_with(store);

        let value: Option<Vec<String>> = cache.read("list").await;
        assert!(value.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_write_failure_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let cache = cache_with(store);

        let result = cache.write("list", &Vec::<String>::new()).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_several_keys() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache_with(store.clone());
        cache.write("a", &1).await.unwrap();
        cache.write("b", &2).await.unwrap();
        cache.write("c", &3).await.unwrap();

        cache.remove(&["a", "b", "missing"]).await.unwrap();

        assert_eq!(cache.read::<i32>("a").await, None);
        assert_eq!(cache.read::<i32>("b").await, None);
        assert_eq!(cache.read::<i32>("c").await, Some(3));
    }
}
