//! SQLite-backed key-value store

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{migrations, KeyValueStore, StorageError, StorageResult};
use crate::util::unix_millis_now;

/// Durable [`KeyValueStore`] persisted in a single `SQLite` file.
///
/// Blocking `SQLite` calls run on the blocking thread pool so they never stall
/// the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open the store at `path`, creating it (and its parent directory) if needed.
    ///
    /// A file that is not a valid database is moved aside and replaced by a
    /// fresh, empty store.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = match Self::open_connection(&path) {
            Ok(conn) => conn,
            Err(error) if is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Detected invalid store file at {}: {}. Moving it aside and starting fresh.",
                    path.display(),
                    error
                );
                quarantine_corrupted_file(&path)?;
                Self::open_connection(&path)?
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        configure(&conn)?;
        migrations::run(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Location of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn open_connection(path: &Path) -> StorageResult<Connection> {
        let mut conn = Connection::open(path)?;
        configure(&conn)?;
        migrations::run(&mut conn)?;
        Ok(conn)
    }

    async fn with_connection<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                StorageError::Unavailable("store connection lock poisoned".to_string())
            })?;
            operation(&mut guard)
        })
        .await
        .map_err(|error| StorageError::Unavailable(error.to_string()))?
    }
}

/// Configure `SQLite` for a small, frequently rewritten store
fn configure(conn: &Connection) -> StorageResult<()> {
    // In-memory databases report "memory" here; either answer is fine.
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })
    .ok();
    conn.pragma_update(None, "synchronous", "NORMAL").ok();
    // Wait briefly instead of failing when another process holds the file.
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

fn is_corrupted_db_error(error: &StorageError) -> bool {
    let message = error.to_string().to_ascii_lowercase();
    message.contains("file is not a database") || message.contains("malformed")
}

fn quarantine_corrupted_file(path: &Path) -> StorageResult<()> {
    if !path.exists() {
        return Ok(());
    }

    let file_name = path
        .file_name()
        .map_or_else(|| "store.db".into(), |name| name.to_string_lossy());
    let backup_path = path.with_file_name(format!("{file_name}.corrupt-{}", unix_millis_now()));
    std::fs::rename(path, &backup_path)?;
    tracing::warn!(
        "Moved corrupted store file from {} to {}",
        path.display(),
        backup_path.display()
    );

    for suffix in ["-wal", "-shm"] {
        let sidecar = path.with_file_name(format!("{file_name}{suffix}"));
        if sidecar.exists() {
            std::fs::remove_file(&sidecar)?;
            tracing::warn!("Removed stale store file {}", sidecar.display());
        }
    }

    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, unix_millis_now()],
            )?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let keys = keys.iter().map(|key| (*key).to_string()).collect::<Vec<_>>();
        self.with_connection(move |conn| {
            // One transaction: either every key goes or none does.
            let tx = conn.transaction()?;
            for key in &keys {
                tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_in_memory_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.path().is_none());

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_values_survive_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("alphago.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("alphago_pending_actions", "[1,2,3]").await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened
                .get("alphago_pending_actions")
                .await
                .unwrap()
                .as_deref(),
            Some("[1,2,3]")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_multiple_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.set("c", "3").await.unwrap();

        store.remove(&["a", "b", "never-set"]).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_corrupted_file_is_quarantined() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("alphago.db");
        std::fs::write(&path, "not a sqlite database ".repeat(64)).unwrap();

        let store = SqliteStore::open(&path).unwrap();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        let quarantined = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .any(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("alphago.db.corrupt-")
            });
        assert!(quarantined);
    }
}
