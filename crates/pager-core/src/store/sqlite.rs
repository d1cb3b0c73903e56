//! SQLite-based page store.

use super::traits::{CachedPage, PageStore};
use crate::config::StoreConfig;
use crate::error::{PagerError, Result};
use crate::key::CacheKey;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// SQLite-based page store.
///
/// Pages from every namespace share one table keyed by `(namespace, key)`.
/// `cached_at` is stored as Unix milliseconds. Thread-safe via an internal
/// mutex on the connection.
pub struct SqlitePageStore {
    /// Database connection (wrapped for thread safety).
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePageStore {
    /// Open (or create) a store at the specified database path.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PagerError::Io {
                message: format!("Failed to create store directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| PagerError::Database {
            message: format!("Failed to open page store: {}", e),
            source: Some(e),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| PagerError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::from_connection(conn)
    }

    /// Create a store that lives only as long as this handle.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| PagerError::Database {
            message: format!("Failed to open in-memory page store: {}", e),
            source: Some(e),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                cached_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            );

            -- Index for expiration sweeps
            CREATE INDEX IF NOT EXISTS idx_{table}_cached_at
                ON {table}(namespace, cached_at);
            "#,
            table = StoreConfig::SQLITE_TABLE
        ))
        .map_err(|e| PagerError::Database {
            message: format!("Failed to initialize page store schema: {}", e),
            source: Some(e),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| PagerError::Database {
            message: format!("Failed to lock database: {}", e),
            source: None,
        })
    }
}

impl PageStore for SqlitePageStore {
    fn get(&self, key: &CacheKey) -> Result<Option<CachedPage>> {
        let conn = self.lock()?;

        let row: Option<(String, i64)> = conn
            .query_row(
                &format!(
                    "SELECT value, cached_at FROM {} WHERE namespace = ?1 AND key = ?2",
                    StoreConfig::SQLITE_TABLE
                ),
                params![key.namespace(), key.entry_key()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| PagerError::Database {
                message: format!("Failed to query cached page: {}", e),
                source: Some(e),
            })?;

        let Some((value, cached_at_ms)) = row else {
            return Ok(None);
        };

        let cached_at = DateTime::<Utc>::from_timestamp_millis(cached_at_ms).ok_or_else(|| {
            PagerError::Other(format!("Invalid cached_at for {}: {}", key, cached_at_ms))
        })?;

        Ok(Some(CachedPage {
            value: serde_json::from_str(&value)?,
            cached_at,
        }))
    }

    fn insert(&self, key: &CacheKey, page: CachedPage) -> Result<()> {
        let value = serde_json::to_string(&page.value)?;
        let conn = self.lock()?;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (namespace, key, value, cached_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                StoreConfig::SQLITE_TABLE
            ),
            params![
                key.namespace(),
                key.entry_key(),
                value,
                page.cached_at.timestamp_millis()
            ],
        )
        .map_err(|e| PagerError::Database {
            message: format!("Failed to store cached page: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE namespace = ?1 AND key = ?2",
                    StoreConfig::SQLITE_TABLE
                ),
                params![key.namespace(), key.entry_key()],
            )
            .map_err(|e| PagerError::Database {
                message: format!("Failed to remove cached page: {}", e),
                source: Some(e),
            })?;
        Ok(deleted > 0)
    }

    fn invalidate_namespace(&self, namespace: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                &format!("DELETE FROM {} WHERE namespace = ?1", StoreConfig::SQLITE_TABLE),
                params![namespace],
            )
            .map_err(|e| PagerError::Database {
                message: format!("Failed to invalidate namespace: {}", e),
                source: Some(e),
            })?;

        debug!("Invalidated {} cached pages in {}", deleted, namespace);
        Ok(deleted)
    }

    fn remove_expired(&self, namespace: &str, max_age: Duration) -> Result<usize> {
        // Lifetimes beyond the i64 millisecond range never expire.
        let Some(cutoff) = i64::try_from(max_age.as_millis())
            .ok()
            .and_then(|max_age_ms| Utc::now().timestamp_millis().checked_sub(max_age_ms))
        else {
            return Ok(0);
        };
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE namespace = ?1 AND cached_at <= ?2",
                    StoreConfig::SQLITE_TABLE
                ),
                params![namespace, cutoff],
            )
            .map_err(|e| PagerError::Database {
                message: format!("Failed to remove expired pages: {}", e),
                source: Some(e),
            })?;
        Ok(deleted)
    }

    fn namespace_len(&self, namespace: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE namespace = ?1", StoreConfig::SQLITE_TABLE),
                params![namespace],
                |row| row.get(0),
            )
            .map_err(|e| PagerError::Database {
                message: format!("Failed to count cached pages: {}", e),
                source: Some(e),
            })?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PaginationArgs;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqlitePageStore) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join(StoreConfig::SQLITE_FILE_NAME);
        let store = SqlitePageStore::open(&db_path).unwrap();
        (temp_dir, store)
    }

    fn key(namespace: &str, page: u32, params: serde_json::Value) -> CacheKey {
        CacheKey::new(namespace, PaginationArgs::new(page, 10), Some(&params)).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp, store) = create_test_store();
        let k = key("sessions", 1, json!({"q": "a"}));
        let page = CachedPage::new(json!({"items": [1, 2, 3]}));

        store.insert(&k, page.clone()).unwrap();
        let loaded = store.get(&k).unwrap().unwrap();

        assert_eq!(loaded.value, page.value);
        assert_eq!(loaded.cached_at.timestamp_millis(), page.cached_at.timestamp_millis());
    }

    #[test]
    fn test_missing_entry() {
        let store = SqlitePageStore::in_memory().unwrap();
        assert!(store.get(&key("sessions", 1, json!(null))).unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let store = SqlitePageStore::in_memory().unwrap();
        let k = key("sessions", 1, json!(null));
        store.insert(&k, CachedPage::new(json!([]))).unwrap();

        assert!(store.remove(&k).unwrap());
        assert!(!store.remove(&k).unwrap());
        assert!(store.get(&k).unwrap().is_none());
    }

    #[test]
    fn test_namespace_isolation() {
        let store = SqlitePageStore::in_memory().unwrap();
        store.insert(&key("sessions", 1, json!(null)), CachedPage::new(json!(1))).unwrap();
        store.insert(&key("sessions", 2, json!(null)), CachedPage::new(json!(2))).unwrap();
        store.insert(&key("templates", 1, json!(null)), CachedPage::new(json!(3))).unwrap();

        assert_eq!(store.invalidate_namespace("sessions").unwrap(), 2);
        assert_eq!(store.namespace_len("sessions").unwrap(), 0);
        assert_eq!(store.namespace_len("templates").unwrap(), 1);
    }

    #[test]
    fn test_remove_expired() {
        let store = SqlitePageStore::in_memory().unwrap();
        let old = CachedPage {
            value: json!("old"),
            cached_at: Utc::now() - chrono::Duration::minutes(10),
        };
        store.insert(&key("sessions", 1, json!(null)), old.clone()).unwrap();
        store.insert(&key("sessions", 2, json!(null)), CachedPage::new(json!("new"))).unwrap();
        store.insert(&key("templates", 1, json!(null)), old).unwrap();

        let removed = store.remove_expired("sessions", Duration::from_secs(60)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.namespace_len("sessions").unwrap(), 1);
        assert_eq!(store.namespace_len("templates").unwrap(), 1);
    }

    #[test]
    fn test_remove_expired_with_huge_lifetime_keeps_pages() {
        let store = SqlitePageStore::in_memory().unwrap();
        let old = CachedPage {
            value: json!("old"),
            cached_at: Utc::now() - chrono::Duration::days(3650),
        };
        store.insert(&key("sessions", 1, json!(null)), old).unwrap();
        store.insert(&key("sessions", 2, json!(null)), CachedPage::new(json!("new"))).unwrap();

        assert_eq!(store.remove_expired("sessions", Duration::from_secs(u64::MAX)).unwrap(), 0);
        assert_eq!(store.remove_expired("sessions", Duration::MAX).unwrap(), 0);
        assert_eq!(store.namespace_len("sessions").unwrap(), 2);
    }

    #[test]
    fn test_persists_across_handles() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join(StoreConfig::SQLITE_FILE_NAME);
        let k = key("sessions", 3, json!({"sort": "date"}));

        {
            let store = SqlitePageStore::open(&db_path).unwrap();
            store.insert(&k, CachedPage::new(json!({"items": ["warmup"]}))).unwrap();
        }

        let reopened = SqlitePageStore::open(&db_path).unwrap();
        let loaded = reopened.get(&k).unwrap().unwrap();
        assert_eq!(loaded.value, json!({"items": ["warmup"]}));
    }
}
