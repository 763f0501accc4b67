// Key-value cache with time-based expiry.
//
// `CacheStore` is the persistence seam (SQLite or in-memory). `TtlCache`
// layers a per-class expiry and per-key refresh locking on top of a store,
// so concurrent callers for the same key perform at most one provider fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// A stored value and the moment it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub stored_at: DateTime<Utc>,
}

/// Plain key-value persistence. Expiry is not enforced here.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    fn put_at(&self, key: &str, value: &serde_json::Value, stored_at: DateTime<Utc>) -> Result<()>;

    fn put(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.put_at(key, value, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

/// SQLite-backed cache store.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) a SQLite database at `path` and ensure the cache table
    /// exists. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache_entries (
                key       TEXT PRIMARY KEY,
                value     TEXT NOT NULL,
                stored_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create cache schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("cache database mutex poisoned")
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value, stored_at FROM cache_entries WHERE key = ?1")
            .context("failed to prepare cache lookup")?;

        let mut rows = stmt
            .query_map(params![key], |row| {
                let value: String = row.get(0)?;
                let stored_at: String = row.get(1)?;
                Ok((value, stored_at))
            })
            .context("failed to query cache entry")?;

        match rows.next() {
            Some(row_result) => {
                let (value, stored_at) = row_result.context("failed to read cache row")?;
                let value: serde_json::Value =
                    serde_json::from_str(&value).context("failed to deserialize cache value")?;
                let stored_at = DateTime::parse_from_rfc3339(&stored_at)
                    .context("failed to parse cache timestamp")?
                    .with_timezone(&Utc);
                Ok(Some(CacheEntry { value, stored_at }))
            }
            None => Ok(None),
        }
    }

    fn put_at(&self, key: &str, value: &serde_json::Value, stored_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize cache value")?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, stored_at) VALUES (?1, ?2, ?3)",
            params![key, json_str, stored_at.to_rfc3339()],
        )
        .context("failed to write cache entry")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store, for tests and embedding without a database file.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock_recovering(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(lock_recovering(&self.entries).get(key).cloned())
    }

    fn put_at(&self, key: &str, value: &serde_json::Value, stored_at: DateTime<Utc>) -> Result<()> {
        lock_recovering(&self.entries).insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                stored_at,
            },
        );
        Ok(())
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// TTL cache class
// ---------------------------------------------------------------------------

/// One cache class (e.g. league distributions) over a shared store.
///
/// Keys are namespaced as `{namespace}:{key}`. An entry older than `ttl` is
/// treated as absent. Store and decode failures are logged and treated as a
/// miss; they never fail the caller.
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
    namespace: &'static str,
    ttl: Duration,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn CacheStore>, namespace: &'static str, ttl: Duration) -> Self {
        Self {
            store,
            namespace,
            ttl,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Return the cached value if present and younger than the TTL.
    pub fn get_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let entry = match self.store.get(&full_key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!("cache read failed for {}: {:#}", full_key, e);
                return None;
            }
        };

        let age = Utc::now() - entry.stored_at;
        if age >= self.ttl {
            debug!("cache entry {} expired ({}s old)", full_key, age.num_seconds());
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("discarding undecodable cache entry {}: {}", full_key, e);
                None
            }
        }
    }

    /// Write `value` under `key`. Failures are logged, not returned.
    pub fn store<T: Serialize>(&self, key: &str, value: &T) {
        let full_key = self.full_key(key);
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to encode cache entry {}: {}", full_key, e);
                return;
            }
        };
        if let Err(e) = self.store.put(&full_key, &json) {
            warn!("cache write failed for {}: {:#}", full_key, e);
        }
    }

    /// Read-through lookup with single-flight refresh.
    ///
    /// Fresh hits return immediately. On a miss the per-key lock is taken,
    /// the cache is re-checked (another caller may have refreshed it while we
    /// waited), and only then is `refresh` invoked. A successful refresh is
    /// written back; an error is returned to the caller uncached.
    pub fn get_or_refresh<T, E, F>(&self, key: &str, refresh: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get_fresh(key) {
            return Ok(hit);
        }

        let key_lock = {
            let mut locks = lock_recovering(&self.refresh_locks);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        let result = {
            let _guard = lock_recovering(&key_lock);
            if let Some(hit) = self.get_fresh(key) {
                debug!("cache {}:{} refreshed by a concurrent caller", self.namespace, key);
                Ok(hit)
            } else {
                refresh().map(|value| {
                    self.store(key, &value);
                    value
                })
            }
        };
        self.release_refresh_lock(key, key_lock);
        result
    }

    /// Drop our handle on a key's refresh lock, removing the map entry once
    /// no other caller holds or waits on it.
    fn release_refresh_lock(&self, key: &str, key_lock: Arc<Mutex<()>>) {
        let mut locks = lock_recovering(&self.refresh_locks);
        drop(key_lock);
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn pending_refresh_locks(&self) -> usize {
        lock_recovering(&self.refresh_locks).len()
    }
}
