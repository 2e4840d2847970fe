//! Key-Value Store
//!
//! SQLite-backed persistent key-value storage. Each entity collection lives
//! under one key as a JSON array, standing in for a real database.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::DomainResult;

/// Shared handle to the key-value database
#[derive(Clone)]
pub struct KvStore {
    conn: Arc<Mutex<Connection>>,
}

impl KvStore {
    /// Run `f` with exclusive access to the connection. Everything inside
    /// one call is atomic with respect to other callers of this store.
    pub async fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> DomainResult<R> + Send) -> DomainResult<R> {
        let guard = self.conn.lock().await;
        f(&guard)
    }

    pub async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        self.with_conn(|conn| kv_get(conn, key)).await
    }

    pub async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        self.with_conn(|conn| kv_set(conn, key, value)).await
    }

    pub async fn remove(&self, key: &str) -> DomainResult<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(removed > 0)
        })
        .await
    }
}

/// Open (or create) the key-value database at `db_path`.
/// `":memory:"` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> DomainResult<KvStore> {
    let conn = Connection::open(db_path)?;
    run_migrations(&conn)?;
    log::info!("Key-value store ready at {}", db_path.display());
    Ok(KvStore {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

pub(crate) fn kv_get(conn: &Connection, key: &str) -> DomainResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

pub(crate) fn kv_set(conn: &Connection, key: &str, value: &str) -> DomainResult<()> {
    let now = chrono::Local::now().timestamp_millis();
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}
