use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::Result;

/// A persistent string-keyed map backed by its own SQLite file, for
/// memoizing expensive intermediate results between crawl runs. Values are
/// stored as JSON.
///
/// Unlike [`GraphStore`](crate::data::GraphStore), opening creates the
/// file and table if they are missing.
pub struct MemoMap {
    conn: Connection,
}

impl MemoMap {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS memo (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
        )?;
        Ok(MemoMap { conn })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let text: Option<String> = self
            .conn
            .query_row("SELECT value FROM memo WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match text {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace the value under `key`.
    pub fn insert<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO memo (key, value) VALUES (?1, ?2)",
            params![key, text],
        )?;
        Ok(())
    }

    /// Remove `key`, reporting whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM memo WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM memo")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    pub fn len(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM memo", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
