//! External reference-store oracle (feature `oracle`)
//!
//! Mirrors every mutation to a second, independent store and compares
//! results on every read, the way the original harness cross-checked
//! against a Berkeley DB mirror. Bundled SQLite stands in here because it is
//! the reference-store crate the closest other example in this pack already
//! depends on for exactly this purpose (see DESIGN.md).
//!
//! Only ever run single-threaded: the reference store has no concurrency
//! story of its own, matching the original harness's restriction.

use rusqlite::{params, Connection};

pub struct ReferenceStore {
    conn: Connection,
}

impl ReferenceStore {
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE kv (key BLOB PRIMARY KEY, value BLOB)",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &[u8]) -> rusqlite::Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> rusqlite::Result<Option<Vec<u8>>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
    }

    /// Compares `found` (what the mutation core returned) against this
    /// store's own view of `key`, returning a mismatch description on
    /// divergence.
    pub fn check(&self, key: &[u8], found: Option<&[u8]>) -> Result<(), String> {
        let expected = self.get(key).map_err(|e| e.to_string())?;
        match (expected.as_deref(), found) {
            (None, None) => Ok(()),
            (Some(e), Some(f)) if e == f => Ok(()),
            (e, f) => Err(format!(
                "oracle mismatch on key {key:?}: reference={e:?} core={f:?}"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_check_agrees() {
        let store = ReferenceStore::open_in_memory().unwrap();
        store.put(b"k", b"v").unwrap();
        assert!(store.check(b"k", Some(b"v")).is_ok());
    }

    #[test]
    fn mismatch_is_reported() {
        let store = ReferenceStore::open_in_memory().unwrap();
        store.put(b"k", b"v").unwrap();
        assert!(store.check(b"k", Some(b"different")).is_err());
    }

    #[test]
    fn delete_then_check_not_found() {
        let store = ReferenceStore::open_in_memory().unwrap();
        store.put(b"k", b"v").unwrap();
        store.delete(b"k").unwrap();
        assert!(store.check(b"k", None).is_ok());
    }
}
