//! `SQLite` storage adapter.
//!
//! Maps the document contract onto two tables:
//!
//! ```sql
//! records(collection TEXT, id INTEGER, body TEXT, PRIMARY KEY (collection, id))
//! collection_sequences(collection TEXT PRIMARY KEY, last_id INTEGER)
//! ```
//!
//! `body` holds the record as JSON text without its id. Ids come from
//! `collection_sequences`, so they are never reused, even across restarts.

use super::traits::StorageAdapter;
use crate::models::record::{strip_id, with_id};
use crate::models::{Record, RecordId};
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        collection TEXT NOT NULL,
        id INTEGER NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );
    CREATE TABLE IF NOT EXISTS collection_sequences (
        collection TEXT PRIMARY KEY,
        last_id INTEGER NOT NULL
    );
";

/// In-memory database marker path.
const IN_MEMORY: &str = ":memory:";

/// `SQLite`-backed storage adapter.
pub struct SqliteAdapter {
    /// Path to the database file, or `:memory:`.
    db_path: PathBuf,
    /// Open connection; `None` while disconnected.
    conn: Mutex<Option<Connection>>,
}

impl SqliteAdapter {
    /// Creates an adapter for a database file. Performs no I/O.
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            conn: Mutex::new(None),
        }
    }

    /// Creates an adapter for a private in-memory database (useful for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|e| Error::operation("lock_sqlite_db", e))
    }

    fn not_connected(&self) -> Error {
        Error::NotConnected {
            backend: self.name().to_string(),
        }
    }

    fn open(&self) -> Result<Connection> {
        if self.is_in_memory() {
            return Connection::open_in_memory().map_err(|e| Error::operation("open_sqlite_db", e));
        }

        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::operation("create_db_dir", e))?;
        }
        Connection::open(&self.db_path).map_err(|e| Error::operation("open_sqlite_db", e))
    }

    fn body_of(conn: &Connection, collection: &str, id: RecordId) -> Result<Option<Record>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, to_sql_id(collection, id)?],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::operation("read_record", e))?;

        body.map(|json| decode_body(&json)).transpose()
    }
}

impl StorageAdapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self) -> Result<()> {
        let mut guard = self.lock_conn()?;
        if guard.is_some() {
            return Ok(());
        }

        let conn = self.open()?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::operation("create_records_schema", e))?;
        tracing::debug!(path = %self.db_path.display(), "Opened SQLite store");
        *guard = Some(conn);
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        let mut guard = self.lock_conn()?;
        if let Some(conn) = guard.take() {
            conn.close()
                .map_err(|(_, e)| Error::operation("close_sqlite_db", e))?;
            tracing::debug!(path = %self.db_path.display(), "Closed SQLite store");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock_conn().is_ok_and(|guard| guard.is_some())
    }

    fn create(&self, collection: &str, mut record: Record) -> Result<Record> {
        let mut guard = self.lock_conn()?;
        let conn = guard.as_mut().ok_or_else(|| self.not_connected())?;

        strip_id(&mut record);
        let body = encode_body(&record)?;

        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("begin_create", e))?;
        let id: i64 = tx
            .query_row(
                "INSERT INTO collection_sequences (collection, last_id) VALUES (?1, 1)
                 ON CONFLICT(collection) DO UPDATE SET last_id = last_id + 1
                 RETURNING last_id",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|e| Error::operation("next_record_id", e))?;
        tx.execute(
            "INSERT INTO records (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, body],
        )
        .map_err(|e| Error::operation("insert_record", e))?;
        tx.commit().map_err(|e| Error::operation("commit_create", e))?;

        Ok(with_id(from_sql_id(id)?, &record))
    }

    fn read(&self, collection: &str, id: RecordId) -> Result<Record> {
        let guard = self.lock_conn()?;
        let conn = guard.as_ref().ok_or_else(|| self.not_connected())?;

        Self::body_of(conn, collection, id)?
            .map(|body| with_id(id, &body))
            .ok_or_else(|| Error::not_found(collection, id))
    }

    fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        let guard = self.lock_conn()?;
        let conn = guard.as_ref().ok_or_else(|| self.not_connected())?;

        let mut stmt = conn
            .prepare("SELECT id, body FROM records WHERE collection = ?1 ORDER BY id")
            .map_err(|e| Error::operation("prepare_read_all", e))?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| Error::operation("read_all", e))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, body) = row.map_err(|e| Error::operation("read_all", e))?;
            records.push(with_id(from_sql_id(id)?, &decode_body(&body)?));
        }
        Ok(records)
    }

    fn update(&self, collection: &str, id: RecordId, mut partial: Record) -> Result<Record> {
        let guard = self.lock_conn()?;
        let conn = guard.as_ref().ok_or_else(|| self.not_connected())?;

        let mut body =
            Self::body_of(conn, collection, id)?.ok_or_else(|| Error::not_found(collection, id))?;
        strip_id(&mut partial);
        body.extend(partial);

        conn.execute(
            "UPDATE records SET body = ?3 WHERE collection = ?1 AND id = ?2",
            params![collection, to_sql_id(collection, id)?, encode_body(&body)?],
        )
        .map_err(|e| Error::operation("update_record", e))?;

        Ok(with_id(id, &body))
    }

    fn delete(&self, collection: &str, id: RecordId) -> Result<()> {
        let guard = self.lock_conn()?;
        let conn = guard.as_ref().ok_or_else(|| self.not_connected())?;

        let removed = conn
            .execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                params![collection, to_sql_id(collection, id)?],
            )
            .map_err(|e| Error::operation("delete_record", e))?;

        if removed == 0 {
            return Err(Error::not_found(collection, id));
        }
        Ok(())
    }
}

fn encode_body(record: &Record) -> Result<String> {
    serde_json::to_string(record).map_err(|e| Error::operation("serialize_record", e))
}

fn decode_body(json: &str) -> Result<Record> {
    serde_json::from_str(json).map_err(|e| Error::operation("deserialize_record", e))
}

/// Ids beyond `i64::MAX` can never have been assigned, so they are absent.
fn to_sql_id(collection: &str, id: RecordId) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::not_found(collection, id))
}

fn from_sql_id(id: i64) -> Result<RecordId> {
    RecordId::try_from(id).map_err(|_| Error::operation("read_record_id", format!("negative id {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{record_from, record_id};
    use crate::storage::Query;
    use serde_json::json;
    use tempfile::TempDir;

    fn connected() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory();
        adapter.connect().unwrap();
        adapter
    }

    #[test]
    fn test_requires_connect() {
        let adapter = SqliteAdapter::in_memory();
        assert!(matches!(
            adapter.create("students", Record::new()),
            Err(Error::NotConnected { ref backend }) if backend == "sqlite"
        ));
    }

    #[test]
    fn test_crud_cycle() {
        let adapter = connected();
        let created = adapter
            .create("questions", record_from(json!({"content": "什么是函数？", "category": null})))
            .unwrap();
        let id = record_id(&created).unwrap();
        assert_eq!(id, 1);

        let updated = adapter
            .update("questions", id, record_from(json!({"category": "知识点定义类"})))
            .unwrap();
        assert_eq!(updated["content"], json!("什么是函数？"));
        assert_eq!(adapter.read("questions", id).unwrap(), updated);

        adapter.delete("questions", id).unwrap();
        assert!(matches!(
            adapter.read("questions", id),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            adapter.delete("questions", id),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_ids_beyond_sql_range_are_not_found() {
        let adapter = connected();
        adapter.create("students", Record::new()).unwrap();
        assert!(matches!(
            adapter.read("students", u64::MAX),
            Err(Error::NotFound { ref collection, ref id })
                if collection == "students" && *id == u64::MAX.to_string()
        ));
        assert!(matches!(
            adapter.update("students", u64::MAX, Record::new()),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            adapter.delete("students", u64::MAX),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_collections_are_isolated() {
        let adapter = connected();
        adapter.create("students", record_from(json!({"n": 1}))).unwrap();
        let q = adapter.create("questions", record_from(json!({"n": 2}))).unwrap();
        assert_eq!(record_id(&q), Some(1));
        assert_eq!(adapter.read_all("students").unwrap().len(), 1);
        assert!(adapter.read_all("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_query_uses_predicates() {
        let adapter = connected();
        adapter
            .create("students", record_from(json!({"student_id": "stu1"})))
            .unwrap();
        adapter
            .create("students", record_from(json!({"student_id": "stu2"})))
            .unwrap();

        let hits = adapter
            .query("students", &Query::new().eq("student_id", "stu2"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(record_id(&hits[0]), Some(2));
    }

    #[test]
    fn test_ids_not_reused_across_restarts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.db");

        let adapter = SqliteAdapter::new(&path);
        adapter.connect().unwrap();
        adapter.create("q", Record::new()).unwrap();
        adapter.create("q", Record::new()).unwrap();
        adapter.delete("q", 2).unwrap();
        adapter.disconnect().unwrap();

        let reopened = SqliteAdapter::new(&path);
        reopened.connect().unwrap();
        let next = reopened.create("q", Record::new()).unwrap();
        assert_eq!(record_id(&next), Some(3));
    }
}
