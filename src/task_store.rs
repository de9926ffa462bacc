//! Task Store
//!
//! SQLite-backed store for task records. The two uniqueness invariants the
//! lifecycle engine depends on live here as UNIQUE columns, so concurrent
//! writers are arbitrated by the database rather than by read-then-write
//! checks in the engine:
//! - `input_hash` is unique: `insert_prepared` uses INSERT OR IGNORE and
//!   reports whether the row was actually inserted, letting a losing caller
//!   observe the winner's row.
//! - `task_id` is unique: a claim racing past the engine's read checks is
//!   rejected by the index and surfaces as `StorageError::Constraint`.
//!
//! Mutating statements carry their own guards (`result_hash IS NULL`,
//! affected-row counts) so each is atomic with respect to its own read.

use crate::error::{StorageError, StorageResult};
use crate::types::{TaskClaim, TaskRecord, TaskStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct TaskStore {
    conn: Mutex<Connection>,
}

impl TaskStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| StorageError::Database(format!("Failed to open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| StorageError::Database(format!("Failed to set pragmas: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;

        info!("Opened task store at {:?}", db_path.as_ref());

        Ok(store)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Database(format!("Failed to open in-memory db: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;

        Ok(store)
    }

    fn create_tables(&self) -> StorageResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER UNIQUE,
                input_hash TEXT UNIQUE NOT NULL,
                input_payload TEXT NOT NULL,
                result_hash TEXT,
                result_payload TEXT,
                status TEXT NOT NULL,
                requester TEXT,
                model TEXT,
                fee TEXT,
                chain_id INTEGER,
                tx_hash TEXT,
                block_number INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| StorageError::Database(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Database(format!("Failed to acquire lock: {}", e)))
    }

    // ==================== Reads ====================

    pub fn get_by_input_hash(&self, input_hash: &str) -> StorageResult<Option<TaskRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE input_hash = ?1",
            TASK_COLUMNS
        ))?;

        let record = stmt
            .query_row(params![input_hash], row_to_record)
            .optional()?;

        Ok(record)
    }

    pub fn get_by_task_id(&self, task_id: i64) -> StorageResult<Option<TaskRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE task_id = ?1",
            TASK_COLUMNS
        ))?;

        let record = stmt.query_row(params![task_id], row_to_record).optional()?;

        Ok(record)
    }

    // ==================== Writes ====================

    /// Insert a freshly prepared input. Returns `false` when a record with
    /// the same `input_hash` already exists (nothing is written); the caller
    /// then reads the winner's row instead of failing.
    pub fn insert_prepared(
        &self,
        input_hash: &str,
        input_payload: &str,
        timestamp: &str,
    ) -> StorageResult<bool> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO tasks (input_hash, input_payload, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input_hash,
                input_payload,
                TaskStatus::Prepared.as_str(),
                timestamp,
                timestamp
            ],
        )?;

        Ok(inserted > 0)
    }

    /// Bind an on-chain task id and provenance to a prepared input.
    ///
    /// The WHERE clause carries the binding rules so the check and the write
    /// are one atomic statement: only an unbound row or a row already bound
    /// to this same task id matches, and never a row in a terminal state.
    /// Returns `false` when the guard blocked the write; the caller re-reads
    /// the row and re-evaluates. A bind that would attach this task id to a
    /// second input is rejected by the UNIQUE index and surfaces as
    /// `StorageError::Constraint`.
    pub fn update_claim(&self, claim: &TaskClaim, timestamp: &str) -> StorageResult<bool> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE tasks
             SET task_id = ?1, status = ?2, requester = ?3, model = ?4, fee = ?5,
                 chain_id = ?6, tx_hash = ?7, block_number = ?8, updated_at = ?9
             WHERE input_hash = ?10
               AND (task_id IS NULL OR task_id = ?1)
               AND status IN ('prepared', 'created')",
            params![
                claim.task_id,
                TaskStatus::Created.as_str(),
                claim.requester,
                claim.model,
                claim.fee,
                claim.chain_id,
                claim.tx_hash,
                claim.block_number,
                timestamp,
                claim.input_hash
            ],
        )?;

        Ok(updated > 0)
    }

    /// Persist the first result for a task. Guarded on `result_hash IS NULL`
    /// so only one writer ever lands a result; returns `false` when the
    /// guard blocked the write and the caller must re-read the row.
    pub fn update_result(
        &self,
        task_id: i64,
        result_hash: &str,
        result_payload: &str,
        timestamp: &str,
    ) -> StorageResult<bool> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE tasks
             SET result_hash = ?1, result_payload = ?2, status = ?3, updated_at = ?4
             WHERE task_id = ?5 AND result_hash IS NULL",
            params![
                result_hash,
                result_payload,
                TaskStatus::Completed.as_str(),
                timestamp,
                task_id
            ],
        )?;

        Ok(updated > 0)
    }

    /// Overwrite status and transaction provenance. Intentionally unguarded:
    /// a refund can land on an already-completed task. Returns `false` when
    /// no row matched the task id.
    pub fn update_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        tx_hash: Option<&str>,
        block_number: Option<i64>,
        timestamp: &str,
    ) -> StorageResult<bool> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE tasks
             SET status = ?1, tx_hash = ?2, block_number = ?3, updated_at = ?4
             WHERE task_id = ?5",
            params![status.as_str(), tx_hash, block_number, timestamp, task_id],
        )?;

        Ok(updated > 0)
    }
}

const TASK_COLUMNS: &str = "id, task_id, input_hash, input_payload, result_hash, result_payload, \
     status, requester, model, fee, chain_id, tx_hash, block_number, created_at, updated_at";

fn row_to_record(row: &Row) -> rusqlite::Result<TaskRecord> {
    let status_text: String = row.get(6)?;
    let status = TaskStatus::parse(&status_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(TaskRecord {
        id: row.get(0)?,
        task_id: row.get(1)?,
        input_hash: row.get(2)?,
        input_payload: row.get(3)?,
        result_hash: row.get(4)?,
        result_payload: row.get(5)?,
        status,
        requester: row.get(7)?,
        model: row.get(8)?,
        fee: row.get(9)?,
        chain_id: row.get(10)?,
        tx_hash: row.get(11)?,
        block_number: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> TaskStore {
        TaskStore::open_in_memory().unwrap()
    }

    fn claim(task_id: i64, input_hash: &str) -> TaskClaim {
        TaskClaim {
            task_id,
            input_hash: input_hash.to_string(),
            requester: Some("0xabc".to_string()),
            model: Some("0xmodel".to_string()),
            fee: Some("1000".to_string()),
            chain_id: Some(8453),
            tx_hash: Some("0xdeadbeef".to_string()),
            block_number: Some(42),
        }
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.db"));
        assert!(store.is_ok());
    }

    #[test]
    fn test_insert_and_get() {
        let store = make_store();

        let inserted = store
            .insert_prepared("0xaaaa", r#"{"text":"hi"}"#, "2026-08-05T12:00:00Z")
            .unwrap();
        assert!(inserted);

        let record = store.get_by_input_hash("0xaaaa").unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Prepared);
        assert_eq!(record.input_payload, r#"{"text":"hi"}"#);
        assert_eq!(record.created_at, "2026-08-05T12:00:00Z");
        assert_eq!(record.task_id, None);
        assert_eq!(record.result_hash, None);

        assert!(store.get_by_input_hash("0xbbbb").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_input_hash_not_inserted() {
        let store = make_store();

        assert!(store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T12:00:00Z")
            .unwrap());
        assert!(!store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T13:00:00Z")
            .unwrap());

        // The winner's timestamps are untouched.
        let record = store.get_by_input_hash("0xaaaa").unwrap().unwrap();
        assert_eq!(record.created_at, "2026-08-05T12:00:00Z");
    }

    #[test]
    fn test_claim_binds_task_id_and_provenance() {
        let store = make_store();
        store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T12:00:00Z")
            .unwrap();

        assert!(store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:01:00Z")
            .unwrap());

        let record = store.get_by_task_id(5).unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Created);
        assert_eq!(record.input_hash, "0xaaaa");
        assert_eq!(record.requester.as_deref(), Some("0xabc"));
        assert_eq!(record.chain_id, Some(8453));
        assert_eq!(record.updated_at, "2026-08-05T12:01:00Z");
    }

    #[test]
    fn test_task_id_unique_index_rejects_double_bind() {
        let store = make_store();
        store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T12:00:00Z")
            .unwrap();
        store
            .insert_prepared("0xbbbb", "{}", "2026-08-05T12:00:00Z")
            .unwrap();

        store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:01:00Z")
            .unwrap();

        let err = store
            .update_claim(&claim(5, "0xbbbb"), "2026-08-05T12:02:00Z")
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[test]
    fn test_claim_guard_blocks_other_task_id_and_terminal_rows() {
        let store = make_store();
        store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T12:00:00Z")
            .unwrap();
        store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:01:00Z")
            .unwrap();

        // Row already bound to task 5: a claim under task 6 does not match.
        assert!(!store
            .update_claim(&claim(6, "0xaaaa"), "2026-08-05T12:02:00Z")
            .unwrap());
        assert_eq!(store.get_by_task_id(5).unwrap().unwrap().input_hash, "0xaaaa");

        // Re-claim of the same pair matches and re-binds provenance.
        assert!(store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:03:00Z")
            .unwrap());

        // Terminal rows never match, even for the same pair.
        store
            .update_status(
                5,
                TaskStatus::Refunded,
                None,
                None,
                "2026-08-05T12:04:00Z",
            )
            .unwrap();
        assert!(!store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:05:00Z")
            .unwrap());
        assert_eq!(
            store.get_by_task_id(5).unwrap().unwrap().status,
            TaskStatus::Refunded
        );
    }

    #[test]
    fn test_update_result_guard() {
        let store = make_store();
        store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T12:00:00Z")
            .unwrap();
        store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:01:00Z")
            .unwrap();

        assert!(store
            .update_result(5, "0xres1", "{}", "2026-08-05T12:02:00Z")
            .unwrap());

        // Second write is blocked by the result_hash IS NULL guard.
        assert!(!store
            .update_result(5, "0xres2", "{}", "2026-08-05T12:03:00Z")
            .unwrap());

        let record = store.get_by_task_id(5).unwrap().unwrap();
        assert_eq!(record.result_hash.as_deref(), Some("0xres1"));
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.updated_at, "2026-08-05T12:02:00Z");
    }

    #[test]
    fn test_update_status_overwrites_unconditionally() {
        let store = make_store();
        store
            .insert_prepared("0xaaaa", "{}", "2026-08-05T12:00:00Z")
            .unwrap();
        store
            .update_claim(&claim(5, "0xaaaa"), "2026-08-05T12:01:00Z")
            .unwrap();
        store
            .update_result(5, "0xres1", "{}", "2026-08-05T12:02:00Z")
            .unwrap();

        let updated = store
            .update_status(
                5,
                TaskStatus::Refunded,
                Some("0xrefund"),
                Some(99),
                "2026-08-05T12:03:00Z",
            )
            .unwrap();
        assert!(updated);

        let record = store.get_by_task_id(5).unwrap().unwrap();
        assert_eq!(record.status, TaskStatus::Refunded);
        assert_eq!(record.tx_hash.as_deref(), Some("0xrefund"));
        assert_eq!(record.block_number, Some(99));

        assert!(!store
            .update_status(999, TaskStatus::Failed, None, None, "2026-08-05T12:04:00Z")
            .unwrap());
    }

    #[test]
    fn test_data_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        {
            let store = TaskStore::open(&path).unwrap();
            store
                .insert_prepared("0xaaaa", r#"{"text":"hi"}"#, "2026-08-05T12:00:00Z")
                .unwrap();
        }

        {
            let store = TaskStore::open(&path).unwrap();
            let record = store.get_by_input_hash("0xaaaa").unwrap().unwrap();
            assert_eq!(record.input_payload, r#"{"text":"hi"}"#);
        }
    }
}
