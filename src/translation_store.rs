//! Translation Store
//!
//! Append-only log of translation results produced by the non-task path.
//! Save-only: nothing in the gateway reads these rows back, they exist for
//! offline inspection of what the model produced.

use crate::error::{StorageError, StorageResult};
use crate::types::Translation;
use crate::util::timestamp::format_utc_timestamp;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct TranslationStore {
    conn: Mutex<Connection>,
}

impl TranslationStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let conn = Connection::open(db_path.as_ref())
            .map_err(|e| StorageError::Database(format!("Failed to open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| StorageError::Database(format!("Failed to set pragmas: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;

        info!("Opened translation store at {:?}", db_path.as_ref());

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
            "CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chinese TEXT NOT NULL,
                english TEXT NOT NULL,
                english_grammar TEXT,
                japanese TEXT,
                hiragana TEXT,
                japanese_grammar TEXT,
                timestamp TEXT NOT NULL
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

    pub fn save(&self, result: &Translation) -> StorageResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO translations
             (chinese, english, english_grammar, japanese, hiragana, japanese_grammar, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                result.original_text,
                result.translated_text,
                result.english_grammar,
                result.japanese_text,
                result.hiragana_pronunciation,
                result.japanese_grammar,
                format_utc_timestamp(result.timestamp),
            ],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::timestamp::utc_now;

    fn sample() -> Translation {
        Translation {
            original_text: "你好".to_string(),
            translated_text: "Hello".to_string(),
            english_grammar: None,
            japanese_text: Some("こんにちは".to_string()),
            hiragana_pronunciation: Some("こんにちは".to_string()),
            japanese_grammar: None,
            timestamp: utc_now(),
        }
    }

    #[test]
    fn test_save_appends() {
        let store = TranslationStore::open_in_memory().unwrap();
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();

        let conn = store.conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_save_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranslationStore::open(dir.path().join("translations.db")).unwrap();
        store.save(&sample()).unwrap();
    }
}
