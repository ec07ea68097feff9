use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Transcript cache keyed by the SHA-256 of the narration audio.
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS narration_transcripts (
                checksum TEXT PRIMARY KEY,
                words_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Store recognized words for an audio checksum
    pub fn store_transcript(&self, checksum: &str, words_json: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO narration_transcripts (checksum, words_json, created_at) VALUES (?1, ?2, ?3)",
            params![checksum, words_json, now],
        )?;
        Ok(())
    }

    /// Get recognized words for an audio checksum
    pub fn get_transcript(&self, checksum: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT words_json FROM narration_transcripts WHERE checksum = ?1")?;
        let mut rows = stmt.query_map(params![checksum], |row| row.get::<_, String>(0))?;

        match rows.next() {
            Some(Ok(json)) => Ok(Some(json)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    pub fn transcript_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM narration_transcripts", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checksum_is_none() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_transcript("abc").unwrap().is_none());
    }

    #[test]
    fn storing_twice_replaces() {
        let db = Database::in_memory().unwrap();
        db.store_transcript("abc", "[]").unwrap();
        db.store_transcript("abc", r#"[{"word":"hi","start":0.0,"end":0.2}]"#)
            .unwrap();
        assert_eq!(db.transcript_count().unwrap(), 1);
        assert!(db.get_transcript("abc").unwrap().unwrap().contains("hi"));
    }
}
