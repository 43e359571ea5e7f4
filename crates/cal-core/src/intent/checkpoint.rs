//! Pending-confirmation checkpoint persistence using SQLite
//!
//! One slot per session: writing a new pending intent for a session
//! overwrites whatever that session had waiting. Slots survive a process
//! restart; an optional TTL drops stale ones on read.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::{Error, Result};
use crate::intent::Intent;

/// SQLite-backed store for intents awaiting confirmation
pub struct CheckpointStore {
    conn: Mutex<Connection>,
    ttl: Option<Duration>,
}

impl CheckpointStore {
    /// Create a store at the given database path
    pub fn new(db_path: &str, ttl_minutes: Option<u64>) -> Result<Self> {
        if let Some(dir) = std::path::Path::new(db_path).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, ttl_minutes)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, ttl_minutes: Option<u64>) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            ttl: ttl_minutes.map(|minutes| Duration::minutes(minutes as i64)),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<()> {
        self.conn.lock().unwrap().execute(
            "CREATE TABLE IF NOT EXISTS pending_intents (
                session TEXT PRIMARY KEY,
                intent TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Park an intent as this session's awaiting-confirmation slot
    pub fn put(&self, intent: &Intent) -> Result<()> {
        self.put_at(intent, Utc::now())
    }

    fn put_at(&self, intent: &Intent, created_at: DateTime<Utc>) -> Result<()> {
        let intent_json = serde_json::to_string(intent)?;
        debug!("Checkpointing pending intent for session {}", intent.session);
        self.conn.lock().unwrap().execute(
            "INSERT OR REPLACE INTO pending_intents (session, intent, created_at)
             VALUES (?1, ?2, ?3)",
            params![intent.session, intent_json, created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// The session's waiting intent, if present and not expired
    pub fn get(&self, session: &str) -> Result<Option<Intent>> {
        let row = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT intent, created_at FROM pending_intents WHERE session = ?1",
            )?;
            let result = stmt.query_row(params![session], |row| {
                let intent_json: String = row.get(0)?;
                let created_at: String = row.get(1)?;
                Ok((intent_json, created_at))
            });
            match result {
                Ok(row) => row,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(Error::from(e)),
            }
        };

        let (intent_json, created_at_str) = row;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| Error::Config(format!("corrupt checkpoint timestamp: {}", e)))?
            .with_timezone(&Utc);

        if let Some(ttl) = self.ttl {
            if created_at + ttl <= Utc::now() {
                debug!("Dropping expired checkpoint for session {}", session);
                self.delete(session)?;
                return Ok(None);
            }
        }

        let intent: Intent = serde_json::from_str(&intent_json)?;
        Ok(Some(intent))
    }

    /// Remove the session's slot; returns false if nothing was waiting
    pub fn delete(&self, session: &str) -> Result<bool> {
        let affected = self.conn.lock().unwrap().execute(
            "DELETE FROM pending_intents WHERE session = ?1",
            params![session],
        )?;
        Ok(affected > 0)
    }

    /// Drop every expired slot; returns how many were removed
    pub fn clear_expired(&self) -> Result<usize> {
        let Some(ttl) = self.ttl else {
            return Ok(0);
        };
        let cutoff = (Utc::now() - ttl).to_rfc3339();
        let affected = self.conn.lock().unwrap().execute(
            "DELETE FROM pending_intents WHERE created_at <= ?1",
            params![cutoff],
        )?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{IntentOp, IntentStatus};

    fn pending_intent(session: &str, title: &str) -> Intent {
        let mut intent = Intent::proposal(session, IntentOp::Create);
        intent.title = Some(title.to_string());
        intent.start_time = Some("2024-06-01T15:00:00-07:00".parse().unwrap());
        intent.end_time = Some("2024-06-01T16:00:00-07:00".parse().unwrap());
        intent.status = IntentStatus::Pending;
        intent
    }

    #[test]
    fn test_put_get_delete() {
        let store = CheckpointStore::in_memory().unwrap();
        let intent = pending_intent("session-1", "Sync");

        store.put(&intent).unwrap();
        let loaded = store.get("session-1").unwrap().unwrap();
        assert_eq!(loaded.correlation_id, intent.correlation_id);
        assert_eq!(loaded.title.as_deref(), Some("Sync"));
        assert_eq!(loaded.status, IntentStatus::Pending);

        assert!(store.delete("session-1").unwrap());
        assert!(store.get("session-1").unwrap().is_none());
        assert!(!store.delete("session-1").unwrap());
    }

    #[test]
    fn test_new_pending_overwrites_previous_slot() {
        let store = CheckpointStore::in_memory().unwrap();

        store.put(&pending_intent("session-1", "First")).unwrap();
        store.put(&pending_intent("session-1", "Second")).unwrap();

        let loaded = store.get("session-1").unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = CheckpointStore::in_memory().unwrap();

        store.put(&pending_intent("session-1", "Mine")).unwrap();
        store.put(&pending_intent("session-2", "Theirs")).unwrap();

        assert_eq!(
            store.get("session-1").unwrap().unwrap().title.as_deref(),
            Some("Mine")
        );
        assert_eq!(
            store.get("session-2").unwrap().unwrap().title.as_deref(),
            Some("Theirs")
        );

        store.delete("session-1").unwrap();
        assert!(store.get("session-2").unwrap().is_some());
    }

    #[test]
    fn test_expired_slot_is_dropped_on_read() {
        let conn = Connection::open_in_memory().unwrap();
        let store = CheckpointStore::with_connection(conn, Some(10)).unwrap();

        let intent = pending_intent("session-1", "Stale");
        store
            .put_at(&intent, Utc::now() - Duration::minutes(11))
            .unwrap();

        assert!(store.get("session-1").unwrap().is_none());
    }

    #[test]
    fn test_unexpired_slot_survives_ttl_check() {
        let conn = Connection::open_in_memory().unwrap();
        let store = CheckpointStore::with_connection(conn, Some(10)).unwrap();

        let intent = pending_intent("session-1", "Fresh");
        store
            .put_at(&intent, Utc::now() - Duration::minutes(5))
            .unwrap();

        assert!(store.get("session-1").unwrap().is_some());
    }

    #[test]
    fn test_clear_expired() {
        let conn = Connection::open_in_memory().unwrap();
        let store = CheckpointStore::with_connection(conn, Some(10)).unwrap();

        store
            .put_at(
                &pending_intent("session-1", "Stale"),
                Utc::now() - Duration::minutes(30),
            )
            .unwrap();
        store.put(&pending_intent("session-2", "Fresh")).unwrap();

        assert_eq!(store.clear_expired().unwrap(), 1);
        assert!(store.get("session-2").unwrap().is_some());
    }

    #[test]
    fn test_slot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("checkpoints.db");
        let db_path = db_path.to_str().unwrap();

        let intent = pending_intent("session-1", "Persistent");
        {
            let store = CheckpointStore::new(db_path, None).unwrap();
            store.put(&intent).unwrap();
        }

        let store = CheckpointStore::new(db_path, None).unwrap();
        let loaded = store.get("session-1").unwrap().unwrap();
        assert_eq!(loaded.correlation_id, intent.correlation_id);
    }
}
