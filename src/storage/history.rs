//! SQLite-backed detection run history. One row per completed run, keyed by
//! a generated run id; timestamps are RFC 3339 UTC so they sort as text.

use crate::error::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

/// A completed detection run.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionRun {
    pub run_id: String,
    pub user: String,
    pub filename: String,
    /// "batch", "stream" or "live"
    pub detection_type: String,
    pub total_records: u64,
    pub ts: String,
}

pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open or create the history database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS detection_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                user TEXT NOT NULL,
                filename TEXT NOT NULL,
                detection_type TEXT NOT NULL,
                total_records INTEGER NOT NULL,
                ts TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_runs_ts ON detection_runs(ts);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record a completed run and return its generated id.
    pub fn record_run(
        &self,
        user: &str,
        filename: &str,
        detection_type: &str,
        total_records: u64,
    ) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let ts = chrono::Utc::now().to_rfc3339();
        self.conn.lock().unwrap().execute(
            "INSERT INTO detection_runs (run_id, user, filename, detection_type, total_records, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, user, filename, detection_type, total_records as i64, ts],
        )?;
        tracing::info!(run_id = %run_id, detection_type, total_records, "run recorded");
        Ok(run_id)
    }

    /// Most recent runs across all users, newest first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<DetectionRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT run_id, user, filename, detection_type, total_records, ts
             FROM detection_runs ORDER BY ts DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], row_to_run)?;
        let mut out = Vec::new();
        for run in rows {
            out.push(run?);
        }
        Ok(out)
    }

    /// One user's runs, newest first.
    pub fn runs_for_user(&self, user: &str, limit: usize) -> Result<Vec<DetectionRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT run_id, user, filename, detection_type, total_records, ts
             FROM detection_runs WHERE user = ?1 ORDER BY ts DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user, limit as i64], row_to_run)?;
        let mut out = Vec::new();
        for run in rows {
            out.push(run?);
        }
        Ok(out)
    }

    /// Retention: delete runs older than the given RFC 3339 timestamp.
    pub fn prune_before(&self, ts: &str) -> Result<u64> {
        let n = self
            .conn
            .lock()
            .unwrap()
            .execute("DELETE FROM detection_runs WHERE ts < ?1", params![ts])?;
        Ok(n as u64)
    }
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<DetectionRun> {
    Ok(DetectionRun {
        run_id: row.get(0)?,
        user: row.get(1)?,
        filename: row.get(2)?,
        detection_type: row.get(3)?,
        total_records: row.get::<_, i64>(4)? as u64,
        ts: row.get(5)?,
    })
}
