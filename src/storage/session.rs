//! Per-user session logs: one CSV file per streaming or live session, one
//! row per classified record. Files live under `<root>/<user>/` with the
//! `@` in account names flattened to `_` so the directory is shell-friendly.

use crate::error::{Error, Result};
use crate::pipeline::PredictionResult;
use crate::severity::Severity;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SESSION_HEADER: [&str; 5] = ["timestamp", "packet", "attack", "severity", "confidence"];

const FILE_STAMP: &str = "%Y-%m-%d_%H-%M-%S";
const ROW_STAMP: &str = "%Y-%m-%d %H:%M:%S";

/// A session file as shown to operators. `session_no` renumbers the user's
/// surviving files from oldest to newest, so deletions leave no gaps.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub user: String,
    pub filename: String,
    pub session_no: usize,
    /// Start time recovered from the filename
    pub started: String,
}

/// One row read back from a session file.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionLogEntry {
    pub timestamp: String,
    pub packet: u64,
    pub attack: String,
    pub severity: Severity,
    pub confidence: f32,
}

pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn user_dir(&self, user: &str) -> PathBuf {
        self.root.join(user.replace('@', "_"))
    }

    /// Create the next session file for `user`, write the header row and
    /// return its path.
    pub fn start_session(&self, user: &str) -> Result<PathBuf> {
        let dir = self.user_dir(user);
        std::fs::create_dir_all(&dir)?;

        let existing = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter(|e| is_session_file(&e.file_name().to_string_lossy()))
            .count();

        let stamp = chrono::Local::now().format(FILE_STAMP);
        let path = dir.join(format!("session_{}_{}.csv", existing + 1, stamp));

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_io)?;
        wtr.write_record(SESSION_HEADER).map_err(csv_io)?;
        wtr.flush()?;

        tracing::info!(user, path = %path.display(), "session started");
        Ok(path)
    }

    /// Append one verdict to an open session file. The row timestamp is the
    /// wall-clock moment of the append, not of capture.
    pub fn append(&self, path: &Path, result: &PredictionResult) -> Result<()> {
        let file = OpenOptions::new().append(true).open(path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record([
            chrono::Local::now().format(ROW_STAMP).to_string(),
            result.record_index.to_string(),
            result.predicted_label.clone(),
            result.severity.as_str().to_string(),
            format!("{}", result.confidence),
        ])
        .map_err(csv_io)?;
        wtr.flush()?;
        Ok(())
    }

    /// One user's sessions, newest first. A user with no log directory has
    /// no sessions.
    pub fn list_sessions(&self, user: &str) -> Result<Vec<SessionInfo>> {
        let dir = self.user_dir(user);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut numbered: Vec<(usize, String)> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                session_number(&name).map(|n| (n, name))
            })
            .collect();
        numbered.sort_by(|a, b| b.0.cmp(&a.0));

        let total = numbered.len();
        Ok(numbered
            .into_iter()
            .enumerate()
            .map(|(i, (_, filename))| SessionInfo {
                user: user.to_string(),
                started: started_from_filename(&filename),
                session_no: total - i,
                filename,
            })
            .collect())
    }

    /// Every session file under the root, grouped by user directory.
    pub fn list_all(&self) -> Result<Vec<SessionInfo>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut users: Vec<String> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        users.sort();

        let mut out = Vec::new();
        for user in users {
            out.extend(self.list_sessions(&user)?);
        }
        Ok(out)
    }

    /// Read a session file back as typed rows.
    pub fn read_session(&self, user: &str, filename: &str) -> Result<Vec<SessionLogEntry>> {
        check_filename(filename)?;
        let path = self.user_dir(user).join(filename);
        let mut rdr = csv::Reader::from_path(&path)
            .map_err(|e| Error::DataFormat(format!("session file unreadable: {e}")))?;
        let mut entries = Vec::new();
        for entry in rdr.deserialize() {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Delete one session file.
    pub fn delete_session(&self, user: &str, filename: &str) -> Result<()> {
        check_filename(filename)?;
        let path = self.user_dir(user).join(filename);
        std::fs::remove_file(&path)?;
        tracing::info!(user, filename, "session deleted");
        Ok(())
    }
}

fn is_session_file(name: &str) -> bool {
    name.starts_with("session_") && name.ends_with(".csv")
}

/// The counter embedded in `session_{n}_{stamp}.csv`.
fn session_number(name: &str) -> Option<usize> {
    if !is_session_file(name) {
        return None;
    }
    name.strip_prefix("session_")?
        .split('_')
        .next()?
        .parse()
        .ok()
}

/// Recover a display timestamp from a session filename.
fn started_from_filename(name: &str) -> String {
    name.trim_end_matches(".csv")
        .splitn(3, '_')
        .nth(2)
        .unwrap_or("unknown")
        .replace('_', " ")
}

/// Filenames come from operators; refuse anything that could escape the
/// user's directory.
fn check_filename(filename: &str) -> Result<()> {
    if !is_session_file(filename)
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(Error::DataFormat(format!(
            "invalid session filename: {filename:?}"
        )));
    }
    Ok(())
}

fn csv_io(e: csv::Error) -> Error {
    Error::Io(std::io::Error::other(e))
}
