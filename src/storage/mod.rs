//! Local persistence: per-user session log files and the detection run
//! history database.

mod history;
mod session;

pub use history::{DetectionRun, HistoryStore};
pub use session::{SessionInfo, SessionLogEntry, SessionStore, SESSION_HEADER};
