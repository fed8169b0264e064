//! Error taxonomy for the detection service. All variants are fatal to the
//! current call: no retries, no row-level salvage within a batch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input table is unreadable, malformed, or empty, or a canonical
    /// column cannot be coerced to numeric.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Input cannot be reconciled with the canonical column order, or a
    /// preprocessing artifact is missing or corrupt.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Classifier weights are missing or cannot be loaded/executed.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// The csv crate surfaces both parse and underlying io failures through one
// error type; reads dominate here, so the blanket mapping is DataFormat.
// Write paths that want io semantics map explicitly.
impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::DataFormat(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
