//! Training-side support. The network itself is trained out of process; this
//! module fits the preprocessing artifacts a trained model will be served
//! with, and reads the progress and result files the trainer drops so the
//! service can report on them.

use crate::error::Result;
use crate::preprocess::{self, RecordTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const STATUS_FILE: &str = "training_status.json";
pub const RESULTS_FILE: &str = "training_results.json";

/// What artifact fitting produced.
#[derive(Debug)]
pub struct FitReport {
    pub rows: usize,
    pub columns: usize,
    pub classes: Vec<String>,
}

/// Fit scaler, label codec and column order on a labelled training file and
/// persist the bundle to `out_dir`.
pub fn fit_artifacts(input: &Path, label_column: &str, out_dir: &Path) -> Result<FitReport> {
    let table = RecordTable::from_path(input)?;
    let fitted = preprocess::fit(&table, label_column)?;
    fitted.bundle.save(out_dir)?;

    Ok(FitReport {
        rows: fitted.matrix.nrows(),
        columns: fitted.bundle.columns.len(),
        classes: fitted.bundle.labels.classes().to_vec(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    Starting,
    Running,
    Completed,
}

/// Trainer progress, updated epoch by epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub status: TrainingPhase,
    pub epoch: u32,
    pub total_epochs: u32,
}

impl TrainingStatus {
    /// Read the status file; a missing or unreadable file means no training
    /// has been reported.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::Error::DataFormat(e.to_string()))?;
        std::fs::write(path, body)?;
        Ok(())
    }
}

/// Per-class evaluation numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Final evaluation the trainer leaves behind: per-epoch curves, the held-out
/// confusion matrix and a per-class report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResults {
    pub train_accuracy: Vec<f64>,
    pub val_accuracy: Vec<f64>,
    pub train_loss: Vec<f64>,
    pub val_loss: Vec<f64>,
    pub final_accuracy: f64,
    pub confusion_matrix: Vec<Vec<u64>>,
    pub per_class: BTreeMap<String, ClassReport>,
}

impl TrainingResults {
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::Error::DataFormat(e.to_string()))?;
        std::fs::write(path, body)?;
        Ok(())
    }
}
