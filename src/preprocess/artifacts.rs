//! Fitted preprocessing artifacts: the min-max scaler, the label codec and
//! the canonical column order. Persisted as JSON files next to the model
//! weights, with a SHA-256 manifest so a corrupted or mixed-version bundle is
//! refused instead of silently skewing features.

use crate::error::{Error, Result};
use crate::preprocess::scale::MinMaxScaler;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

const SCALER_FILE: &str = "scaler.json";
const LABELS_FILE: &str = "labels.json";
const COLUMNS_FILE: &str = "columns.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Maps class labels to the contiguous indices the classifier emits.
/// Classes are stored sorted so the index assignment is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCodec {
    label_column: String,
    classes: Vec<String>,
}

impl LabelCodec {
    /// Build a codec from observed labels. Duplicates collapse; the sorted
    /// order determines each class index.
    pub fn fit(label_column: &str, labels: &[&str]) -> Self {
        let mut classes: Vec<String> = labels.iter().map(|l| l.trim().to_string()).collect();
        classes.sort();
        classes.dedup();
        Self {
            label_column: label_column.to_string(),
            classes,
        }
    }

    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
            .map(|i| i as u32)
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|s| s.as_str())
    }
}

/// Everything inference needs besides the model weights.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub scaler: MinMaxScaler,
    pub labels: LabelCodec,
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    created_at: String,
    digests: BTreeMap<String, String>,
}

impl ArtifactBundle {
    /// Write all artifact files plus a digest manifest into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let mut digests = BTreeMap::new();
        for (name, body) in [
            (SCALER_FILE, to_json(&self.scaler)?),
            (LABELS_FILE, to_json(&self.labels)?),
            (COLUMNS_FILE, to_json(&self.columns)?),
        ] {
            std::fs::write(dir.join(name), &body)?;
            digests.insert(name.to_string(), sha256_hex(body.as_bytes()));
        }

        let manifest = Manifest {
            created_at: chrono::Utc::now().to_rfc3339(),
            digests,
        };
        std::fs::write(dir.join(MANIFEST_FILE), to_json(&manifest)?)?;

        tracing::info!(dir = %dir.display(), "artifacts saved");
        Ok(())
    }

    /// Load and verify a bundle. Any missing file, digest mismatch or parse
    /// failure is a schema mismatch: the bundle no longer matches what
    /// training produced.
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest: Manifest = read_artifact(dir, MANIFEST_FILE, None)?;

        let scaler: MinMaxScaler =
            read_artifact(dir, SCALER_FILE, manifest.digests.get(SCALER_FILE))?;
        let labels: LabelCodec =
            read_artifact(dir, LABELS_FILE, manifest.digests.get(LABELS_FILE))?;
        let columns: Vec<String> =
            read_artifact(dir, COLUMNS_FILE, manifest.digests.get(COLUMNS_FILE))?;

        if scaler.len() != columns.len() {
            return Err(Error::SchemaMismatch(format!(
                "scaler covers {} columns, column order lists {}",
                scaler.len(),
                columns.len()
            )));
        }
        if labels.num_classes() == 0 {
            return Err(Error::SchemaMismatch(
                "label codec has no classes".to_string(),
            ));
        }

        Ok(Self {
            scaler,
            labels,
            columns,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::SchemaMismatch(format!("artifact serialization failed: {e}")))
}

fn read_artifact<T: for<'de> Deserialize<'de>>(
    dir: &Path,
    name: &str,
    expected_digest: Option<&String>,
) -> Result<T> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(Error::SchemaMismatch(format!("artifact {name} missing")));
    }
    let body = std::fs::read_to_string(&path)?;

    if let Some(expected) = expected_digest {
        let actual = sha256_hex(body.as_bytes());
        if &actual != expected {
            return Err(Error::SchemaMismatch(format!(
                "artifact {name} digest mismatch"
            )));
        }
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::SchemaMismatch(format!("artifact {name} unreadable: {e}")))
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
