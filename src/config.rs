//! Service configuration: artifact locations, streaming pace, live intake,
//! logging. Loaded once at process start; read-only thereafter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Data directory (run history database, session logs)
    pub data_dir: PathBuf,
    /// Preprocessing artifacts and model weights
    pub artifacts: ArtifactsConfig,
    /// Streaming replay pacing
    pub streaming: StreamingConfig,
    /// Live packet-metadata intake
    pub capture: CaptureConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding scaler.json, labels.json, columns.json, manifest.json
    pub dir: PathBuf,
    /// Path to the ONNX classifier weights
    pub model_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Fixed pause between consecutive streamed records (milliseconds)
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Packet-metadata CSV to replay in live mode; stdin when absent
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            artifacts: ArtifactsConfig::default(),
            streaming: StreamingConfig::default(),
            capture: CaptureConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("flowsentry"))
        .unwrap_or_else(|| PathBuf::from(".flowsentry"))
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
            model_path: PathBuf::from("artifacts/model.onnx"),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { source: None }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ServiceConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ServiceConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }

    pub fn session_root(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn stream_delay(&self) -> Duration {
        Duration::from_millis(self.streaming.delay_ms)
    }
}
