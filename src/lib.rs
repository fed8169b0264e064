//! Flowsentry — network intrusion detection inference service.
//!
//! Modular structure:
//! - [`schema`] — Canonical traffic-record feature schema and code tables
//! - [`preprocess`] — CSV tables, scaling, fitted artifact bundles
//! - [`model`] — ONNX classifier inference and test doubles
//! - [`severity`] — Category to severity tier mapping
//! - [`pipeline`] — Batch and paced streaming detection
//! - [`capture`] — Live packet-metadata intake and flow tracking
//! - [`storage`] — Session log files and detection run history
//! - [`training`] — Artifact fitting and trainer progress files
//! - [`logging`] — Structured JSON logging

pub mod capture;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod schema;
pub mod severity;
pub mod storage;
pub mod training;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use model::{Classifier, OnnxClassifier, ScriptedClassifier, SeededClassifier};
pub use pipeline::{DetectionContext, PredictionResult, StreamDetection};
pub use preprocess::{ArtifactBundle, RecordTable};
pub use schema::FeatureVector;
pub use severity::Severity;
pub use storage::{HistoryStore, SessionStore};
pub use logging::StructuredLogger;
