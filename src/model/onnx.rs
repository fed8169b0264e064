//! ONNX Runtime classifier. Loads trained weights from disk and serves
//! softmax predictions; a missing or unloadable model is reported as
//! unavailable rather than served as a no-op.

use crate::error::{Error, Result};
use crate::model::Classifier;
use ndarray::{Array2, ArrayView3};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

pub struct OnnxClassifier {
    // ort sessions take &mut self to run
    session: Mutex<Session>,
    output_name: String,
    feature_dim: usize,
    num_classes: usize,
}

impl OnnxClassifier {
    /// Open a session over the weights at `path`. The feature and class
    /// dimensions come from the artifact bundle and are enforced on every
    /// call so a stale model cannot silently mis-shape the output.
    pub fn load(path: &Path, feature_dim: usize, num_classes: usize) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ModelUnavailable(format!(
                "model weights not found at {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| Error::ModelUnavailable(format!("session init failed: {e}")))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| Error::ModelUnavailable("model declares no outputs".to_string()))?;

        tracing::info!(
            path = %path.display(),
            feature_dim,
            num_classes,
            "classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            feature_dim,
            num_classes,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let (batch, steps, dim) = input.dim();
        if steps != 1 || dim != self.feature_dim {
            return Err(Error::SchemaMismatch(format!(
                "classifier expects (batch, 1, {}), got ({batch}, {steps}, {dim})",
                self.feature_dim
            )));
        }

        let tensor = Value::from_array(input.to_owned())
            .map_err(|e| Error::ModelUnavailable(format!("input tensor rejected: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::ModelUnavailable("classifier lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::ModelUnavailable(format!("inference failed: {e}")))?;

        let output = outputs.get(&self.output_name).ok_or_else(|| {
            Error::ModelUnavailable(format!("output {} missing from run", self.output_name))
        })?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::ModelUnavailable(format!("output tensor unreadable: {e}")))?;

        if data.len() != batch * self.num_classes {
            return Err(Error::SchemaMismatch(format!(
                "model emitted {} values for {} records of {} classes",
                data.len(),
                batch,
                self.num_classes
            )));
        }

        Array2::from_shape_vec((batch, self.num_classes), data.to_vec())
            .map_err(|e| Error::SchemaMismatch(format!("output reshape failed: {e}")))
    }
}
