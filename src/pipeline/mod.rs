//! Detection pipeline: preprocess records, run the classifier, map verdicts
//! to severities. Batch mode scores a whole table in one classifier call;
//! stream mode replays records one at a time with a fixed pace.

mod stream;

pub use stream::StreamDetection;

use crate::error::{Error, Result};
use crate::model::{self, Classifier};
use crate::preprocess::{self, ArtifactBundle, RecordTable};
use crate::schema::FeatureVector;
use crate::severity::Severity;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One classified record. `record_index` is 1-based, matching the row
/// numbering operators see in the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub record_index: usize,
    pub predicted_label: String,
    pub confidence: f32,
    pub severity: Severity,
}

/// Fitted artifacts plus a classifier, ready to score records.
pub struct DetectionContext {
    bundle: ArtifactBundle,
    classifier: Box<dyn Classifier>,
}

impl DetectionContext {
    pub fn new(bundle: ArtifactBundle, classifier: Box<dyn Classifier>) -> Self {
        Self { bundle, classifier }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Score every record in one classifier call and return the input table
    /// with `predicted_attack`, `confidence` and `severity` columns appended.
    pub fn detect_batch(&self, table: &RecordTable) -> Result<RecordTable> {
        let matrix = preprocess::transform(table, &self.bundle)?;
        let input = matrix.insert_axis(Axis(1));
        let scores = self.classifier.predict(input.view())?;
        self.check_width(&scores)?;

        let mut labels = Vec::with_capacity(scores.nrows());
        let mut confidences = Vec::with_capacity(scores.nrows());
        let mut severities = Vec::with_capacity(scores.nrows());
        for (i, row) in scores.axis_iter(Axis(0)).enumerate() {
            let result = self.result_from_row(&row.to_vec(), i + 1)?;
            labels.push(result.predicted_label);
            confidences.push(format!("{}", result.confidence));
            severities.push(result.severity.as_str().to_string());
        }

        let mut out = table.clone();
        out.push_column("predicted_attack", labels)?;
        out.push_column("confidence", confidences)?;
        out.push_column("severity", severities)?;

        tracing::info!(records = out.row_count(), "batch detection complete");
        Ok(out)
    }

    /// Preprocess the whole table up front, then hand back a lazy iterator
    /// that classifies one record per step, pausing `delay` between records.
    /// The iterator is finite and can be rebuilt to replay from the start.
    pub fn detect_stream(&self, table: &RecordTable, delay: Duration) -> Result<StreamDetection<'_>> {
        let matrix = preprocess::transform(table, &self.bundle)?;
        Ok(StreamDetection::new(self, matrix, delay))
    }

    /// Classify a single schema-ordered feature vector, as produced by live
    /// capture.
    pub fn classify_record(
        &self,
        vector: &FeatureVector,
        record_index: usize,
    ) -> Result<PredictionResult> {
        let matrix = preprocess::transform_vector(vector, &self.bundle)?;
        let input = matrix.insert_axis(Axis(1));
        let scores = self.classifier.predict(input.view())?;
        self.check_width(&scores)?;
        self.result_from_row(&scores.row(0).to_vec(), record_index)
    }

    pub(crate) fn check_width(&self, scores: &Array2<f32>) -> Result<()> {
        let expected = self.bundle.labels.num_classes();
        if scores.ncols() != expected {
            return Err(Error::SchemaMismatch(format!(
                "model emitted {} classes, vocabulary has {}",
                scores.ncols(),
                expected
            )));
        }
        Ok(())
    }

    pub(crate) fn result_from_row(
        &self,
        row: &[f32],
        record_index: usize,
    ) -> Result<PredictionResult> {
        let (index, confidence) = model::decide(row);
        let label = self.bundle.labels.decode(index).ok_or_else(|| {
            Error::SchemaMismatch(format!("class index {index} out of vocabulary"))
        })?;
        Ok(PredictionResult {
            record_index,
            predicted_label: label.to_string(),
            confidence: round3(confidence),
            severity: Severity::of_label(label),
        })
    }
}

/// Round to three decimals, the precision verdicts are reported at.
pub fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
