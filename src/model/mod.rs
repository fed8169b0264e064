//! Classifier abstraction and implementations. The ONNX session serves real
//! verdicts; the doubles in `stub` exist for tests and offline demos.

mod onnx;
mod stub;

pub use onnx::OnnxClassifier;
pub use stub::{ScriptedClassifier, SeededClassifier};

use crate::error::Result;
use ndarray::{Array2, ArrayView3};

/// A trained traffic classifier.
///
/// Input is shaped `(batch, 1, feature_count)`: each record is a single-step
/// sequence of scaled features. Output is `(batch, num_classes)` where each
/// row is a softmax distribution over the class vocabulary.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>>;
}

/// Pick the verdict from one softmax row: the winning class index and its
/// probability. Ties resolve to the lowest index.
pub fn decide(row: &[f32]) -> (usize, f32) {
    let mut best = 0usize;
    let mut best_score = f32::NEG_INFINITY;
    for (i, &score) in row.iter().enumerate() {
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    if row.is_empty() {
        (0, 0.0)
    } else {
        (best, best_score)
    }
}
