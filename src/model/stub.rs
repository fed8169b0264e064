//! Classifier doubles. `ScriptedClassifier` replays fixed softmax rows for
//! deterministic tests; `SeededClassifier` fabricates reproducible verdicts
//! for demos without weights. Neither may serve real traffic decisions.

use crate::error::{Error, Result};
use crate::model::Classifier;
use ndarray::{Array2, ArrayView3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays a fixed script of softmax rows, one per record in call order,
/// wrapping when the script runs out.
pub struct ScriptedClassifier {
    rows: Vec<Vec<f32>>,
    cursor: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(rows: Vec<Vec<f32>>) -> Self {
        assert!(!rows.is_empty(), "script needs at least one row");
        let width = rows[0].len();
        assert!(
            rows.iter().all(|r| r.len() == width),
            "script rows must share a width"
        );
        Self {
            rows,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.rows[0].len()
    }
}

impl Classifier for ScriptedClassifier {
    fn predict(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let (batch, steps, _) = input.dim();
        if steps != 1 {
            return Err(Error::SchemaMismatch(format!(
                "classifier expects single-step sequences, got {steps} steps"
            )));
        }
        let width = self.num_classes();
        let mut out = Array2::<f32>::zeros((batch, width));
        for i in 0..batch {
            let at = self.cursor.fetch_add(1, Ordering::SeqCst) % self.rows.len();
            for (j, &v) in self.rows[at].iter().enumerate() {
                out[(i, j)] = v;
            }
        }
        Ok(out)
    }
}

/// Draws a random class per record with a peaked softmax row. The same seed
/// yields the same verdict sequence, which keeps demos replayable.
pub struct SeededClassifier {
    num_classes: usize,
    rng: Mutex<StdRng>,
}

impl SeededClassifier {
    pub fn new(num_classes: usize, seed: u64) -> Self {
        assert!(num_classes > 0, "need at least one class");
        Self {
            num_classes,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Classifier for SeededClassifier {
    fn predict(&self, input: ArrayView3<'_, f32>) -> Result<Array2<f32>> {
        let (batch, steps, _) = input.dim();
        if steps != 1 {
            return Err(Error::SchemaMismatch(format!(
                "classifier expects single-step sequences, got {steps} steps"
            )));
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::ModelUnavailable("rng lock poisoned".to_string()))?;

        let mut out = Array2::<f32>::zeros((batch, self.num_classes));
        for i in 0..batch {
            let winner = rng.gen_range(0..self.num_classes);
            let peak = rng.gen_range(0.70..0.99_f32);
            let rest = if self.num_classes > 1 {
                (1.0 - peak) / (self.num_classes - 1) as f32
            } else {
                0.0
            };
            for j in 0..self.num_classes {
                out[(i, j)] = if j == winner { peak } else { rest };
            }
        }
        Ok(out)
    }
}
