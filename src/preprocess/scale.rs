//! Min-max feature scaling. The scaler is fitted once on training data and
//! persisted alongside the model; inference must reuse the fitted ranges so
//! feature values land in the interval the network was trained on.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

const RANGE_EPSILON: f32 = 1e-12;

/// Per-column min/max learned from training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f32>,
    maxs: Vec<f32>,
}

impl MinMaxScaler {
    /// Learn column bounds from a training matrix.
    pub fn fit(matrix: &Array2<f32>) -> Self {
        let cols = matrix.ncols();
        let mut mins = vec![f32::INFINITY; cols];
        let mut maxs = vec![f32::NEG_INFINITY; cols];
        for row in matrix.axis_iter(Axis(0)) {
            for (j, &v) in row.iter().enumerate() {
                if v < mins[j] {
                    mins[j] = v;
                }
                if v > maxs[j] {
                    maxs[j] = v;
                }
            }
        }
        // An empty matrix leaves the sentinels in place; apply() treats the
        // degenerate range as width 1 so it still maps to finite output.
        Self { mins, maxs }
    }

    pub fn len(&self) -> usize {
        self.mins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    /// Scale each column into [0, 1]. Constant columns map to 0; values
    /// outside the fitted range are clamped rather than extrapolated.
    pub fn apply(&self, matrix: &mut Array2<f32>) {
        for mut row in matrix.axis_iter_mut(Axis(0)) {
            for (j, v) in row.iter_mut().enumerate() {
                let min = self.mins[j];
                let range = self.maxs[j] - min;
                let range = if range.abs() <= RANGE_EPSILON { 1.0 } else { range };
                *v = ((*v - min) / range).clamp(0.0, 1.0);
            }
        }
    }
}
