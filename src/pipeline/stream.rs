//! Paced record-at-a-time detection over a preprocessed table.

use crate::error::Result;
use crate::pipeline::{DetectionContext, PredictionResult};
use ndarray::{Array2, Axis};
use std::time::Duration;

/// Lazy iterator over per-record verdicts. Each step classifies the next
/// row; the fixed delay runs between consecutive records, so the first
/// verdict arrives immediately and no pause trails the last one. The first
/// error fuses the iterator.
pub struct StreamDetection<'a> {
    ctx: &'a DetectionContext,
    matrix: Array2<f32>,
    delay: Duration,
    next_row: usize,
    failed: bool,
}

impl<'a> StreamDetection<'a> {
    pub(crate) fn new(ctx: &'a DetectionContext, matrix: Array2<f32>, delay: Duration) -> Self {
        Self {
            ctx,
            matrix,
            delay,
            next_row: 0,
            failed: false,
        }
    }

    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.matrix.nrows() - self.next_row
        }
    }
}

impl Iterator for StreamDetection<'_> {
    type Item = Result<PredictionResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_row >= self.matrix.nrows() {
            return None;
        }
        if self.next_row > 0 && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let row = self.matrix.row(self.next_row).to_owned();
        let input = row.insert_axis(Axis(0)).insert_axis(Axis(0));
        self.next_row += 1;
        let record_index = self.next_row;

        let item = self
            .ctx
            .classifier
            .predict(input.view())
            .and_then(|scores| {
                self.ctx.check_width(&scores)?;
                self.ctx.result_from_row(&scores.row(0).to_vec(), record_index)
            });

        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.remaining();
        (rem, Some(rem))
    }
}
