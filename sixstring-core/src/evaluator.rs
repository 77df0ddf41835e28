//! # Tuning Evaluation
//!
//! Smooths per-block frequency estimates over a short rolling history and
//! classifies the average against the active tuning table.

use std::collections::VecDeque;

use crate::tuning::TuningTable;
use crate::{TuningResult, Verdict};

/// Number of recent estimates averaged per cycle.
pub const AVERAGE_COUNT: usize = 5;

/// Absolute deviation in Hz treated as in tune.
pub const IN_TUNE_TOLERANCE_HZ: f32 = 0.5;

/// Maintains the estimate history and the active tuning table.
///
/// The history is a strict FIFO bounded at [`AVERAGE_COUNT`]; it is owned
/// here and mutated only by [`TuningEvaluator::update`]. Swapping the
/// tuning table does not clear it, so the smoothed average stays warm
/// across a preset change.
pub struct TuningEvaluator {
    history: VecDeque<f32>,
    table: TuningTable,
}

impl TuningEvaluator {
    pub fn new(table: TuningTable) -> Self {
        Self {
            history: VecDeque::with_capacity(AVERAGE_COUNT),
            table,
        }
    }

    /// Replaces the active tuning table. Keeps the estimate history.
    pub fn set_tuning(&mut self, table: TuningTable) {
        self.table = table;
    }

    pub fn tuning(&self) -> &TuningTable {
        &self.table
    }

    /// Folds one estimate into the history and classifies the average.
    pub fn update(&mut self, estimate: f32) -> TuningResult {
        self.history.push_back(estimate);
        if self.history.len() > AVERAGE_COUNT {
            self.history.pop_front();
        }

        let avg = self.history.iter().sum::<f32>() / self.history.len() as f32;

        let closest = self.table.nearest(avg);
        let difference = avg - closest.frequency;

        let (verdict, progress) = if difference.abs() <= IN_TUNE_TOLERANCE_HZ {
            (Verdict::InTune, 100)
        } else if difference < 0.0 {
            let progress = (100.0 * (1.0 + difference / closest.frequency)).round() as i32;
            (Verdict::Flat, progress)
        } else {
            let progress = (100.0 * (1.0 - difference / closest.frequency)).round() as i32;
            (Verdict::Sharp, progress)
        };

        TuningResult {
            note: closest.name.clone(),
            target_frequency: closest.frequency,
            difference,
            progress,
            verdict,
        }
    }
}
