//! # Peak-Frequency Estimation
//!
//! Converts one sample block into a single instantaneous frequency
//! estimate: Hann window, forward FFT, then the frequency of the
//! largest-magnitude bin. Purely per-block; smoothing against history
//! and matching against a tuning happen downstream in the evaluator.

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::audio::{BLOCK_SIZE, SAMPLE_RATE};
use crate::fft::{apply_hann_window, bin_frequency, peak_bin};

/// Estimates the dominant frequency of fixed-size sample blocks.
///
/// The forward FFT is planned once at construction and reused for every
/// block.
pub struct PitchEstimator {
    fft: Arc<dyn Fft<f32>>,
}

impl PitchEstimator {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(BLOCK_SIZE),
        }
    }

    /// Returns the peak-magnitude frequency of `block` in Hz.
    ///
    /// Always returns a value in `[0, SAMPLE_RATE / 2]`; silence or noise
    /// yields a spurious but well-formed estimate.
    ///
    /// # Panics
    /// * If the block does not hold exactly [`BLOCK_SIZE`] samples.
    pub fn estimate(&self, block: &[i16]) -> f32 {
        if block.len() != BLOCK_SIZE {
            panic!("sample block must hold exactly {BLOCK_SIZE} samples");
        }

        let mut windowed: Vec<f32> = block.iter().map(|&s| s as f32).collect();
        apply_hann_window(&mut windowed);

        let mut spectrum: Vec<Complex<f32>> = windowed
            .into_iter()
            .map(|re| Complex { re, im: 0.0 })
            .collect();
        self.fft.process(&mut spectrum);

        bin_frequency(peak_bin(&spectrum), BLOCK_SIZE, SAMPLE_RATE)
    }
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self::new()
    }
}
