//! # Spectral Primitives
//!
//! Windowing and bin arithmetic shared by the peak-frequency estimator.
//! The estimator scans the full bin range, DC and mirrored negative half
//! included, and folds negative-frequency bins onto the positive axis.
//! On silence the peak lands on an arbitrary bin, typically near DC;
//! that is a known weakness of the method, not an error.

use rustfft::num_complex::Complex;

/// Applies a Hann window to the input buffer to reduce spectral leakage.
///
/// The Hann window tapers the signal to zero at the block edges, which
/// keeps the rectangular block boundary from smearing energy across bins.
///
/// # Arguments
/// * `buffer` - Audio buffer to window (modified in-place)
pub fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n == 0 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Index of the bin with the largest magnitude across the full spectrum.
///
/// Ties resolve to the highest index; for a real-valued input the
/// spectrum is symmetric, so a tie and its mirror fold to the same
/// frequency anyway.
pub fn peak_bin(spectrum: &[Complex<f32>]) -> usize {
    spectrum
        .iter()
        .enumerate()
        .max_by(|a, b| {
            a.1.norm_sqr()
                .partial_cmp(&b.1.norm_sqr())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Maps a bin index to its frequency in Hz.
///
/// Bin `k` corresponds to `k * sample_rate / n` up to the Nyquist bin and
/// to `(k - n) * sample_rate / n` beyond it; the absolute value folds the
/// negative half onto the positive axis, so the result is always within
/// `[0, sample_rate / 2]`.
pub fn bin_frequency(bin: usize, n: usize, sample_rate: u32) -> f32 {
    let k = if bin <= n / 2 {
        bin as f32
    } else {
        bin as f32 - n as f32
    };
    (k * sample_rate as f32 / n as f32).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_tapers_to_zero_at_edges() {
        let mut buffer = vec![1.0_f32; 1024];
        apply_hann_window(&mut buffer);

        assert!(buffer[0].abs() < 1e-6);
        assert!(buffer[1023].abs() < 1e-6);
        // Midpoint of the taper stays close to unity gain.
        assert!((buffer[511] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn hann_window_handles_empty_buffer() {
        let mut buffer: Vec<f32> = Vec::new();
        apply_hann_window(&mut buffer);
        assert!(buffer.is_empty());
    }

    #[test]
    fn bin_frequency_maps_positive_half_directly() {
        assert_eq!(bin_frequency(0, 4096, 44_100), 0.0);
        let bin_width = 44_100.0 / 4096.0;
        assert!((bin_frequency(1, 4096, 44_100) - bin_width).abs() < 1e-3);
        assert!((bin_frequency(2048, 4096, 44_100) - 22_050.0).abs() < 1e-3);
    }

    #[test]
    fn bin_frequency_folds_negative_half() {
        // The topmost bin mirrors the first positive one.
        let folded = bin_frequency(4095, 4096, 44_100);
        let direct = bin_frequency(1, 4096, 44_100);
        assert!((folded - direct).abs() < 1e-3);
        assert!(folded >= 0.0);
    }

    #[test]
    fn peak_bin_finds_largest_magnitude() {
        let mut spectrum = vec![Complex { re: 0.0_f32, im: 0.0 }; 16];
        spectrum[5] = Complex { re: 3.0, im: 4.0 };
        spectrum[9] = Complex { re: 1.0, im: 1.0 };
        assert_eq!(peak_bin(&spectrum), 5);
    }
}
