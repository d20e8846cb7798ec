//! ISO 2631-1 style frequency weighting.
//!
//! A time series is moved to the frequency domain with an FFT, every bin is
//! scaled by the curve's gain at that bin's absolute frequency, and the
//! inverse transform's magnitude is returned.

use num_complex::Complex64;
use rustfft::FftPlanner;

/// Frequency weighting curves. Both share the same breakpoints and differ only
/// in which axes they are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingCurve {
    /// Applied to the Z axis.
    Vertical,
    /// Applied to the X and Y axes.
    Horizontal,
}

impl WeightingCurve {
    /// Gain in `[0, 1]` for a non-negative frequency in Hz.
    ///
    /// | Range            | Gain      |
    /// |------------------|-----------|
    /// | f < 0.4          | 0         |
    /// | 0.4 <= f <= 2    | 0.4 * f   |
    /// | 2 < f <= 100     | 1         |
    /// | f > 100          | 0         |
    pub fn gain(self, frequency: f64) -> f64 {
        match self {
            WeightingCurve::Vertical | WeightingCurve::Horizontal => match frequency {
                f if f < 0.4 => 0.0,
                f if f <= 2.0 => 0.4 * f,
                f if f <= 100.0 => 1.0,
                _ => 0.0,
            },
        }
    }
}

/// Frequency of FFT bin `k` for `n` samples at `sample_rate_hz`, following the
/// conventional `fftfreq` layout (non-negative bins first, then negatives).
pub fn bin_frequency(k: usize, n: usize, sample_rate_hz: f64) -> f64 {
    let spacing = sample_rate_hz / n as f64;
    if 2 * k < n {
        k as f64 * spacing
    } else {
        (k as f64 - n as f64) * spacing
    }
}

/// Applies `curve` to `series` and returns a weighted series of equal length.
pub fn apply_weighting(series: &[f64], sample_rate_hz: f64, curve: WeightingCurve) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex64> = series.iter().map(|&s| Complex64::new(s, 0.0)).collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    for (k, coefficient) in buffer.iter_mut().enumerate() {
        *coefficient *= curve.gain(bin_frequency(k, n, sample_rate_hz).abs());
    }

    planner.plan_fft_inverse(n).process(&mut buffer);

    // rustfft leaves the inverse unnormalised
    let scale = 1.0 / n as f64;
    buffer.iter().map(|&c| (c * scale).norm()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [WeightingCurve; 2] = [WeightingCurve::Vertical, WeightingCurve::Horizontal];

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gain_breakpoints() {
        for curve in CURVES {
            assert_eq!(curve.gain(0.0), 0.0);
            assert_eq!(curve.gain(0.39), 0.0);
            assert!(approx_eq(curve.gain(0.4), 0.16));
            assert!(approx_eq(curve.gain(1.0), 0.4));
            assert!(approx_eq(curve.gain(2.0), 0.8));
            assert_eq!(curve.gain(2.01), 1.0);
            assert_eq!(curve.gain(100.0), 1.0);
            assert_eq!(curve.gain(100.01), 0.0);
            assert_eq!(curve.gain(500.0), 0.0);
        }
    }

    #[test]
    fn test_gain_is_linear_on_ramp() {
        let curve = WeightingCurve::Vertical;
        let mid = curve.gain(1.2);
        assert!(approx_eq(mid, (curve.gain(0.4) + curve.gain(2.0)) / 2.0));
    }

    #[test]
    fn test_bin_frequency_layout() {
        // n = 4 at 4 Hz: [0, 1, -2, -1]
        let freqs: Vec<f64> = (0..4).map(|k| bin_frequency(k, 4, 4.0)).collect();
        assert_eq!(freqs, vec![0.0, 1.0, -2.0, -1.0]);

        // n = 5 at 5 Hz: [0, 1, 2, -2, -1]
        let freqs: Vec<f64> = (0..5).map(|k| bin_frequency(k, 5, 5.0)).collect();
        assert_eq!(freqs, vec![0.0, 1.0, 2.0, -2.0, -1.0]);
    }

    #[test]
    fn test_empty_and_single_sample() {
        assert!(apply_weighting(&[], 1000.0, WeightingCurve::Vertical).is_empty());
        assert_eq!(
            apply_weighting(&[3.2], 1000.0, WeightingCurve::Horizontal),
            vec![0.0]
        );
    }

    #[test]
    fn test_preserves_length() {
        for n in [2, 3, 17, 100, 1000] {
            let series: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();
            assert_eq!(apply_weighting(&series, 1000.0, WeightingCurve::Vertical).len(), n);
        }
    }

    #[test]
    fn test_constant_signal_is_removed() {
        // A DC signal lives entirely in bin 0, which has zero gain.
        let series = vec![9.81; 256];
        let weighted = apply_weighting(&series, 1000.0, WeightingCurve::Vertical);
        assert!(weighted.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_in_band_sine_passes_through() {
        // 50 Hz sits in the unit-gain band; an integer number of periods keeps
        // all energy in two bins.
        let rate = 1000.0;
        let series: Vec<f64> = (0..1000)
            .map(|i| (2.0 * std::f64::consts::PI * 50.0 * i as f64 / rate).sin())
            .collect();
        let weighted = apply_weighting(&series, rate, WeightingCurve::Horizontal);
        for (w, s) in weighted.iter().zip(&series) {
            assert!((w - s.abs()).abs() < 1e-6);
        }
    }
}
