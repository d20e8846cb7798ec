//! Row reduction: three acceleration axes in, one Ride Comfort Index out.

use tracing::warn;

use crate::config::PipelineConfig;
use crate::error::ReductionError;
use crate::weighting::{WeightingCurve, apply_weighting};

/// Percentile of `values` using linear interpolation between closest ranks.
///
/// `p` is in `[0, 100]`. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Computes the comfort index for one row, or the reason it could not.
///
/// Samples are converted from g to m/s², weighted (horizontal curve on X and
/// Y, vertical on Z), reduced to their configured percentile and combined as
/// `scaling_factor * sqrt(px² + py² + pz²)`.
pub fn try_reduce_row(
    x: &[f64],
    y: &[f64],
    z: &[f64],
    config: &PipelineConfig,
) -> Result<f64, ReductionError> {
    let axes = [
        ('X', x, WeightingCurve::Horizontal),
        ('Y', y, WeightingCurve::Horizontal),
        ('Z', z, WeightingCurve::Vertical),
    ];

    let mut sum_of_squares = 0.0;
    for (name, samples, curve) in axes {
        let si: Vec<f64> = samples.iter().map(|s| s * config.gravity).collect();
        let weighted = apply_weighting(&si, config.sample_rate_hz, curve);
        let p = percentile(&weighted, config.percentile).ok_or(ReductionError::EmptyAxis(name))?;
        sum_of_squares += p * p;
    }

    let rci = config.scaling_factor * sum_of_squares.sqrt();
    if !rci.is_finite() {
        return Err(ReductionError::NonFiniteResult(rci));
    }
    Ok(rci)
}

/// Like [`try_reduce_row`], but logs the failure and yields `None`.
///
/// `row` is only used to identify the row in the diagnostic.
pub fn reduce_row(
    row: usize,
    x: &[f64],
    y: &[f64],
    z: &[f64],
    config: &PipelineConfig,
) -> Option<f64> {
    match try_reduce_row(x, y, z, config) {
        Ok(rci) => Some(rci),
        Err(e) => {
            warn!(row, error = %e, "Error calculating ride comfort index");
            None
        }
    }
}
