use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::map::band::BandCounts;
use crate::map::utility::{mean, min_max, stddev};

/// Summary of a single pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingStats {
    pub timestamp: DateTime<Utc>,
    pub input_rows: usize,

    // rows removed, by stage
    pub dropped_by_quality: usize,
    pub dropped_by_reduction: usize,

    pub output_rows: usize,

    // comfort index distribution
    pub rci_mean: f64,
    pub rci_stddev: f64,
    pub rci_min: Option<f64>,
    pub rci_max: Option<f64>,
    pub bands: BandCounts,
}

impl ProcessingStats {
    pub fn new(input_rows: usize) -> Self {
        ProcessingStats {
            timestamp: Utc::now(),
            input_rows,
            ..Default::default()
        }
    }

    /// Fills in the distribution fields from the surviving comfort indices.
    pub fn with_results(mut self, rci: &[f64]) -> Self {
        self.output_rows = rci.len();
        self.rci_mean = mean(rci);
        self.rci_stddev = stddev(rci, self.rci_mean);
        let range = min_max(rci);
        self.rci_min = range.map(|(lo, _)| lo);
        self.rci_max = range.map(|(_, hi)| hi);
        self.bands = BandCounts::from_values(rci.iter().copied());
        self
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of input rows that produced a comfort index.
    pub fn yield_pct(&self) -> f64 {
        Self::pct(self.output_rows, self.input_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(ProcessingStats::pct(10, 0), 0.0);
    }

    #[test]
    fn test_with_results() {
        let stats = ProcessingStats::new(4).with_results(&[0.5, 1.5, 2.5]);

        assert_eq!(stats.output_rows, 3);
        assert_eq!(stats.rci_mean, 1.5);
        assert_eq!(stats.rci_min, Some(0.5));
        assert_eq!(stats.rci_max, Some(2.5));
        assert_eq!(stats.bands.total(), 3);
        assert_eq!(stats.yield_pct(), 75.0);
    }

    #[test]
    fn test_with_no_results() {
        let stats = ProcessingStats::new(0).with_results(&[]);
        assert_eq!(stats.rci_min, None);
        assert_eq!(stats.rci_mean, 0.0);
    }
}
