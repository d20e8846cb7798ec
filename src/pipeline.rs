//! Batch pipeline: validate, filter and score a whole dataset.
//!
//! Stages run in a fixed order and each one that can empty the dataset fails
//! the batch with a [`PipelineError`]:
//!
//! 1. coerce numeric metadata columns (bad values become null),
//! 2. drop rows whose pdop exceeds the threshold,
//! 3. require the X, Y and Z columns,
//! 4. parse every acceleration cell,
//! 5. score every row and drop the ones that fail,
//! 6. write the parsed axes, speed and comfort index back to the kept rows.

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::dataset::{
    Dataset, NUMERIC_COLUMNS, PDOP_COLUMN, RCI_COLUMN, SampleRow, Schema, X_COLUMN, Y_COLUMN,
    Z_COLUMN, coerce_number, number_cell,
};
use crate::error::PipelineError;
use crate::reducer::reduce_row;
use crate::stats::ProcessingStats;

/// A processed dataset: surviving rows in input order with a comfort index
/// column, plus run statistics.
#[derive(Debug, Clone)]
pub struct AugmentedDataset {
    pub dataset: Dataset,
    pub stats: ProcessingStats,
}

impl AugmentedDataset {
    /// Comfort indices in row order.
    pub fn rci_values(&self) -> Vec<f64> {
        self.dataset
            .column(RCI_COLUMN)
            .map(|values| values.filter_map(coerce_number).collect())
            .unwrap_or_default()
    }
}

/// Runs the full pipeline over `dataset`.
#[tracing::instrument(skip_all, fields(rows = dataset.len(), columns = dataset.columns.len()))]
pub fn process(
    mut dataset: Dataset,
    config: &PipelineConfig,
) -> Result<AugmentedDataset, PipelineError> {
    let mut stats = ProcessingStats::new(dataset.len());

    coerce_numeric_columns(&mut dataset);

    if let Some(pdop_idx) = dataset.column_index(PDOP_COLUMN) {
        let before = dataset.len();
        // Missing pdop fails the comparison, so those rows go too.
        dataset.records.retain(|record| {
            coerce_number(&record.cells[pdop_idx]).is_some_and(|pdop| pdop <= config.max_pdop)
        });
        stats.dropped_by_quality = before - dataset.len();
        debug!(dropped = stats.dropped_by_quality, max_pdop = config.max_pdop, "Applied pdop filter");

        if dataset.is_empty() {
            return Err(PipelineError::AllRowsFilteredByQuality);
        }
    }

    let schema = Schema::resolve(&dataset)?;

    let rows: Vec<SampleRow> = dataset
        .records
        .iter()
        .map(|record| SampleRow::from_record(record, &schema))
        .collect();

    let axes: [(&str, fn(&SampleRow) -> bool); 3] = [
        (X_COLUMN, |r| r.x.is_empty()),
        (Y_COLUMN, |r| r.y.is_empty()),
        (Z_COLUMN, |r| r.z.is_empty()),
    ];
    for (name, is_empty) in axes {
        if rows.iter().all(is_empty) {
            return Err(PipelineError::NoUsableSignal(name.to_string()));
        }
    }

    let scores = score_rows(&rows, config);
    let scored = rows.len();

    let rci_idx = dataset.ensure_column(RCI_COLUMN);
    let mut kept = Vec::with_capacity(scored);
    let mut kept_rci = Vec::with_capacity(scored);
    for ((mut record, row), score) in dataset.records.drain(..).zip(rows).zip(scores) {
        let Some(rci) = score else { continue };

        // Parsed axes replace the raw text so stored output re-parses exactly.
        record.cells[schema.x] = samples_cell(&row.x);
        record.cells[schema.y] = samples_cell(&row.y);
        record.cells[schema.z] = samples_cell(&row.z);
        if let Some(speed_idx) = schema.speed {
            record.cells[speed_idx] = number_cell(row.speed);
        }
        record.cells[rci_idx] = number_cell(Some(rci));

        kept.push(record);
        kept_rci.push(rci);
    }
    stats.dropped_by_reduction = scored - kept.len();
    dataset.records = kept;

    if dataset.is_empty() {
        return Err(PipelineError::NoValidResults);
    }

    let augmented = AugmentedDataset {
        stats: stats.with_results(&kept_rci),
        dataset,
    };

    info!(
        input_rows = augmented.stats.input_rows,
        output_rows = augmented.stats.output_rows,
        dropped_by_quality = augmented.stats.dropped_by_quality,
        dropped_by_reduction = augmented.stats.dropped_by_reduction,
        "Pipeline complete"
    );
    Ok(augmented)
}

/// Replaces every numeric metadata cell with its numeric value or null.
fn coerce_numeric_columns(dataset: &mut Dataset) {
    for name in NUMERIC_COLUMNS {
        if let Some(idx) = dataset.column_index(name) {
            for record in &mut dataset.records {
                record.cells[idx] = number_cell(coerce_number(&record.cells[idx]));
            }
        }
    }
}

/// Scores rows independently; with `parallel` set the work is spread over
/// the rayon pool. Output order always matches `rows`.
fn score_rows(rows: &[SampleRow], config: &PipelineConfig) -> Vec<Option<f64>> {
    let score = |row: &SampleRow| reduce_row(row.index, &row.x, &row.y, &row.z, config);

    if config.parallel {
        rows.par_iter().map(score).collect()
    } else {
        rows.iter().map(score).collect()
    }
}

fn samples_cell(samples: &[f64]) -> Value {
    Value::Array(samples.iter().map(|&s| number_cell(Some(s))).collect())
}
