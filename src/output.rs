//! Output formatting for processed datasets and run statistics.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use std::io::Write;

use anyhow::Result;
use csv::WriterBuilder;
use serde_json::Value;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::stats::ProcessingStats;

/// Logs run statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &ProcessingStats) {
    debug!("{:#?}", stats);
}

/// Logs run statistics as pretty-printed JSON.
pub fn print_json(stats: &ProcessingStats) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Renders one cell for CSV output.
///
/// Numbers use six decimal places, arrays are written as JSON text and
/// missing values as empty fields.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Number(n) => match n.as_f64() {
            Some(v) if n.is_f64() => format!("{v:.6}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Writes `dataset` as CSV with a header row.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(&dataset.columns)?;
    for record in &dataset.records {
        writer.write_record(record.cells.iter().map(format_cell))?;
    }
    writer.flush()?;

    Ok(())
}

pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    Ok(buf)
}
