//! Error types shared across the crate.
//!
//! Batch-level failures ([`PipelineError`]) are user-visible rejections.
//! Row-level failures ([`ReductionError`]) never leave the pipeline; the row
//! is dropped and the failure is logged.

use thiserror::Error;

/// A whole-batch rejection. The `Display` text is the reason shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("All rows filtered out due to pdop > threshold")]
    AllRowsFilteredByQuality,

    #[error("No valid data found in column {0}")]
    NoUsableSignal(String),

    #[error("No valid results after processing")]
    NoValidResults,
}

/// Why a single row produced no comfort index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReductionError {
    #[error("axis {0} has no samples")]
    EmptyAxis(char),

    #[error("reduction produced a non-finite value ({0})")]
    NonFiniteResult(f64),
}

/// Failures decoding an input dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a top-level JSON array of records")]
    NotRecords,

    #[error("record {0} is not a JSON object")]
    NotAnObject(usize),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures reading or writing the result store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Processed data not found.")]
    NotFound,

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialise dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("stored dataset is unreadable: {0}")]
    Dataset(#[from] DatasetError),
}
