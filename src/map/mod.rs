//! Map aggregation.
//!
//! Reads stored comfort-index datasets, pairs each index with its GPS
//! position, buckets indices into comfort bands, and optionally publishes
//! the result as JSON to S3.

pub mod aggregate;
pub mod band;
pub mod types;
pub mod utility;
pub mod writetos3;
