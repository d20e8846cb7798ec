//! Ride Comfort Index computation for vehicle accelerometer recordings.
//!
//! Each row of an uploaded dataset carries three acceleration arrays (in g)
//! plus GPS metadata. The [`pipeline`] validates the batch, weights every
//! axis in the frequency domain ([`weighting`]), and reduces each row to a
//! single comfort index ([`reducer`]). Results go to a [`store`] and are
//! later paired with coordinates for the [`map`] view.

pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod map;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod reducer;
pub mod stats;
pub mod store;
pub mod weighting;
