//! Data types produced by the map aggregation step.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::map::band::{BandCounts, band};

/// One plottable point: a comfort index at a position, with the marker
/// colour of its band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    #[serde(rename = "Ride_Comfort_Index")]
    pub rci: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub colour: &'static str,
}

impl MapPoint {
    pub fn new(rci: f64, latitude: f64, longitude: f64) -> Self {
        MapPoint {
            rci,
            latitude,
            longitude,
            colour: band(rci).colour(),
        }
    }
}

/// Everything the map view needs, uploaded as JSON when publishing.
#[derive(Debug, Serialize)]
pub struct MapSummary {
    pub generated_at: DateTime<Utc>,
    pub datasets: usize,
    pub point_count: usize,
    pub bands: BandCounts,
    pub points: Vec<MapPoint>,
}
