use chrono::Utc;
use tracing::{debug, info, warn};

use crate::dataset::{COORDINATE_COLUMN, Dataset, RCI_COLUMN, coerce_number};
use crate::map::band::BandCounts;
use crate::map::types::{MapPoint, MapSummary};

/// Splits a `"lat,lon"` string into two finite numbers.
pub fn parse_coordinate(text: &str) -> Option<(f64, f64)> {
    let (lat, lon) = text.split_once(',')?;
    if lon.contains(',') {
        return None;
    }
    let lat = lat.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    let lon = lon.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some((lat, lon))
}

/// Extracts map points from one stored dataset.
///
/// Returns `None` if the dataset lacks the coordinate or comfort-index column.
/// Rows whose coordinate or comfort index cannot be parsed are skipped.
pub fn points_from_dataset(dataset: &Dataset) -> Option<Vec<MapPoint>> {
    let coord_idx = dataset.column_index(COORDINATE_COLUMN)?;
    let rci_idx = dataset.column_index(RCI_COLUMN)?;

    let points = dataset
        .records
        .iter()
        .filter_map(|record| {
            let rci = coerce_number(&record.cells[rci_idx])?;
            let (latitude, longitude) = record.cells[coord_idx]
                .as_str()
                .and_then(parse_coordinate)?;
            Some(MapPoint::new(rci, latitude, longitude))
        })
        .collect();

    Some(points)
}

/// Unions the map points of every dataset, in dataset order.
pub fn collect_points(datasets: &[Dataset]) -> Vec<MapPoint> {
    let mut all = Vec::new();

    for (i, dataset) in datasets.iter().enumerate() {
        match points_from_dataset(dataset) {
            Some(points) => {
                debug!(dataset = i, rows = dataset.len(), points = points.len(), "Collected points");
                all.extend(points);
            }
            None => warn!(dataset = i, "Missing coordinate or comfort index column"),
        }
    }

    info!(total = all.len(), "Total data points collected");
    all
}

/// Builds the map payload from every retained dataset.
pub fn summarize(datasets: &[Dataset]) -> MapSummary {
    let points = collect_points(datasets);
    let bands = BandCounts::from_values(points.iter().map(|p| p.rci));

    MapSummary {
        generated_at: Utc::now(),
        datasets: datasets.len(),
        point_count: points.len(),
        bands,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn dataset(rows: &[(Value, Value)]) -> Dataset {
        let mut ds = Dataset::new(vec![COORDINATE_COLUMN.into(), RCI_COLUMN.into()]);
        for (coord, rci) in rows {
            ds.push_row(vec![coord.clone(), rci.clone()]);
        }
        ds
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("35.68, 139.76"), Some((35.68, 139.76)));
        assert_eq!(parse_coordinate("35.68"), None);
        assert_eq!(parse_coordinate("a,b"), None);
        assert_eq!(parse_coordinate("1,2,3"), None);
        assert_eq!(parse_coordinate(""), None);
    }

    #[test]
    fn test_points_skip_bad_rows() {
        let ds = dataset(&[
            (json!("35.0,139.0"), json!("0.5")),
            (json!("nowhere"), json!("0.7")),
            (json!("35.1,139.1"), json!("n/a")),
            (Value::Null, json!(1.2)),
            (json!("35.2,139.2"), json!(2.5)),
        ]);

        let points = points_from_dataset(&ds).unwrap();
        assert_eq!(
            points,
            vec![
                MapPoint::new(0.5, 35.0, 139.0),
                MapPoint::new(2.5, 35.2, 139.2),
            ]
        );
    }

    #[test]
    fn test_collect_skips_dataset_without_columns() {
        let good = dataset(&[(json!("1,2"), json!(0.1))]);
        let bad = Dataset::new(vec!["X".into()]);

        let points = collect_points(&[good.clone(), bad, good]);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_summary_counts_bands() {
        let ds = dataset(&[(json!("1,2"), json!(0.1)), (json!("1,2"), json!(5.5))]);
        let summary = summarize(&[ds]);
        assert_eq!(summary.point_count, 2);
        assert_eq!(summary.bands.very_low, 1);
        assert_eq!(summary.bands.extreme, 1);

        let json = serde_json::to_value(&summary.points[0]).unwrap();
        assert_eq!(json["Ride_Comfort_Index"], json!(0.1));
        assert_eq!(json["colour"], json!("blue"));
        assert_eq!(summary.points[1].colour, "darkred");
    }
}
