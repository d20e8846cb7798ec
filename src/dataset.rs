//! Tabular dataset model and input decoding.
//!
//! A [`Dataset`] keeps the uploaded schema intact (named columns, original
//! row order) with every cell held as a [`serde_json::Value`]. The pipeline
//! resolves the columns it needs once into a [`Schema`] and turns each record
//! into a typed [`SampleRow`].

use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DatasetError, PipelineError};
use crate::parser::parse_array;

pub const X_COLUMN: &str = "X";
pub const Y_COLUMN: &str = "Y";
pub const Z_COLUMN: &str = "Z";
pub const SPEED_COLUMN: &str = "speed";
pub const PDOP_COLUMN: &str = "pdop";
pub const BATT_COLUMN: &str = "batt";
pub const VBATT_COLUMN: &str = "Vbatt";
pub const COORDINATE_COLUMN: &str = "coordinate";
pub const RCI_COLUMN: &str = "Ride_Comfort_Index";

/// Columns coerced to numbers before filtering. Unparsable values become null.
pub const NUMERIC_COLUMNS: [&str; 4] = [SPEED_COLUMN, PDOP_COLUMN, BATT_COLUMN, VBATT_COLUMN];

/// One row of the dataset. `index` is the row's position in the original input.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub index: usize,
    pub cells: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Supported input encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    /// A top-level array of objects, one per row.
    Json,
}

impl InputFormat {
    pub fn from_extension(ext: &str) -> Result<Self, DatasetError> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            other => Err(DatasetError::UnsupportedExtension(other.to_string())),
        }
    }
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating `cells` to the column count.
    pub fn push_row(&mut self, mut cells: Vec<Value>) {
        cells.resize(self.columns.len(), Value::Null);
        let index = self.records.len();
        self.records.push(Record { index, cells });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the index of `name`, appending an empty column if it is absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for record in &mut self.records {
            record.cells.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Values of one column in row order, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.records.iter().map(move |r| &r.cells[idx]))
    }

    /// Decodes CSV with a header row. Empty cells become null.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut dataset = Dataset::new(columns);

        for result in rdr.records() {
            let record = result?;
            let cells = record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Value::Null
                    } else {
                        Value::String(field.to_string())
                    }
                })
                .collect();
            dataset.push_row(cells);
        }

        debug!(
            columns = ?dataset.columns,
            rows = dataset.len(),
            "Decoded CSV dataset"
        );
        Ok(dataset)
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DatasetError> {
        Self::from_csv_reader(bytes)
    }

    /// Decodes a records-oriented JSON array:
    ///
    /// ```json
    /// [
    ///   { "X": [0.01, 0.02], "Y": "[0.0, 0.1]", "Z": 1.0, "pdop": 3.1 },
    ///   ...
    /// ]
    /// ```
    ///
    /// Columns appear in the order they are first seen.
    pub fn from_json_records(text: &str) -> Result<Self, DatasetError> {
        let root: Value = serde_json::from_str(text)?;
        let rows = root.as_array().ok_or(DatasetError::NotRecords)?;

        let objects: Vec<&Map<String, Value>> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| row.as_object().ok_or(DatasetError::NotAnObject(i)))
            .collect::<Result<_, _>>()?;

        let mut columns: Vec<String> = Vec::new();
        for obj in &objects {
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut dataset = Dataset::new(columns);
        for obj in objects {
            let cells = dataset
                .columns
                .iter()
                .map(|c| obj.get(c).cloned().unwrap_or(Value::Null))
                .collect();
            dataset.push_row(cells);
        }

        debug!(rows = dataset.len(), "Decoded JSON dataset");
        Ok(dataset)
    }

    pub fn from_bytes(bytes: &[u8], format: InputFormat) -> Result<Self, DatasetError> {
        match format {
            InputFormat::Csv => Self::from_csv_bytes(bytes),
            InputFormat::Json => Self::from_json_records(&String::from_utf8_lossy(bytes)),
        }
    }

    /// Loads a dataset from disk, choosing the decoder by file extension.
    pub fn load_path(path: &Path) -> Result<Self, DatasetError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = InputFormat::from_extension(ext)?;
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, format)
    }
}

/// Interprets a cell as a number, the way a lenient numeric cast would.
///
/// Numbers pass through, numeric text is parsed, everything else (including
/// NaN) is treated as missing.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| !v.is_nan())
}

/// A cell holding `value`, or null when it is missing or not representable.
pub fn number_cell(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Column positions the pipeline depends on, resolved once per dataset.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub speed: Option<usize>,
}

impl Schema {
    /// Fails with [`PipelineError::MissingColumn`] for the first absent axis.
    pub fn resolve(dataset: &Dataset) -> Result<Self, PipelineError> {
        let required = |name: &str| {
            dataset
                .column_index(name)
                .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
        };

        Ok(Schema {
            x: required(X_COLUMN)?,
            y: required(Y_COLUMN)?,
            z: required(Z_COLUMN)?,
            speed: dataset.column_index(SPEED_COLUMN),
        })
    }
}

/// A typed observation: parsed axes plus the speed written back on output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleRow {
    pub index: usize,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub speed: Option<f64>,
}

impl SampleRow {
    pub fn from_record(record: &Record, schema: &Schema) -> Self {
        SampleRow {
            index: record.index,
            x: parse_array(&record.cells[schema.x]),
            y: parse_array(&record.cells[schema.y]),
            z: parse_array(&record.cells[schema.z]),
            speed: schema.speed.and_then(|i| coerce_number(&record.cells[i])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &str = "X,Y,Z,speed,pdop,coordinate\n\
                       \"[0.1, 0.2]\",\"[0.3]\",0.5,12.5,3,\"35.1,139.2\"\n\
                       \n\
                       bad data,,1,fast,,\n";

    #[test]
    fn test_from_csv_skips_blank_lines_and_nulls_empty_cells() {
        let dataset = Dataset::from_csv_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.columns, vec!["X", "Y", "Z", "speed", "pdop", "coordinate"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[1].index, 1);
        assert_eq!(dataset.records[1].cells[1], Value::Null);
        assert_eq!(dataset.records[1].cells[0], json!("bad data"));
    }

    #[test]
    fn test_from_json_records_unions_columns() {
        let dataset = Dataset::from_json_records(
            r#"[{"X": [1, 2], "pdop": 4}, {"X": "[3]", "Y": [5]}]"#,
        )
        .unwrap();
        assert_eq!(dataset.columns, vec!["X", "pdop", "Y"]);
        assert_eq!(dataset.records[0].cells[2], Value::Null);
        assert_eq!(dataset.records[1].cells[2], json!([5]));
    }

    #[test]
    fn test_from_json_rejects_non_records() {
        assert!(matches!(
            Dataset::from_json_records("{}"),
            Err(DatasetError::NotRecords)
        ));
        assert!(matches!(
            Dataset::from_json_records("[1]"),
            Err(DatasetError::NotAnObject(0))
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            InputFormat::from_extension("xlsx"),
            Err(DatasetError::UnsupportedExtension(_))
        ));
        assert_eq!(InputFormat::from_extension("CSV").unwrap(), InputFormat::Csv);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(coerce_number(&json!(7)), Some(7.0));
        assert_eq!(coerce_number(&json!("fast")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&Value::Null), None);
    }

    #[test]
    fn test_schema_reports_first_missing_axis() {
        let dataset = Dataset::new(vec!["X".into(), "Z".into()]);
        assert_eq!(
            Schema::resolve(&dataset).unwrap_err(),
            PipelineError::MissingColumn("Y".into())
        );
    }

    #[test]
    fn test_sample_row_from_record() {
        let dataset = Dataset::from_csv_bytes(CSV.as_bytes()).unwrap();
        let schema = Schema::resolve(&dataset).unwrap();

        let row = SampleRow::from_record(&dataset.records[0], &schema);
        assert_eq!(row.x, vec![0.1, 0.2]);
        assert_eq!(row.z, vec![0.5]);
        assert_eq!(row.speed, Some(12.5));

        let row = SampleRow::from_record(&dataset.records[1], &schema);
        assert!(row.x.is_empty());
        assert_eq!(row.speed, None);
    }
}
