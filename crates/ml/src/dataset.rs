// Path: crates/ml/src/dataset.rs

//! A small column-ordered table loaded from CSV.
//!
//! Each cell is typed independently on load: an integer if it parses as
//! `i64`, otherwise a float if it parses as `f64`, otherwise text.

use crate::{Matrix, MlError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            Cell::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            Cell::Float(f)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(_) => None,
        }
    }

    /// The cell rendered as a class label.
    pub fn label(&self) -> String {
        match self {
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Int(i) => Value::from(*i),
            // Non-finite floats have no JSON form.
            Cell::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, MlError> {
        if let Some((pos, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(MlError::InvalidInput(format!(
                "row {pos} has {} fields, expected {}",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Reads a CSV file with a header row. A missing file is reported as
    /// [`MlError::FileNotFound`] before any parsing starts.
    pub fn from_csv_path(path: &Path) -> Result<Self, MlError> {
        if !path.is_file() {
            return Err(MlError::FileNotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, MlError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::infer).collect());
        }
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize, MlError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| MlError::InvalidInput(format!("column not found: {name}")))
    }

    /// Returns every value of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<Cell>, MlError> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(idx).cloned())
            .collect())
    }

    /// Returns a copy without the named columns. Every name must exist.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table, MlError> {
        let mut dropped = Vec::with_capacity(names.len());
        for name in names {
            dropped.push(self.column_index(name)?);
        }
        let keep = |idx: &usize| !dropped.contains(idx);
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(i))
            .map(|(_, c)| c.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| keep(i))
                    .map(|(_, c)| c.clone())
                    .collect()
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Rows as JSON objects, keys in column order.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| (name.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Every cell as `f64`. Fails on the first text cell.
    pub fn to_feature_matrix(&self) -> Result<Matrix, MlError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, name)| {
                        cell.as_f64().ok_or_else(|| {
                            MlError::InvalidInput(format!(
                                "non-numeric value {:?} in column {name} at row {r}",
                                cell.label()
                            ))
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Id,SepalLengthCm,SepalWidthCm,PetalLengthCm,PetalWidthCm,Species
1,5.1,3.5,1.4,0.2,Iris-setosa
2,7.0,3.2,4.7,1.4,Iris-versicolor
";

    #[test]
    fn infers_cell_types() {
        assert_eq!(Cell::infer("3"), Cell::Int(3));
        assert_eq!(Cell::infer("5.1"), Cell::Float(5.1));
        assert_eq!(Cell::infer("Iris-setosa"), Cell::Text("Iris-setosa".into()));
    }

    #[test]
    fn records_keep_column_order() {
        let table = Table::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        let records = table.to_records();
        let keys: Vec<_> = records[0].keys().cloned().collect();
        assert_eq!(keys, table.columns().to_vec());
        assert_eq!(records[0]["Id"], serde_json::json!(1));
        assert_eq!(records[1]["Species"], serde_json::json!("Iris-versicolor"));
    }

    #[test]
    fn drop_columns_and_features() {
        let table = Table::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        let features = table.drop_columns(&["Id", "Species"]).unwrap();
        assert_eq!(
            features.columns(),
            &["SepalLengthCm", "SepalWidthCm", "PetalLengthCm", "PetalWidthCm"]
        );
        let x = features.to_feature_matrix().unwrap();
        assert_eq!(x[1], vec![7.0, 3.2, 4.7, 1.4]);

        assert!(table.drop_columns(&["Nope"]).is_err());
        assert!(table.to_feature_matrix().is_err());
    }

    #[test]
    fn missing_file_is_reported_before_parsing() {
        let err = Table::from_csv_path(Path::new("/no/such/Iris.csv")).unwrap_err();
        assert!(matches!(err, MlError::FileNotFound(_)));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"a,b\n1,2\n3\n").unwrap();
        assert!(Table::from_csv_path(f.path()).is_err());
    }
}
