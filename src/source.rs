//! Tabular sources: header-first CSV files read eagerly into rows

use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{VidgraphError, VidgraphResult};

/// One data row, addressed by column name
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based position among data rows (header excluded)
    pub number: usize,
    values: HashMap<String, String>,
}

impl Row {
    pub fn new(number: usize, values: HashMap<String, String>) -> Self {
        Self { number, values }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs(number: usize, pairs: &[(&str, &str)]) -> Self {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { number, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// A fully read source file
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Value of `column` in `row`; the column was checked when the table was read
    pub fn field<'r>(&self, row: &'r Row, column: &str) -> VidgraphResult<&'r str> {
        row.get(column).ok_or_else(|| {
            VidgraphError::source_error(
                &self.path,
                format!("row {} has no value for column '{}'", row.number, column),
            )
        })
    }
}

/// Read a whole CSV file, checking that `required` columns are in the header
pub fn read_table(path: impl AsRef<Path>, required: &[&str]) -> VidgraphResult<Table> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| VidgraphError::source_error(path, e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| VidgraphError::source_error(path, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == c))
        .collect();
    if !missing.is_empty() {
        return Err(VidgraphError::source_error(
            path,
            format!("missing required columns: {}", missing.join(", ")),
        ));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| VidgraphError::source_error(path, e.to_string()))?;
        let values = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(Row::new(idx + 1, values));
    }

    Ok(Table {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}
