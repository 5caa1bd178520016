//! Delimited and spreadsheet extraction.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Map, Value};
use tracing::debug;

use super::ExtractError;

/// Header used for columns whose header cell is blank.
const BLANK_HEADER: &str = "__EMPTY";

/// Parse CSV text keyed by its header row, one JSON object per record.
///
/// Blank lines are skipped. Field values are kept as strings.
pub fn extract_delimited(raw: &str) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(raw.as_bytes());
    let headers = reader.headers()?.clone();

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record?;
        let object: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        lines.push(Value::Object(object).to_string());
    }

    debug!(records = lines.len(), "Parsed delimited records");
    Ok(lines.join("\n"))
}

/// Read the first worksheet of a workbook, one JSON object per row.
///
/// The first row supplies the column names. Empty cells become `""` so that
/// every line carries every column.
pub fn extract_spreadsheet(path: &Path) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ExtractError::NoWorksheet)?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row),
        None => return Ok(String::new()),
    };

    let lines: Vec<String> = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| row_to_line(&headers, row))
        .collect();

    debug!(sheet = %sheet, rows = lines.len(), "Parsed worksheet rows");
    Ok(lines.join("\n"))
}

/// Column names from the header row. Blank headers become `__EMPTY` and
/// repeated names get a `_N` suffix so no column is lost.
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    row.iter()
        .map(|cell| {
            let base = match cell {
                Data::Empty => BLANK_HEADER.to_string(),
                Data::String(s) if s.trim().is_empty() => BLANK_HEADER.to_string(),
                other => other.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}_{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn row_to_line(headers: &[String], row: &[Data]) -> String {
    let object: Map<String, Value> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let value = row.get(i).map(cell_value).unwrap_or_else(empty_value);
            (name.clone(), value)
        })
        .collect();
    Value::Object(object).to_string()
}

fn empty_value() -> Value {
    Value::String(String::new())
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => empty_value(),
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Bool(b) => Value::Bool(*b),
        // Whole-number floats are written as integers, the way spreadsheet
        // applications display them.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            Value::from(*f as i64)
        }
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        other => Value::String(other.to_string()),
    }
}
