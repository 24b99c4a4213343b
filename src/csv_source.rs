//! CSV loading.
//!
//! Reads a whole file into a `Table`, optionally keeping only some columns.
//! Cells are parsed after the full column is seen so every column gets one
//! storage class.

use crate::config::KEY_COLUMN;
use crate::error::MissingInputError;
use crate::models::{Column, ColumnType, Table, Value};
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

/// Field contents treated as missing values.
const NA_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "NULL", "null", "None", "<NA>"];

pub fn is_na(field: &str) -> bool {
    NA_MARKERS.contains(&field)
}

/// Load a CSV file with a header row.
///
/// `columns` restricts the result to the named columns (kept in file order);
/// naming a column the file lacks is an error. A file that does not exist
/// yields `MissingInputError`.
pub fn read_table(path: &Path, columns: Option<&[&str]>) -> Result<Table> {
    if !path.exists() {
        return Err(MissingInputError::new(path).into());
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = disambiguate_headers(
        rdr.headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect(),
    );

    let selected: Vec<usize> = match columns {
        Some(wanted) => {
            let missing: Vec<&str> = wanted
                .iter()
                .copied()
                .filter(|w| !headers.iter().any(|h| h == w))
                .collect();
            if !missing.is_empty() {
                bail!(
                    "{}: columns expected but not found: {:?}",
                    path.display(),
                    missing
                );
            }
            (0..headers.len())
                .filter(|&i| wanted.contains(&headers[i].as_str()))
                .collect()
        }
        None => (0..headers.len()).collect(),
    };

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); selected.len()];
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| {
            format!("Malformed record {} in {}", line + 1, path.display())
        })?;
        if record.len() > headers.len() {
            bail!(
                "Malformed record {} in {}: {} fields but the header has {}",
                line + 1,
                path.display(),
                record.len(),
                headers.len()
            );
        }
        // Short records are padded with missing values
        for (slot, &idx) in selected.iter().enumerate() {
            raw[slot].push(record.get(idx).unwrap_or("").to_string());
        }
    }

    let n_rows = raw.first().map_or(0, |c| c.len());
    let mut parsed_columns = Vec::with_capacity(selected.len());
    let mut cells: Vec<Vec<Value>> = Vec::with_capacity(selected.len());
    for (slot, &idx) in selected.iter().enumerate() {
        let name = &headers[idx];
        let kind = if name == KEY_COLUMN {
            ColumnType::Text
        } else {
            infer_type(&raw[slot])
        };
        cells.push(raw[slot].iter().map(|f| parse_field(f, kind)).collect());
        parsed_columns.push(Column::new(name.clone(), kind));
    }

    let mut table = Table::new(parsed_columns);
    table.rows.reserve(n_rows);
    for row in 0..n_rows {
        table
            .rows
            .push(cells.iter_mut().map(|c| std::mem::replace(&mut c[row], Value::Null)).collect());
    }
    Ok(table)
}

/// Repeated header names become `name`, `name.1`, `name.2`, ...
fn disambiguate_headers(headers: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(headers.len());
    for h in headers {
        if !out.contains(&h) {
            out.push(h);
            continue;
        }
        let mut n = 1;
        let mut candidate = format!("{}.{}", h, n);
        while out.contains(&candidate) || candidate == h {
            n += 1;
            candidate = format!("{}.{}", h, n);
        }
        out.push(candidate);
    }
    out
}

fn parse_bool(field: &str) -> Option<bool> {
    if field.eq_ignore_ascii_case("true") {
        Some(true)
    } else if field.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Narrowest storage class that fits every non-missing field.
pub fn infer_type(fields: &[String]) -> ColumnType {
    let mut present = fields.iter().map(|f| f.as_str()).filter(|f| !is_na(f)).peekable();
    if present.peek().is_none() {
        return ColumnType::Real;
    }
    let present: Vec<&str> = present.collect();
    if present.iter().all(|f| f.trim().parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.iter().all(|f| f.trim().parse::<f64>().is_ok()) {
        ColumnType::Real
    } else if present.iter().all(|f| parse_bool(f.trim()).is_some()) {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}

pub fn parse_field(field: &str, kind: ColumnType) -> Value {
    if is_na(field) {
        return Value::Null;
    }
    let trimmed = field.trim();
    match kind {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::Text(field.to_string())),
        ColumnType::Real => trimmed
            .parse::<f64>()
            .map(Value::Real)
            .unwrap_or_else(|_| Value::Text(field.to_string())),
        ColumnType::Boolean => match parse_bool(trimmed) {
            Some(b) => Value::Integer(b as i64),
            None => Value::Text(field.to_string()),
        },
        ColumnType::Text => Value::Text(field.to_string()),
    }
}
