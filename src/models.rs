//! Core data models for the consolidation pipeline.
//!
//! A `Table` is an ordered sequence of rows addressed by column name. Cells
//! are SQLite values so rows can be bound straight into insert statements.

use anyhow::{bail, Result};
pub use rusqlite::types::Value;

// ============================================================================
// Columns
// ============================================================================

/// Storage class of a column, decided once per column when a table is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Boolean,
    Text,
}

impl ColumnType {
    /// Declared type used when the column is created in SQLite.
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    pub fn from_sql_type(decl: &str) -> Self {
        let upper = decl.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ============================================================================
// Table
// ============================================================================

/// In-memory table. Every row has exactly `columns.len()` cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Like `column_index`, but a missing column is an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        match self.column_index(name) {
            Some(idx) => Ok(idx),
            None => bail!(
                "Column '{}' not found (available: {})",
                name,
                self.column_names().join(", ")
            ),
        }
    }

    /// Cell at `row` for the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            bail!(
                "Row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Join/dedup key of a cell. Null cells yield `None`, which compares equal to
/// other null keys.
pub fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

/// Borrowing variant of `key_of` for text keys, the common case.
pub fn key_ref(value: &Value) -> Option<std::borrow::Cow<'_, str>> {
    match value {
        Value::Text(s) => Some(std::borrow::Cow::Borrowed(s.as_str())),
        other => key_of(other).map(std::borrow::Cow::Owned),
    }
}
