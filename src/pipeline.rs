//! End-to-end consolidation: load, join, dedup, label, persist.

use crate::config::{DataPaths, KEY_COLUMN, LIKED_COLUMN, SECONDARY_COLUMNS, STORE_DB, TABLE_NAME};
use crate::csv_source::read_table;
use crate::error::MissingInputError;
use crate::merge::{drop_duplicates, left_join, with_constant_column};
use crate::models::{ColumnType, Table, Value};
use crate::progress::{abandon_step, create_spinner, finish_step};
use crate::safety::validate_store_path;
use crate::store::{open_store, replace_table};
use anyhow::Result;
use std::path::Path;

/// Result of the in-memory part of the pipeline.
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub table: Table,
    /// Rows produced by the join, before dedup.
    pub joined_rows: usize,
    pub duplicates_removed: usize,
}

/// Join `primary` with `popularity`, keep the first row per key and add the
/// `liked` column.
pub fn consolidate(primary: &Table, popularity: &Table) -> Result<Consolidation> {
    let joined = left_join(primary, popularity, KEY_COLUMN)?;
    let joined_rows = joined.len();
    let deduped = drop_duplicates(joined, KEY_COLUMN)?;
    let duplicates_removed = joined_rows - deduped.len();
    let table = with_constant_column(deduped, LIKED_COLUMN, ColumnType::Integer, Value::Integer(0));
    Ok(Consolidation {
        table,
        joined_rows,
        duplicates_removed,
    })
}

fn load_step(path: &Path, columns: Option<&[&str]>) -> Result<Table> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let spinner = create_spinner(&format!("Loading {}", name));
    match read_table(path, columns) {
        Ok(table) => {
            finish_step(&spinner, format!("✅ Loaded: {}", name));
            Ok(table)
        }
        Err(err) => {
            abandon_step(&spinner);
            Err(err)
        }
    }
}

/// Run the whole pipeline against `paths`, replacing the `tracks` table.
///
/// Both inputs are loaded before the store is touched, so a missing input
/// leaves any existing store untouched.
pub fn run_consolidation(paths: &DataPaths) -> Result<Consolidation> {
    let primary = load_step(&paths.primary, None)?;
    let popularity = load_step(&paths.secondary, Some(&SECONDARY_COLUMNS[..]))?;

    let spinner = create_spinner("Merging");
    let result = consolidate(&primary, &popularity);
    let result = match result {
        Ok(r) => r,
        Err(err) => {
            abandon_step(&spinner);
            return Err(err);
        }
    };
    finish_step(&spinner, "✅ Merge complete");
    println!("✅ Duplicates removed. Rows: {}", result.table.len());

    validate_store_path(&paths.store, &[&paths.primary, &paths.secondary])?;
    let mut conn = open_store(&paths.store)?;
    replace_table(&mut conn, TABLE_NAME, &result.table)?;
    drop(conn);

    println!("🚀 {} created successfully", STORE_DB);
    Ok(result)
}

/// Curated operator message for a missing input.
pub fn missing_input_line(err: &MissingInputError) -> String {
    format!("❌ ERROR: {} not found.", err.file_name())
}
