//! SQLite persistence for consolidated tables.

use crate::models::{Column, ColumnType, Table, Value};
use crate::progress::{create_progress_bar, log_progress};
use anyhow::{Context, Result};
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

const WRITE_BATCH_SIZE: usize = 10_000;

/// Quote an identifier for use in SQL text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn open_store(path: &Path) -> Result<Connection> {
    Connection::open(path).with_context(|| format!("Failed to open store {}", path.display()))
}

/// Open an existing store without write access. Returns `None` when the file
/// does not exist, so callers never create it by accident.
pub fn open_store_read_only(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open store {} read-only", path.display()))?;
    Ok(Some(conn))
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Drop `name` if present, recreate it from `table`'s columns and insert every
/// row. Row positions are not stored.
pub fn replace_table(conn: &mut Connection, name: &str, table: &Table) -> Result<()> {
    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
        .collect();

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} ({defs});",
        table = quote_ident(name),
        defs = column_defs.join(", "),
    ))
    .with_context(|| format!("Failed to recreate table {}", name))?;

    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(name),
        table
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", "),
        (1..=table.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", "),
    );

    let total = table.len() as u64;
    let pb = create_progress_bar(total, "Writing rows");
    let mut written = 0u64;

    for chunk in table.rows.chunks(WRITE_BATCH_SIZE) {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&insert_sql)?;
            for row in chunk {
                stmt.execute(params_from_iter(row.iter()))?;
                written += 1;
                pb.inc(1);
                log_progress("write", written, total, WRITE_BATCH_SIZE as u64);
            }
        }
        tx.commit()?;
    }

    pb.finish_and_clear();
    Ok(())
}

/// Read a whole table back, columns in declaration order.
pub fn load_table(conn: &Connection, name: &str) -> Result<Table> {
    let columns: Vec<Column> = {
        let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let rows = stmt.query_map([name], |row| {
            let col: String = row.get(0)?;
            let decl: String = row.get(1)?;
            Ok(Column::new(col, ColumnType::from_sql_type(&decl)))
        })?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {}", quote_ident(name)))
        .with_context(|| format!("Failed to read table {}", name))?;
    let width = stmt.column_count();

    let mut table = Table::new(columns);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        table.push_row(values)?;
    }
    Ok(table)
}
