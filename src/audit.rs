//! Key uniqueness statistics for the Duplicate Auditor.
//!
//! Nothing here writes: inputs are read from CSV and the consolidated table
//! is read from a store opened read-only.

use crate::config::{DataPaths, KEY_COLUMN, POPULARITY_COLUMN, TABLE_NAME};
use crate::csv_source::read_table;
use crate::merge::left_join;
use crate::models::{key_ref, Table};
use crate::store::{load_table, open_store_read_only, table_exists};
use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStats {
    pub rows: usize,
    /// Distinct non-null keys.
    pub unique: usize,
    /// Rows whose key (null included) already appeared earlier.
    pub duplicates: usize,
}

impl KeyStats {
    /// No key repeats. A single null key is allowed even though it is not
    /// part of `unique`.
    pub fn is_consistent(&self) -> bool {
        self.duplicates == 0
    }
}

pub fn key_stats(table: &Table, key: &str) -> Result<KeyStats> {
    let idx = table.require_column(key)?;
    let mut seen: FxHashSet<Option<Cow<'_, str>>> = FxHashSet::default();
    let mut duplicates = 0;
    for row in &table.rows {
        if !seen.insert(key_ref(&row[idx])) {
            duplicates += 1;
        }
    }
    let unique = seen.iter().filter(|k| k.is_some()).count();
    Ok(KeyStats {
        rows: table.len(),
        unique,
        duplicates,
    })
}

/// One titled section of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSection {
    pub label: String,
    pub stats: KeyStats,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuditReport {
    pub sections: Vec<AuditSection>,
    /// Set when the store or its table was not there to inspect.
    pub store_note: Option<String>,
}

impl AuditReport {
    pub fn section(&self, label: &str) -> Option<&KeyStats> {
        self.sections.iter().find(|s| s.label == label).map(|s| &s.stats)
    }

    /// Lines as printed by `check-duplicates`.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for s in &self.sections {
            out.push(format!("Total rows in {}: {}", s.label, s.stats.rows));
            out.push(format!("Unique track_ids in {}: {}", s.label, s.stats.unique));
            out.push(format!("Duplicates in {}: {}", s.label, s.stats.duplicates));
            if !s.stats.is_consistent() {
                out.push(format!(
                    "⚠️  {}: {} rows but {} unique track_ids",
                    s.label, s.stats.rows, s.stats.unique
                ));
            }
        }
        if let Some(note) = &self.store_note {
            out.push(note.clone());
        }
        out
    }
}

pub const PRIMARY_LABEL: &str = "final CSV";
pub const SECONDARY_LABEL: &str = "songs CSV";
pub const MERGED_LABEL: &str = "merge";
pub const STORE_LABEL: &str = "tracks table";

/// Inspect both inputs, their rejoin and the persisted table.
pub fn run_audit(paths: &DataPaths) -> Result<AuditReport> {
    let mut report = AuditReport::default();

    let primary = read_table(&paths.primary, None)?;
    report.sections.push(AuditSection {
        label: PRIMARY_LABEL.to_string(),
        stats: key_stats(&primary, KEY_COLUMN)?,
    });

    let songs = read_table(&paths.secondary, None)?;
    report.sections.push(AuditSection {
        label: SECONDARY_LABEL.to_string(),
        stats: key_stats(&songs, KEY_COLUMN)?,
    });

    let popularity = project(&songs, &[KEY_COLUMN, POPULARITY_COLUMN])?;
    let merged = left_join(&primary, &popularity, KEY_COLUMN)?;
    report.sections.push(AuditSection {
        label: MERGED_LABEL.to_string(),
        stats: key_stats(&merged, KEY_COLUMN)?,
    });

    match open_store_read_only(&paths.store)? {
        Some(conn) if table_exists(&conn, TABLE_NAME)? => {
            let tracks = load_table(&conn, TABLE_NAME)
                .with_context(|| format!("Failed to read {} from {}", TABLE_NAME, paths.store.display()))?;
            report.sections.push(AuditSection {
                label: STORE_LABEL.to_string(),
                stats: key_stats(&tracks, KEY_COLUMN)?,
            });
        }
        Some(_) => {
            report.store_note = Some(format!(
                "No {} table in {}; skipped",
                TABLE_NAME,
                paths.store.display()
            ));
        }
        None => {
            report.store_note = Some(format!("{} not found; skipped", paths.store.display()));
        }
    }

    Ok(report)
}

/// Keep only the named columns, in the order given.
fn project(table: &Table, columns: &[&str]) -> Result<Table> {
    let idx = columns
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>>>()?;
    Ok(Table {
        columns: idx.iter().map(|&i| table.columns[i].clone()).collect(),
        rows: table
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i].clone()).collect())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType, Value};
    use std::fs;
    use tempfile::tempdir;

    fn ids(keys: &[Option<&str>]) -> Table {
        let mut t = Table::new(vec![Column::new("track_id", ColumnType::Text)]);
        for k in keys {
            t.push_row(vec![k.map_or(Value::Null, |s| Value::Text(s.into()))]).unwrap();
        }
        t
    }

    #[test]
    fn test_key_stats_counts() {
        let stats = key_stats(&ids(&[Some("a"), Some("b"), Some("a"), Some("c"), Some("a")]), "track_id").unwrap();
        assert_eq!(stats, KeyStats { rows: 5, unique: 3, duplicates: 2 });
        assert!(!stats.is_consistent());
    }

    #[test]
    fn test_key_stats_null_keys() {
        let stats = key_stats(&ids(&[Some("a"), None, None]), "track_id").unwrap();
        assert_eq!(stats, KeyStats { rows: 3, unique: 1, duplicates: 1 });
        assert!(!stats.is_consistent());
    }

    #[test]
    fn test_single_null_key_is_consistent() {
        let stats = key_stats(&ids(&[Some("a"), None, Some("b")]), "track_id").unwrap();
        assert_eq!(stats, KeyStats { rows: 3, unique: 2, duplicates: 0 });
        assert!(stats.is_consistent());

        let report = AuditReport {
            sections: vec![AuditSection { label: "final CSV".into(), stats }],
            store_note: None,
        };
        assert_eq!(report.lines().len(), 3);
    }

    #[test]
    fn test_key_stats_empty() {
        let stats = key_stats(&ids(&[]), "track_id").unwrap();
        assert_eq!(stats, KeyStats { rows: 0, unique: 0, duplicates: 0 });
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_report_lines_flag_discrepancy() {
        let report = AuditReport {
            sections: vec![AuditSection {
                label: "merge".into(),
                stats: KeyStats { rows: 4, unique: 3, duplicates: 1 },
            }],
            store_note: None,
        };
        let lines = report.lines();
        assert_eq!(lines[0], "Total rows in merge: 4");
        assert_eq!(lines[1], "Unique track_ids in merge: 3");
        assert_eq!(lines[2], "Duplicates in merge: 1");
        assert!(lines[3].contains("4 rows but 3 unique"));
    }

    #[test]
    fn test_run_audit_without_store() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("spotify_data_preprocessed_final.csv"), "track_id,energy\na,0.1\nb,0.2\n").unwrap();
        fs::write(
            dir.path().join("spotify_songs.csv"),
            "track_id,track_name,track_popularity\na,x,1\na,x2,2\nb,y,3\n",
        )
        .unwrap();
        let paths = DataPaths::in_dir(dir.path());

        let report = run_audit(&paths).unwrap();
        assert_eq!(report.section(PRIMARY_LABEL), Some(&KeyStats { rows: 2, unique: 2, duplicates: 0 }));
        assert_eq!(report.section(SECONDARY_LABEL), Some(&KeyStats { rows: 3, unique: 2, duplicates: 1 }));
        assert_eq!(report.section(MERGED_LABEL), Some(&KeyStats { rows: 3, unique: 2, duplicates: 1 }));
        assert!(report.section(STORE_LABEL).is_none());
        assert!(report.store_note.as_deref().unwrap().contains("not found"));
        assert!(!paths.store.exists());
    }

    fn write_inputs(dir: &std::path::Path, primary: &str, songs: &str) -> DataPaths {
        let paths = DataPaths::in_dir(dir);
        fs::write(&paths.primary, primary).unwrap();
        fs::write(&paths.secondary, songs).unwrap();
        paths
    }

    #[test]
    fn test_run_audit_reads_consolidated_table() {
        let dir = tempdir().unwrap();
        let paths = write_inputs(
            dir.path(),
            "track_id,energy\na,0.1\nb,0.2\na,0.3\n",
            "track_id,track_popularity\na,5\nb,6\n",
        );
        crate::pipeline::run_consolidation(&paths).unwrap();
        let before = fs::read(&paths.store).unwrap();

        let report = run_audit(&paths).unwrap();
        assert_eq!(report.section(PRIMARY_LABEL), Some(&KeyStats { rows: 3, unique: 2, duplicates: 1 }));
        assert_eq!(report.section(MERGED_LABEL), Some(&KeyStats { rows: 3, unique: 2, duplicates: 1 }));
        assert_eq!(report.section(STORE_LABEL), Some(&KeyStats { rows: 2, unique: 2, duplicates: 0 }));
        assert!(report.store_note.is_none());
        assert_eq!(fs::read(&paths.store).unwrap(), before);
    }

    #[test]
    fn test_run_audit_store_without_tracks_table() {
        let dir = tempdir().unwrap();
        let paths = write_inputs(dir.path(), "track_id\na\n", "track_id,track_popularity\na,1\n");
        {
            let conn = rusqlite::Connection::open(&paths.store).unwrap();
            conn.execute_batch("CREATE TABLE other (x INTEGER);").unwrap();
        }
        let before = fs::read(&paths.store).unwrap();

        let report = run_audit(&paths).unwrap();
        assert!(report.section(STORE_LABEL).is_none());
        assert!(report.store_note.as_deref().unwrap().starts_with("No tracks table"));
        assert!(report.lines().last().unwrap().starts_with("No tracks table"));
        assert_eq!(fs::read(&paths.store).unwrap(), before);
    }

    #[test]
    fn test_project_orders_columns() {
        let mut t = Table::new(vec![
            Column::new("a", ColumnType::Text),
            Column::new("b", ColumnType::Integer),
        ]);
        t.push_row(vec![Value::Text("x".into()), Value::Integer(1)]).unwrap();
        let p = project(&t, &["b", "a"]).unwrap();
        assert_eq!(p.column_names(), vec!["b", "a"]);
        assert_eq!(p.rows[0], vec![Value::Integer(1), Value::Text("x".into())]);
        assert!(project(&t, &["c"]).is_err());
    }
}
