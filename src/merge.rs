//! Table transforms: left join, first-occurrence dedup and constant columns.

use crate::models::{key_ref, Column, ColumnType, Table, Value};
use anyhow::Result;
use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;

/// Left outer join of `left` with `right` on the column `on`.
///
/// Output columns are all of `left`'s, followed by `right`'s minus the key.
/// A non-key name present on both sides is suffixed `_x` (left) and `_y`
/// (right). Each left row is emitted once per matching right row, in right
/// order, or once with nulls when nothing matches. Left order is preserved.
pub fn left_join(left: &Table, right: &Table, on: &str) -> Result<Table> {
    let left_key = left.require_column(on)?;
    let right_key = right.require_column(on)?;

    let right_cols: Vec<usize> = (0..right.columns.len()).filter(|&i| i != right_key).collect();

    let clashes = |name: &str| {
        name != on
            && left.columns.iter().any(|c| c.name == name)
            && right_cols.iter().any(|&i| right.columns[i].name == name)
    };

    let mut columns: Vec<Column> = left
        .columns
        .iter()
        .map(|c| {
            if clashes(&c.name) {
                Column::new(format!("{}_x", c.name), c.kind)
            } else {
                c.clone()
            }
        })
        .collect();
    columns.extend(right_cols.iter().map(|&i| {
        let c = &right.columns[i];
        if clashes(&c.name) {
            Column::new(format!("{}_y", c.name), c.kind)
        } else {
            c.clone()
        }
    }));

    let mut index: FxHashMap<Option<Cow<'_, str>>, Vec<usize>> = FxHashMap::default();
    for (i, row) in right.rows.iter().enumerate() {
        index.entry(key_ref(&row[right_key])).or_default().push(i);
    }

    let mut joined = Table::new(columns);
    joined.rows.reserve(left.len());
    for row in &left.rows {
        match index.get(&key_ref(&row[left_key])) {
            Some(matches) => {
                for &m in matches {
                    let mut out = row.clone();
                    out.extend(right_cols.iter().map(|&i| right.rows[m][i].clone()));
                    joined.rows.push(out);
                }
            }
            None => {
                let mut out = row.clone();
                out.extend(std::iter::repeat(Value::Null).take(right_cols.len()));
                joined.rows.push(out);
            }
        }
    }

    Ok(joined)
}

/// Keep only the first row seen for each value of `on`, preserving order.
/// Null keys count as one value.
pub fn drop_duplicates(table: Table, on: &str) -> Result<Table> {
    let key = table.require_column(on)?;
    let Table { columns, rows } = table;

    let mut seen: FxHashSet<Option<String>> = FxHashSet::default();
    let rows = rows
        .into_iter()
        .filter(|row| seen.insert(key_ref(&row[key]).map(Cow::into_owned)))
        .collect();

    Ok(Table { columns, rows })
}

/// Set column `name` to `value` on every row, appending the column if the
/// table does not have it yet.
pub fn with_constant_column(mut table: Table, name: &str, kind: ColumnType, value: Value) -> Table {
    match table.column_index(name) {
        Some(idx) => {
            table.columns[idx].kind = kind;
            for row in &mut table.rows {
                row[idx] = value.clone();
            }
        }
        None => {
            table.columns.push(Column::new(name, kind));
            for row in &mut table.rows {
                row.push(value.clone());
            }
        }
    }
    table
}
