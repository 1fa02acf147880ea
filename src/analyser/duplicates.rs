use super::table::Table;
use super::types::DuplicateReport;
use crate::error::{LensError, Result};
use std::collections::HashMap;

/// Rows that have at least one exact twin elsewhere in `table`, compared on
/// every column and sorted by all columns left to right.
///
/// Cells match when their source values are equal (see [`Table::cell_keys`]),
/// and the report holds the matching rows exactly as they arrived.
///
/// # Errors
///
/// Returns an error only if Polars fails to filter or sort the table.
pub fn find_duplicates(table: &Table) -> Result<DuplicateReport> {
    duplicates_over(table, table.column_names())
}

/// Like [`find_duplicates`], but rows only need to agree on `columns`.
///
/// The whole row is still returned for every match, sorted by `columns` in
/// the order given. A name listed twice counts once. On an empty table the
/// report is empty whatever the selection.
///
/// # Errors
///
/// Returns [`LensError::InvalidArgument`] when `columns` is empty or names
/// a column the table does not have.
pub fn find_duplicates_by_subset(table: &Table, columns: &[String]) -> Result<DuplicateReport> {
    if columns.is_empty() {
        return Err(LensError::InvalidArgument(
            "select at least one column to compare".to_owned(),
        ));
    }

    let mut selected: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        if !selected.contains(column) {
            selected.push(column.clone());
        }
    }

    if table.is_empty() {
        return Ok(DuplicateReport::empty(table, selected));
    }

    let unknown: Vec<&str> = selected
        .iter()
        .filter(|c| table.kind_of(c).is_none())
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(LensError::InvalidArgument(format!(
            "column(s) not found in table: {}",
            unknown.join(", ")
        )));
    }

    duplicates_over(table, selected)
}

fn duplicates_over(table: &Table, columns: Vec<String>) -> Result<DuplicateReport> {
    if table.is_empty() {
        return Ok(DuplicateReport::empty(table, columns));
    }

    let cells = columns
        .iter()
        .map(|c| table.cell_keys(c))
        .collect::<Result<Vec<_>>>()?;
    let keys: Vec<Vec<Option<&str>>> = (0..table.height())
        .map(|row| {
            cells
                .iter()
                .map(|column| column.get(row).and_then(Option::as_deref))
                .collect()
        })
        .collect();

    let mut group_sizes: HashMap<&[Option<&str>], usize> = HashMap::with_capacity(keys.len());
    for key in &keys {
        *group_sizes.entry(key.as_slice()).or_insert(0) += 1;
    }

    let mask: Vec<bool> = keys
        .iter()
        .map(|key| group_sizes.get(key.as_slice()).is_some_and(|&n| n > 1))
        .collect();
    let redundant_count = table.height() - group_sizes.len();

    let rows = table.filter_rows(&mask)?.sorted_by(&columns)?;

    tracing::debug!(
        compared = columns.len(),
        matching = rows.height(),
        redundant_count,
        "Duplicate scan finished"
    );

    Ok(DuplicateReport {
        columns,
        rows,
        redundant_count,
    })
}
