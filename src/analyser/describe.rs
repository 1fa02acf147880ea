//! Descriptive statistics split by column kind.
//!
//! Numeric columns get count, mean, sample standard deviation, min,
//! quartiles (linear interpolation) and max. Text, boolean, temporal and
//! mixed columns get count, distinct values, the most frequent value and
//! its frequency. Columns holding nothing but nulls are reported as
//! excluded and appear in neither half.

use super::table::{ColumnKind, Table};
use super::types::{CategoricalSummary, NumericSummary, StatisticsReport, SubReport};
use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use std::collections::HashMap;

/// Summarises every column of `table`.
///
/// An empty table yields [`StatisticsReport::empty`].
///
/// # Errors
///
/// Returns an error only if Polars fails on a column it produced itself.
pub fn describe(table: &Table) -> Result<StatisticsReport> {
    if table.is_empty() {
        return Ok(StatisticsReport::empty());
    }

    let mut numeric = Vec::new();
    let mut non_numeric = Vec::new();
    let mut excluded = Vec::new();

    for (name, kind) in table.schema() {
        match kind {
            ColumnKind::Null => excluded.push(name),
            ColumnKind::Numeric => numeric.push(
                summarise_numeric(table, &name)
                    .with_context(|| format!("Statistics failed for numeric column '{name}'"))?,
            ),
            ColumnKind::Text | ColumnKind::Boolean | ColumnKind::Temporal | ColumnKind::Mixed => {
                non_numeric.push(summarise_categorical(table, &name).with_context(|| {
                    format!("Statistics failed for column '{name}'")
                })?);
            }
        }
    }

    tracing::debug!(
        numeric = numeric.len(),
        non_numeric = non_numeric.len(),
        excluded = excluded.len(),
        "Described table"
    );

    Ok(StatisticsReport {
        numeric: SubReport::from_columns(numeric),
        non_numeric: SubReport::from_columns(non_numeric),
        excluded,
    })
}

fn summarise_numeric(table: &Table, name: &str) -> Result<NumericSummary> {
    let series = table
        .frame()
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;

    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

    Ok(NumericSummary {
        column: name.to_owned(),
        count: ca.len() - ca.null_count(),
        mean: finite(ca.mean()),
        std: finite(ca.std(1)),
        min: ca.min(),
        q25: ca.quantile(0.25, QuantileMethod::Linear)?,
        median: ca.quantile(0.5, QuantileMethod::Linear)?,
        q75: ca.quantile(0.75, QuantileMethod::Linear)?,
        max: ca.max(),
    })
}

fn summarise_categorical(table: &Table, name: &str) -> Result<CategoricalSummary> {
    let keys = table.cell_keys(name)?;

    // key -> (occurrences, first row it appeared in)
    let mut frequencies: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut count = 0;
    for (row, key) in keys.iter().enumerate() {
        if let Some(key) = key.as_deref() {
            count += 1;
            frequencies
                .entry(key)
                .and_modify(|(n, _)| *n += 1)
                .or_insert((1, row));
        }
    }

    // Ties go to the value seen first.
    let top = frequencies
        .values()
        .max_by(|(n_a, first_a), (n_b, first_b)| n_a.cmp(n_b).then(first_b.cmp(first_a)))
        .copied();
    let top_text = match top {
        Some((_, row)) => table.cell_strings(name)?.into_iter().nth(row).flatten(),
        None => None,
    };

    Ok(CategoricalSummary {
        column: name.to_owned(),
        count,
        unique: frequencies.len(),
        top: top_text,
        freq: top.map_or(0, |(n, _)| n),
    })
}
