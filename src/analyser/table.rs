//! Strongly-typed tables built from untyped remote records.
//!
//! The remote source hands back rows as flat JSON objects. [`Table::from_records`]
//! infers one [`ColumnKind`] per column at ingestion and materialises a typed
//! Polars column for it, so reports never have to re-inspect raw values.
//!
//! | JSON values in column            | Kind       | Polars dtype            |
//! |----------------------------------|------------|-------------------------|
//! | numbers (all integral)           | `Numeric`  | `Int64`                 |
//! | numbers (any fractional)         | `Numeric`  | `Float64`               |
//! | booleans                         | `Boolean`  | `Boolean`               |
//! | ISO-8601 dates/timestamps        | `Temporal` | `Datetime(ms)`          |
//! | other strings                    | `Text`     | `String`                |
//! | a mix of the above, or nested    | `Mixed`    | `String` (display text) |
//! | only nulls                       | `Null`     | `Null`                  |
//!
//! The typed frame drives sorting, statistics and display. The records
//! themselves are kept alongside it: cell equality ([`Table::cell_keys`]) and
//! everything handed back to callers ([`Table::records`]) use the values as
//! they arrived, so a timestamp keeps its offset, `1` never equals `"1"` and
//! integers beyond `f64` precision stay exact.

use crate::error::{LensError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A flat record as returned by the remote source.
pub type Record = serde_json::Map<String, Value>;

static MISSING: Value = Value::Null;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ColumnKind {
    Numeric,
    Text,
    Boolean,
    Temporal,
    Mixed,
    Null,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Boolean => "Boolean",
            Self::Temporal => "Temporal",
            Self::Mixed => "Mixed",
            Self::Null => "Null",
        }
    }

    fn infer(values: &[&Value]) -> Self {
        let mut non_null = values.iter().filter(|v| !v.is_null()).peekable();
        if non_null.peek().is_none() {
            return Self::Null;
        }
        let non_null: Vec<&Value> = non_null.copied().collect();

        if non_null.iter().all(|v| v.is_number()) {
            Self::Numeric
        } else if non_null.iter().all(|v| v.is_boolean()) {
            Self::Boolean
        } else if non_null.iter().all(|v| v.is_string()) {
            let all_temporal = non_null
                .iter()
                .all(|v| v.as_str().and_then(parse_timestamp_millis).is_some());
            if all_temporal {
                Self::Temporal
            } else {
                Self::Text
            }
        } else {
            Self::Mixed
        }
    }
}

/// An immutable, ordered, column-typed table.
#[derive(Clone, Debug, Default)]
pub struct Table {
    frame: DataFrame,
    kinds: Vec<ColumnKind>,
    /// Source records, one per frame row, every column present in order.
    rows: Vec<Record>,
}

impl Table {
    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from records, preserving row order.
    ///
    /// Columns appear in order of first appearance across the records; a
    /// key missing from a record is a null in that row.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::DataProcessing`] if Polars rejects a column.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let mut names: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !names.contains(&key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }
        if names.is_empty() {
            return Ok(Self::empty());
        }

        let mut columns = Vec::with_capacity(names.len());
        let mut kinds = Vec::with_capacity(names.len());
        for name in &names {
            let values: Vec<&Value> = records
                .iter()
                .map(|r| r.get(*name).unwrap_or(&MISSING))
                .collect();
            let kind = ColumnKind::infer(&values);
            columns.push(Column::from(build_series(name, kind, &values)?));
            kinds.push(kind);
        }

        let rows = records
            .iter()
            .map(|record| {
                names
                    .iter()
                    .map(|name| {
                        let value = record.get(*name).cloned().unwrap_or(Value::Null);
                        ((*name).to_owned(), value)
                    })
                    .collect()
            })
            .collect();

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, kinds, rows })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    /// Column names paired with their inferred kinds, in table order.
    pub fn schema(&self) -> Vec<(String, ColumnKind)> {
        self.column_names()
            .into_iter()
            .zip(self.kinds.iter().copied())
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.frame
            .get_column_names()
            .iter()
            .position(|n| n.as_str() == name)
            .and_then(|idx| self.kinds.get(idx).copied())
    }

    /// The rows as they arrived, one record per row with every column in
    /// table order.
    pub fn records(&self) -> &[Record] {
        &self.rows
    }

    /// First `n` rows, same schema.
    pub fn head(&self, n: usize) -> Self {
        Self {
            frame: self.frame.head(Some(n)),
            kinds: self.kinds.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Rows whose flag is set, in original order.
    ///
    /// # Errors
    ///
    /// Returns an error if `mask` does not have one flag per row.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.height() {
            return Err(LensError::DataProcessing(format!(
                "row mask has {} entries for {} rows",
                mask.len(),
                self.height()
            )));
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(row, &keep)| keep.then_some(row))
            .collect();
        self.take_rows(&indices)
    }

    /// Stable ascending sort by `columns`, in the order given, nulls last.
    ///
    /// Ordering follows the typed columns: numbers numerically, timestamps
    /// by instant, text lexically. Columns of kind [`ColumnKind::Null`] hold
    /// a single value and are skipped as sort keys.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or Polars fails to sort.
    pub fn sorted_by(&self, columns: &[String]) -> Result<Self> {
        let keys: Vec<Expr> = columns
            .iter()
            .filter(|c| self.kind_of(c) != Some(ColumnKind::Null))
            .map(|c| col(c.as_str()))
            .collect();
        if keys.is_empty() || self.height() < 2 {
            return Ok(self.clone());
        }

        let mut position = String::from("__row");
        while self.kind_of(&position).is_some() {
            position.push('_');
        }
        let sorted = self
            .frame
            .clone()
            .with_row_index(position.as_str().into(), None)?
            .lazy()
            .sort_by_exprs(
                keys,
                SortMultipleOptions::default()
                    .with_maintain_order(true)
                    .with_nulls_last(true),
            )
            .select([col(position.as_str())])
            .collect()?;
        let order: Vec<usize> = sorted
            .column(&position)?
            .as_materialized_series()
            .idx()?
            .into_no_null_iter()
            .map(|row| row as usize)
            .collect();
        self.take_rows(&order)
    }

    /// Equality keys for one column, `None` for nulls.
    ///
    /// Two cells share a key exactly when their source values are equal:
    /// keys are tagged with the JSON type, strings compare verbatim and
    /// numbers compare by exact value, so `1` and `1.0` match while
    /// `2^53` and `2^53 + 1` do not.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::InvalidArgument`] for an unknown column.
    pub fn cell_keys(&self, name: &str) -> Result<Vec<Option<String>>> {
        Ok(self.cells(name)?.into_iter().map(cell_key).collect())
    }

    /// Values of one column as display text, `None` for nulls.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::InvalidArgument`] for an unknown column.
    pub fn cell_strings(&self, name: &str) -> Result<Vec<Option<String>>> {
        Ok(self.cells(name)?.into_iter().map(display_text).collect())
    }

    fn cells(&self, name: &str) -> Result<Vec<&Value>> {
        if self.kind_of(name).is_none() {
            return Err(LensError::InvalidArgument(format!(
                "column '{name}' not found"
            )));
        }
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&MISSING))
            .collect())
    }

    fn take_rows(&self, indices: &[usize]) -> Result<Self> {
        if self.width() == 0 {
            return Ok(self.clone());
        }
        let idx: Vec<IdxSize> = indices.iter().map(|&row| row as IdxSize).collect();
        let frame = self.frame.take(&IdxCa::from_vec("idx".into(), idx))?;
        let rows = indices
            .iter()
            .filter_map(|&row| self.rows.get(row).cloned())
            .collect();
        Ok(Self {
            frame,
            kinds: self.kinds.clone(),
            rows,
        })
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.kinds == other.kinds
            && self.column_names() == other.column_names()
            && self.rows == other.rows
    }
}

impl Serialize for Table {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.rows.serialize(serializer)
    }
}

fn build_series(name: &str, kind: ColumnKind, values: &[&Value]) -> Result<Series> {
    let series = match kind {
        ColumnKind::Null => Series::new_null(name.into(), values.len()),
        ColumnKind::Numeric => {
            if values.iter().all(|v| v.is_null() || v.as_i64().is_some()) {
                let ints: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
                Series::new(name.into(), ints)
            } else {
                let floats: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
                Series::new(name.into(), floats)
            }
        }
        ColumnKind::Boolean => {
            let bools: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
            Series::new(name.into(), bools)
        }
        ColumnKind::Temporal => {
            let millis: Vec<Option<i64>> = values
                .iter()
                .map(|v| v.as_str().and_then(parse_timestamp_millis))
                .collect();
            Series::new(name.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        ColumnKind::Text => {
            let text: Vec<Option<String>> = values
                .iter()
                .map(|v| v.as_str().map(ToOwned::to_owned))
                .collect();
            Series::new(name.into(), text)
        }
        ColumnKind::Mixed => {
            let text: Vec<Option<String>> = values.iter().map(|v| display_text(v)).collect();
            Series::new(name.into(), text)
        }
    };
    Ok(series)
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn cell_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(format!("b:{b}")),
        Value::Number(n) => Some(format!("n:{}", number_key(n))),
        Value::String(s) => Some(format!("s:{s}")),
        nested => Some(format!("j:{nested}")),
    }
}

/// Largest magnitude below which an integral `f64` converts to `i64` exactly.
const EXACT_INT_BOUND: f64 = 9.0e18;

fn number_key(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < EXACT_INT_BOUND => (f as i64).to_string(),
        Some(f) => format!("{f:?}"),
        None => n.to_string(),
    }
}

/// Milliseconds since the epoch for RFC 3339 timestamps, naive
/// `YYYY-MM-DD[T| ]HH:MM:SS[.fff]` timestamps (read as UTC) and plain dates.
pub fn parse_timestamp_millis(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
