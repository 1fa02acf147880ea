use super::table::Table;
use polars::prelude::*;
use serde::Serialize;

/// Either a list of per-column summaries, or an explicit marker that no
/// column qualified for this half of the report.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "columns", rename_all = "snake_case")]
pub enum SubReport<T> {
    Columns(Vec<T>),
    NotApplicable,
}

impl<T> SubReport<T> {
    pub fn from_columns(columns: Vec<T>) -> Self {
        if columns.is_empty() {
            Self::NotApplicable
        } else {
            Self::Columns(columns)
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Columns(_))
    }

    pub fn columns(&self) -> &[T] {
        match self {
            Self::Columns(c) => c,
            Self::NotApplicable => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub numeric: SubReport<NumericSummary>,
    pub non_numeric: SubReport<CategoricalSummary>,
    /// Columns with no values at all, left out of both halves.
    pub excluded: Vec<String>,
}

pub const NUMERIC_STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
pub const NON_NUMERIC_STATISTICS: [&str; 4] = ["count", "unique", "top", "freq"];

impl StatisticsReport {
    pub fn empty() -> Self {
        Self {
            numeric: SubReport::NotApplicable,
            non_numeric: SubReport::NotApplicable,
            excluded: Vec::new(),
        }
    }

    /// Numeric half laid out like a describe table: one row per statistic,
    /// one column per summarised column.
    ///
    /// # Errors
    ///
    /// Returns an error if Polars cannot assemble the frame.
    pub fn numeric_frame(&self) -> PolarsResult<Option<DataFrame>> {
        let SubReport::Columns(summaries) = &self.numeric else {
            return Ok(None);
        };
        let mut columns = vec![Column::from(Series::new(
            "".into(),
            NUMERIC_STATISTICS.to_vec(),
        ))];
        for s in summaries {
            let values = vec![
                Some(s.count as f64),
                s.mean,
                s.std,
                s.min,
                s.q25,
                s.median,
                s.q75,
                s.max,
            ];
            columns.push(Column::from(Series::new(s.column.as_str().into(), values)));
        }
        DataFrame::new(columns).map(Some)
    }

    /// Non-numeric half laid out like a describe table.
    ///
    /// # Errors
    ///
    /// Returns an error if Polars cannot assemble the frame.
    pub fn non_numeric_frame(&self) -> PolarsResult<Option<DataFrame>> {
        let SubReport::Columns(summaries) = &self.non_numeric else {
            return Ok(None);
        };
        let mut columns = vec![Column::from(Series::new(
            "".into(),
            NON_NUMERIC_STATISTICS.to_vec(),
        ))];
        for s in summaries {
            let values = vec![
                Some(s.count.to_string()),
                Some(s.unique.to_string()),
                s.top.clone(),
                Some(s.freq.to_string()),
            ];
            columns.push(Column::from(Series::new(s.column.as_str().into(), values)));
        }
        DataFrame::new(columns).map(Some)
    }
}

/// Rows that share their comparison-column values with at least one other
/// row, plus how many of them are repeats of an earlier row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuplicateReport {
    /// Columns the rows were compared on, in sort order.
    pub columns: Vec<String>,
    pub rows: Table,
    /// Rows that repeat an earlier row on the comparison columns.
    pub redundant_count: usize,
}

impl DuplicateReport {
    pub fn empty(table: &Table, columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: table.head(0),
            redundant_count: 0,
        }
    }

    /// Number of rows taking part in any duplicate group.
    pub fn row_count(&self) -> usize {
        self.rows.height()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
