//! One dashboard session: fetch a table, analyse it, and collect everything
//! the presentation layer needs into a [`DashboardView`].
//!
//! Per-table problems never abort a view. They are turned into
//! [`Diagnostic`]s shown next to the section that produced them. Only a
//! blank table name is refused outright.

use crate::analyser::{self, DuplicateReport, StatisticsReport, Table};
use crate::config::AppSettings;
use crate::diagnostics::{Diagnostic, Scope};
use crate::error::Result;
use crate::fetcher::{FetchStatus, TableFetcher};
use serde::Serialize;

/// A column name with its inferred kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: &'static str,
}

/// Everything shown for one request.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
    pub table_name: String,
    pub status: FetchStatus,
    pub columns: Vec<ColumnInfo>,
    /// First rows of the table, absent when there is nothing to show.
    pub preview: Option<Table>,
    pub statistics: Option<StatisticsReport>,
    pub duplicates: Option<DuplicateReport>,
    /// Only present when a non-empty column selection was made and it was valid.
    pub subset_duplicates: Option<DuplicateReport>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DashboardView {
    /// Diagnostics raised for one section.
    pub fn diagnostics_for(&self, scope: Scope) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.scope == scope)
    }
}

pub struct Dashboard {
    fetcher: TableFetcher,
    settings: AppSettings,
}

impl Dashboard {
    pub fn new(fetcher: TableFetcher, settings: AppSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn fetcher(&self) -> &TableFetcher {
        &self.fetcher
    }

    /// Builds the view for `table_name`, optionally also checking for
    /// duplicates over `subset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LensError::InvalidArgument`] for a blank
    /// table name. Everything else is reported through diagnostics.
    pub fn view(&self, table_name: &str, subset: Option<&[String]>) -> Result<DashboardView> {
        let outcome = self.fetcher.fetch(table_name)?;
        let name = table_name.trim().to_owned();
        let table = outcome.table.as_ref();
        let mut diagnostics = outcome.diagnostics.clone();

        let mut view = DashboardView {
            table_name: name.clone(),
            status: outcome.status.clone(),
            columns: table
                .schema()
                .into_iter()
                .map(|(name, kind)| ColumnInfo {
                    name,
                    kind: kind.as_str(),
                })
                .collect(),
            preview: None,
            statistics: None,
            duplicates: None,
            subset_duplicates: None,
            diagnostics: Vec::new(),
        };

        if !outcome.is_available() {
            diagnostics.push(Diagnostic::warning(
                Scope::Fetch,
                format!("Could not load data from table '{name}' or it is empty"),
            ));
            view.diagnostics = diagnostics;
            return Ok(view);
        }

        view.preview = Some(table.head(self.settings.preview_rows));
        view.statistics = statistics_section(table, &mut diagnostics);
        view.duplicates = duplicates_section(table, &mut diagnostics);

        if let Some(columns) = subset.filter(|c| !c.is_empty()) {
            view.subset_duplicates = subset_section(table, columns, &mut diagnostics);
        }

        view.diagnostics = diagnostics;
        Ok(view)
    }

    /// Forgets the cached copy of `table_name` so the next view refetches it.
    pub fn refresh(&self, table_name: &str) {
        tracing::info!("Refreshing table '{}'", table_name.trim());
        self.fetcher.invalidate(table_name);
    }
}

fn statistics_section(table: &Table, diagnostics: &mut Vec<Diagnostic>) -> Option<StatisticsReport> {
    match analyser::describe(table) {
        Ok(report) => {
            if !report.numeric.is_applicable() {
                diagnostics.push(Diagnostic::info(Scope::Statistics, "No numeric columns"));
            }
            if !report.non_numeric.is_applicable() {
                diagnostics.push(Diagnostic::info(
                    Scope::Statistics,
                    "No non-numeric columns",
                ));
            }
            if !report.excluded.is_empty() {
                diagnostics.push(Diagnostic::info(
                    Scope::Statistics,
                    format!(
                        "Columns without any values were skipped: {}",
                        report.excluded.join(", ")
                    ),
                ));
            }
            Some(report)
        }
        Err(err) => {
            tracing::error!("Statistics failed: {err}");
            diagnostics.push(Diagnostic::error(
                Scope::Statistics,
                format!("Error computing statistics: {err}"),
            ));
            None
        }
    }
}

fn duplicates_section(table: &Table, diagnostics: &mut Vec<Diagnostic>) -> Option<DuplicateReport> {
    match analyser::find_duplicates(table) {
        Ok(report) => {
            if report.is_empty() {
                diagnostics.push(Diagnostic::info(Scope::Duplicates, "No duplicate rows found"));
            } else {
                diagnostics.push(Diagnostic::warning(
                    Scope::Duplicates,
                    format!(
                        "Found {} rows that have at least one duplicate; {} are exact repeats of an earlier row",
                        report.row_count(),
                        report.redundant_count
                    ),
                ));
            }
            Some(report)
        }
        Err(err) => {
            tracing::error!("Duplicate scan failed: {err}");
            diagnostics.push(Diagnostic::error(
                Scope::Duplicates,
                format!("Error finding duplicate rows: {err}"),
            ));
            None
        }
    }
}

fn subset_section(
    table: &Table,
    columns: &[String],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<DuplicateReport> {
    match analyser::find_duplicates_by_subset(table, columns) {
        Ok(report) => {
            if report.is_empty() {
                diagnostics.push(Diagnostic::info(
                    Scope::Subset,
                    "No duplicate rows found on the selected columns",
                ));
            } else {
                diagnostics.push(Diagnostic::warning(
                    Scope::Subset,
                    format!(
                        "Found {} duplicate rows based on: {}",
                        report.row_count(),
                        report.columns.join(", ")
                    ),
                ));
            }
            Some(report)
        }
        Err(err) => {
            tracing::warn!("Subset duplicate scan rejected: {err}");
            diagnostics.push(Diagnostic::error(Scope::Subset, err.to_string()));
            None
        }
    }
}
