//! Plain-text rendering of a [`DashboardView`] for the terminal.

use crate::analyser::{DuplicateReport, StatisticsReport, Table};
use crate::dashboard::DashboardView;
use crate::diagnostics::{Diagnostic, Scope};
use crate::fetcher::FetchStatus;
use polars::prelude::{DataFrame, PolarsResult};
use std::fmt;

/// Renders every section of `view`, each followed by its diagnostics.
pub fn view_to_text(view: &DashboardView) -> String {
    TextView(view).to_string()
}

struct TextView<'a>(&'a DashboardView);

impl fmt::Display for TextView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;

        writeln!(f, "Analysis of table: {}", view.table_name)?;
        writeln!(f, "Status: {}", status_label(&view.status))?;
        write_diagnostics(f, view, Scope::Fetch)?;

        if let Some(preview) = &view.preview {
            heading(f, "Preview")?;
            write_table(f, preview)?;
        }

        if let Some(statistics) = &view.statistics {
            heading(f, "Descriptive statistics")?;
            write_statistics(f, statistics)?;
        }
        write_diagnostics(f, view, Scope::Statistics)?;

        if let Some(duplicates) = &view.duplicates {
            heading(f, "Duplicate rows")?;
            write_duplicates(f, duplicates)?;
        }
        write_diagnostics(f, view, Scope::Duplicates)?;

        if view.subset_duplicates.is_some() || view.diagnostics_for(Scope::Subset).next().is_some()
        {
            heading(f, "Duplicates by columns")?;
            if let Some(subset) = &view.subset_duplicates {
                write_duplicates(f, subset)?;
            }
            write_diagnostics(f, view, Scope::Subset)?;
        }

        Ok(())
    }
}

fn status_label(status: &FetchStatus) -> String {
    match status {
        FetchStatus::Fetched => "fetched".to_owned(),
        FetchStatus::Cached => "cached".to_owned(),
        FetchStatus::Empty => "empty".to_owned(),
        FetchStatus::Failed(reason) => format!("failed ({reason})"),
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(title.chars().count()))
}

fn write_table(f: &mut fmt::Formatter<'_>, table: &Table) -> fmt::Result {
    if table.width() == 0 {
        return writeln!(f, "(no columns)");
    }
    writeln!(f, "{}", table.frame())
}

fn write_frame(f: &mut fmt::Formatter<'_>, frame: PolarsResult<Option<DataFrame>>) -> fmt::Result {
    match frame {
        Ok(Some(frame)) => writeln!(f, "{frame}"),
        Ok(None) => Ok(()),
        Err(err) => writeln!(f, "(could not lay out statistics: {err})"),
    }
}

fn write_statistics(f: &mut fmt::Formatter<'_>, report: &StatisticsReport) -> fmt::Result {
    write_frame(f, report.numeric_frame())?;
    write_frame(f, report.non_numeric_frame())
}

fn write_duplicates(f: &mut fmt::Formatter<'_>, report: &DuplicateReport) -> fmt::Result {
    if report.is_empty() {
        return Ok(());
    }
    write_table(f, &report.rows)?;
    writeln!(
        f,
        "Exact repeats, excluding the first occurrence: {}",
        report.redundant_count
    )
}

fn write_diagnostics(f: &mut fmt::Formatter<'_>, view: &DashboardView, scope: Scope) -> fmt::Result {
    view.diagnostics_for(scope)
        .try_for_each(|d: &Diagnostic| writeln!(f, "{d}"))
}
