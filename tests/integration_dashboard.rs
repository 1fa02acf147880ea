//! Integration tests for the full dashboard workflow
//!
//! These tests serve fixture tables from memory, run them through the
//! fetcher, analyser and renderer, and verify the end-to-end results.

#![expect(clippy::unwrap_used, clippy::indexing_slicing)]

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tablelens::analyser::Record;
use tablelens::config::AppSettings;
use tablelens::dashboard::Dashboard;
use tablelens::diagnostics::{Scope, Severity};
use tablelens::fetcher::{FetchStatus, ManualClock, MemorySource, TableFetcher};
use tablelens::render;

fn fixture(name: &str) -> Result<Vec<Record>> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(format!("{name}.json"));
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn source() -> Result<Arc<MemorySource>> {
    Ok(Arc::new(
        MemorySource::new()
            .with_table("compras", fixture("compras")?)
            .with_table("repetidos", fixture("repetidos")?)
            .with_table("vacia", Vec::new())
            .with_failure("privada", "permission denied for table privada"),
    ))
}

fn dashboard(source: &Arc<MemorySource>) -> Dashboard {
    Dashboard::new(TableFetcher::new(Arc::clone(source)), AppSettings::default())
}

#[test]
fn test_compras_overview() -> Result<()> {
    let source = source()?;
    let view = dashboard(&source).view("compras", None)?;

    assert_eq!(view.status, FetchStatus::Fetched);
    assert_eq!(view.columns.len(), 8, "Should keep every column");
    assert_eq!(view.preview.as_ref().unwrap().height(), 5, "Preview shows 5 rows");

    let stats = view.statistics.as_ref().unwrap();
    let numeric: Vec<&str> = stats
        .numeric
        .columns()
        .iter()
        .map(|s| s.column.as_str())
        .collect();
    assert_eq!(numeric, ["id", "cantidad", "precio"]);
    let non_numeric: Vec<&str> = stats
        .non_numeric
        .columns()
        .iter()
        .map(|s| s.column.as_str())
        .collect();
    assert_eq!(non_numeric, ["proveedor", "producto", "pagado", "fecha"]);
    assert_eq!(stats.excluded, ["nota"]);

    let proveedor = &stats.non_numeric.columns()[0];
    assert_eq!(proveedor.count, 6);
    assert_eq!(proveedor.unique, 2);
    assert_eq!(proveedor.freq, 3);

    // ids are unique, so no whole-row duplicates
    assert!(view.duplicates.as_ref().unwrap().is_empty());
    let dup: Vec<_> = view.diagnostics_for(Scope::Duplicates).collect();
    assert_eq!(dup[0].severity, Severity::Info);
    Ok(())
}

#[test]
fn test_subset_duplicates_on_compras() -> Result<()> {
    let source = source()?;
    let subset = ["proveedor".to_owned(), "producto".to_owned()];
    let view = dashboard(&source).view("compras", Some(&subset))?;

    let report = view.subset_duplicates.as_ref().unwrap();
    assert_eq!(report.row_count(), 4);
    assert_eq!(report.redundant_count, 2);
    assert_eq!(
        report.rows.cell_strings("id")?,
        [Some("5"), Some("6"), Some("1"), Some("4")].map(|v| v.map(str::to_owned))
    );
    assert_eq!(report.rows.width(), 8, "Whole rows are returned");

    let subset_diag: Vec<_> = view.diagnostics_for(Scope::Subset).collect();
    assert_eq!(subset_diag[0].severity, Severity::Warning);
    assert!(subset_diag[0].message.ends_with("proveedor, producto"));
    Ok(())
}

#[test]
fn test_whole_row_duplicates_sorted() -> Result<()> {
    let source = source()?;
    let view = dashboard(&source).view("repetidos", None)?;

    let report = view.duplicates.as_ref().unwrap();
    assert_eq!(report.row_count(), 5);
    assert_eq!(report.redundant_count, 3);
    let producto = report.rows.cell_strings("producto")?;
    let expected = ["Grapas", "Grapas", "Resma A4", "Resma A4", "Resma A4"];
    assert_eq!(producto.len(), expected.len());
    for (got, want) in producto.iter().zip(expected) {
        assert_eq!(got.as_deref(), Some(want));
    }
    Ok(())
}

#[test]
fn test_missing_subset_column_is_reported() -> Result<()> {
    let source = source()?;
    let subset = ["proveedor".to_owned(), "sucursal".to_owned()];
    let view = dashboard(&source).view("compras", Some(&subset))?;

    assert!(view.subset_duplicates.is_none());
    assert!(view.statistics.is_some(), "Other sections still render");
    let errors: Vec<_> = view
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].scope, Scope::Subset);
    assert!(errors[0].message.contains("sucursal"));
    Ok(())
}

#[test]
fn test_empty_and_failing_tables() -> Result<()> {
    let source = source()?;
    let dash = dashboard(&source);

    let empty = dash.view("vacia", None)?;
    assert_eq!(empty.status, FetchStatus::Empty);
    assert!(empty.preview.is_none());
    assert!(empty.statistics.is_none());

    let failed = dash.view("privada", None)?;
    assert!(matches!(failed.status, FetchStatus::Failed(_)));
    assert_eq!(failed.diagnostics[0].severity, Severity::Error);

    // a failing table does not poison the session
    let ok = dash.view("compras", None)?;
    assert_eq!(ok.status, FetchStatus::Fetched);

    dash.view("privada", None)?;
    assert_eq!(source.calls("privada"), 2, "Failures are retried");
    Ok(())
}

#[test]
fn test_cache_window() -> Result<()> {
    let source = source()?;
    let clock = Arc::new(ManualClock::new());
    let dash = Dashboard::new(
        TableFetcher::new(Arc::clone(&source)).with_clock(Arc::clone(&clock) as _),
        AppSettings::default(),
    );

    dash.view("compras", None)?;
    dash.view("compras", Some(&["producto".to_owned()]))?;
    assert_eq!(source.calls("compras"), 1, "Subset changes reuse the cache");

    clock.advance(Duration::from_secs(600));
    let view = dash.view("compras", None)?;
    assert_eq!(view.status, FetchStatus::Fetched);
    assert_eq!(source.calls("compras"), 2);
    Ok(())
}

#[test]
fn test_json_report() -> Result<()> {
    let source = source()?;
    let view = dashboard(&source).view("repetidos", Some(&["proveedor".to_owned()]))?;
    let json = serde_json::to_value(&view)?;

    assert_eq!(json["table_name"], "repetidos");
    assert_eq!(json["status"]["state"], "fetched");
    assert_eq!(json["duplicates"]["redundant_count"], 3);
    assert_eq!(json["duplicates"]["rows"].as_array().unwrap().len(), 5);
    assert_eq!(json["duplicates"]["rows"][0]["proveedor"], "Oficentro");
    assert_eq!(json["statistics"]["numeric"]["status"], "columns");
    assert_eq!(json["diagnostics"][0]["severity"], "warning");
    Ok(())
}

#[test]
fn test_text_report() -> Result<()> {
    let source = source()?;
    let view = dashboard(&source).view("repetidos", None)?;
    let text = render::view_to_text(&view);

    assert!(text.contains("Analysis of table: repetidos"));
    assert!(text.contains("Descriptive statistics"));
    assert!(text.contains("Exact repeats, excluding the first occurrence: 3"));
    Ok(())
}
