//! Interactive session: the terminal counterpart of the dashboard page.
//!
//! Each line is either a table name or a command:
//!
//! - an empty line analyses the default table
//! - `:columns a,b` checks the current table for duplicates over `a` and `b`;
//!   `:columns` alone clears the selection
//! - `:refresh` drops the cached copy of the current table and reloads it
//! - `:quit` (or end of input) leaves the session

use crate::dashboard::Dashboard;
use crate::error::{LensError, Result};
use crate::render;
use std::io::{BufRead, Write};

const PROMPT: &str = "table> ";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Table(String),
    Columns(Vec<String>),
    Refresh,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str, default_table: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Table(default_table.to_owned());
    }
    let Some(command) = line.strip_prefix(':') else {
        return Input::Table(line.to_owned());
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .unwrap_or((command, ""));
    match name {
        "columns" | "c" => Input::Columns(parse_columns(rest)),
        "refresh" | "r" => Input::Refresh,
        "quit" | "q" | "exit" => Input::Quit,
        other => Input::Unknown(other.to_owned()),
    }
}

/// Splits a comma separated column list, dropping blanks.
pub fn parse_columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Runs the session until `:quit` or end of input.
///
/// # Errors
///
/// Returns an error when reading input or writing output fails. Problems
/// with individual tables are printed and the session continues.
pub fn run<R: BufRead, W: Write>(dashboard: &Dashboard, input: R, mut out: W) -> Result<()> {
    let default_table = dashboard.settings().default_table.clone();
    let mut current: Option<String> = None;
    let mut subset: Vec<String> = Vec::new();

    writeln!(
        out,
        "Enter a table name (empty for '{default_table}'), :columns a,b, :refresh or :quit"
    )?;
    write!(out, "{PROMPT}")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        match parse_line(&line, &default_table) {
            Input::Quit => break,
            Input::Table(name) => {
                if current.as_deref() != Some(name.as_str()) {
                    subset.clear();
                }
                show(dashboard, &name, &subset, &mut out)?;
                current = Some(name);
            }
            Input::Columns(columns) => match &current {
                Some(name) => {
                    subset = columns;
                    show(dashboard, name, &subset, &mut out)?;
                }
                None => writeln!(out, "Load a table before selecting columns")?,
            },
            Input::Refresh => match &current {
                Some(name) => {
                    dashboard.refresh(name);
                    show(dashboard, name, &subset, &mut out)?;
                }
                None => writeln!(out, "Nothing to refresh yet")?,
            },
            Input::Unknown(command) => writeln!(out, "Unknown command ':{command}'")?,
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;
    }

    writeln!(out)?;
    Ok(())
}

fn show<W: Write>(dashboard: &Dashboard, name: &str, subset: &[String], out: &mut W) -> Result<()> {
    let subset = (!subset.is_empty()).then_some(subset);
    match dashboard.view(name, subset) {
        Ok(view) => {
            write!(out, "{}", render::view_to_text(&view))?;
            if view.preview.is_some() {
                let names: Vec<&str> = view.columns.iter().map(|c| c.name.as_str()).collect();
                writeln!(out, "Columns available for :columns: {}", names.join(", "))?;
            }
        }
        Err(LensError::InvalidArgument(msg)) => writeln!(out, "{msg}")?,
        Err(err) => return Err(err),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppSettings;
    use crate::fetcher::{MemorySource, TableFetcher};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  ", "compras"), Input::Table("compras".to_owned()));
        assert_eq!(parse_line("ventas", "compras"), Input::Table("ventas".to_owned()));
        assert_eq!(
            parse_line(":columns a, b,,c", "compras"),
            Input::Columns(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()])
        );
        assert_eq!(parse_line(":columns", "compras"), Input::Columns(Vec::new()));
        assert_eq!(parse_line(":refresh", "compras"), Input::Refresh);
        assert_eq!(parse_line(":q", "compras"), Input::Quit);
        assert_eq!(parse_line(":nope", "compras"), Input::Unknown("nope".to_owned()));
    }

    fn session(script: &str) -> anyhow::Result<(String, Arc<MemorySource>)> {
        let rows = [
            json!({ "id": 1, "item": "pen" }),
            json!({ "id": 2, "item": "pen" }),
        ]
        .iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let source = Arc::new(MemorySource::new().with_table("compras", rows));
        let dashboard = Dashboard::new(
            TableFetcher::new(Arc::clone(&source)),
            AppSettings::default(),
        );
        let mut out = Vec::new();
        run(&dashboard, script.as_bytes(), &mut out)?;
        Ok((String::from_utf8(out)?, source))
    }

    #[test]
    fn test_default_table_then_columns() -> anyhow::Result<()> {
        let (out, source) = session("\n:columns item\n:quit\n")?;
        assert!(out.contains("Analysis of table: compras"));
        assert!(out.contains("Found 2 duplicate rows based on: item"));
        assert_eq!(source.calls("compras"), 1);
        Ok(())
    }

    #[test]
    fn test_refresh_reloads() -> anyhow::Result<()> {
        let (_out, source) = session("compras\n:refresh\n")?;
        assert_eq!(source.calls("compras"), 2);
        Ok(())
    }

    #[test]
    fn test_columns_before_table() -> anyhow::Result<()> {
        let (out, source) = session(":columns item\n")?;
        assert!(out.contains("Load a table before selecting columns"));
        assert_eq!(source.calls("compras"), 0);
        Ok(())
    }

    #[test]
    fn test_quit_stops_reading() -> anyhow::Result<()> {
        let (_out, source) = session(":quit\ncompras\n")?;
        assert_eq!(source.calls("compras"), 0);
        Ok(())
    }
}
