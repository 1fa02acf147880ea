//! # tablelens - Duplicate Detection and Summaries for Remote Tables
//!
//! tablelens pulls every row of a table from a Supabase/PostgREST backend,
//! keeps it in a short-lived cache, and reports on it: a preview, describe
//! style statistics split by column kind, and the rows that occur more than
//! once, either as whole rows or on a chosen set of columns.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tablelens::config::{AppSettings, ConnectionSettings};
//! use tablelens::dashboard::Dashboard;
//! use tablelens::fetcher::{RestSource, TableFetcher};
//! use std::time::Duration;
//!
//! let connection = ConnectionSettings::from_env()?;
//! let source = RestSource::connect(&connection, Duration::from_secs(30))?;
//! let dashboard = Dashboard::new(TableFetcher::new(source), AppSettings::default());
//!
//! let view = dashboard.view("compras", Some(&["proveedor".to_owned()]))?;
//! print!("{}", tablelens::render::view_to_text(&view));
//! # Ok::<(), tablelens::error::LensError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`fetcher`]: Table retrieval with a ten minute cache per table name
//! - [`analyser`]: Typed tables, descriptive statistics and duplicate reports
//! - [`dashboard`]: One request end to end, problems collected as [`diagnostics`]
//! - [`render`]: Terminal output
//! - [`shell`]: Interactive session
//! - [`config`]: Credentials from the environment and JSON settings
//! - [`error`]: Error types and handling utilities
//! - [`logging`]: Tracing subscriber setup

pub mod analyser;
pub mod config;
pub mod dashboard;
pub mod diagnostics;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod render;
pub mod shell;
