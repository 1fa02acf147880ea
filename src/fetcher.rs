//! Fetching tables from the remote backend, with a time-bounded cache.
//!
//! ```
//! use serde_json::json;
//! use std::sync::Arc;
//! use tablelens::fetcher::{FetchStatus, MemorySource, TableFetcher};
//!
//! let rows = vec![json!({ "id": 1 }).as_object().cloned().unwrap_or_default()];
//! let source = Arc::new(MemorySource::new().with_table("compras", rows));
//! let fetcher = TableFetcher::new(Arc::clone(&source));
//!
//! let first = fetcher.fetch("compras")?;
//! let second = fetcher.fetch("compras")?;
//! assert_eq!(first.status, FetchStatus::Fetched);
//! assert_eq!(second.status, FetchStatus::Cached);
//! assert_eq!(source.calls("compras"), 1);
//! # Ok::<(), tablelens::error::LensError>(())
//! ```

pub mod cache;
pub mod source;

pub use cache::{Clock, DEFAULT_TTL, ManualClock, SystemClock, TableCache};
pub use source::{MemorySource, RestSource, TableSource};

use crate::analyser::Table;
use crate::diagnostics::{Diagnostic, Scope};
use crate::error::{LensError, Result};
use cache::CacheEntry;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// How the table in a [`FetchOutcome`] was obtained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum FetchStatus {
    /// Freshly read from the source.
    Fetched,
    /// Served from the cache without contacting the source.
    Cached,
    /// The source answered with zero rows.
    Empty,
    /// The source could not be read; the table is a placeholder.
    Failed(String),
}

/// A table together with how it was obtained and what the user should be
/// told about it. An empty table is only "unavailable" when the status says
/// so.
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    pub table: Arc<Table>,
    pub status: FetchStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl FetchOutcome {
    /// True when there are rows to analyse.
    pub fn is_available(&self) -> bool {
        !matches!(self.status, FetchStatus::Failed(_)) && !self.table.is_empty()
    }
}

pub struct TableFetcher {
    source: Box<dyn TableSource>,
    cache: TableCache,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TableFetcher {
    pub fn new(source: impl TableSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: TableCache::new(),
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    /// Returns the named table, from cache while it is fresh.
    ///
    /// Remote failures do not surface as errors: they come back as
    /// [`FetchStatus::Failed`] with an empty table and an error diagnostic,
    /// and are not cached, so the next request tries again.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::InvalidArgument`] for a blank table name.
    pub fn fetch(&self, table_name: &str) -> Result<FetchOutcome> {
        let name = table_name.trim();
        if name.is_empty() {
            return Err(LensError::InvalidArgument(
                "table name must not be empty".to_owned(),
            ));
        }

        let slot = self.cache.slot(name);
        let mut entry = cache::lock(&slot);

        if let Some(cached) = entry.as_ref()
            && cached.is_fresh(self.clock.now(), self.ttl)
        {
            tracing::debug!("Serving table '{name}' from cache");
            let mut diagnostics = Vec::new();
            if cached.table.is_empty() {
                diagnostics.push(no_rows(name));
            }
            return Ok(FetchOutcome {
                table: Arc::clone(&cached.table),
                status: FetchStatus::Cached,
                diagnostics,
            });
        }

        tracing::info!("Fetching table '{name}' from remote source");
        match self.load(name) {
            Ok(table) => {
                let table = Arc::new(table);
                *entry = Some(CacheEntry {
                    table: Arc::clone(&table),
                    fetched_at: self.clock.now(),
                });

                if table.is_empty() {
                    tracing::warn!("Table '{name}' returned no rows");
                    Ok(FetchOutcome {
                        table,
                        status: FetchStatus::Empty,
                        diagnostics: vec![no_rows(name)],
                    })
                } else {
                    tracing::info!(
                        rows = table.height(),
                        columns = table.width(),
                        "Loaded table '{name}'"
                    );
                    Ok(FetchOutcome {
                        table,
                        status: FetchStatus::Fetched,
                        diagnostics: Vec::new(),
                    })
                }
            }
            Err(err) => {
                *entry = None;
                drop(entry);
                self.cache.release(name, &slot);
                let reason = match err {
                    LensError::FetchFailure { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::error!("Error fetching table '{name}': {reason}");
                Ok(FetchOutcome {
                    table: Arc::new(Table::empty()),
                    diagnostics: vec![Diagnostic::error(
                        Scope::Fetch,
                        format!("Error fetching data from table '{name}': {reason}"),
                    )],
                    status: FetchStatus::Failed(reason),
                })
            }
        }
    }

    /// Drops the cached copy of `table_name`, if any.
    pub fn invalidate(&self, table_name: &str) {
        self.cache.invalidate(table_name.trim());
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    fn load(&self, name: &str) -> Result<Table> {
        let records = self.source.select_all(name)?;
        Table::from_records(&records)
    }
}

fn no_rows(name: &str) -> Diagnostic {
    Diagnostic::warning(Scope::Fetch, format!("No rows found in table '{name}'"))
}

#[cfg(test)]
mod tests;
