//! Centralized error handling for tablelens.
//!
//! Errors fall into two groups:
//!
//! - **Fatal** startup conditions ([`LensError::ConfigurationMissing`],
//!   [`LensError::ConnectionFailure`]) that stop the session before any
//!   table can be requested.
//! - **Per-table** failures ([`LensError::FetchFailure`],
//!   [`LensError::InvalidArgument`], [`LensError::DataProcessing`]) that
//!   the dashboard converts into diagnostics so a single bad table name
//!   never ends the session.
//!
//! ```
//! use tablelens::error::LensError;
//!
//! fn is_fatal(err: &LensError) -> bool {
//!     err.is_fatal()
//! }
//!
//! assert!(is_fatal(&LensError::ConfigurationMissing("SUPABASE_URL".to_owned())));
//! assert!(!is_fatal(&LensError::InvalidArgument("unknown column".to_owned())));
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any `Result` whose error
//! converts into [`LensError`]:
//!
//! ```no_run
//! use tablelens::error::ResultExt as _;
//!
//! fn load() -> tablelens::error::Result<String> {
//!     std::fs::read_to_string("config.json").context("Failed to read settings")
//! }
//! ```

use std::fmt;

/// Main error type for tablelens operations.
#[derive(Debug)]
pub enum LensError {
    /// Required connection parameters are absent at startup.
    ConfigurationMissing(String),

    /// The remote client could not be constructed.
    ConnectionFailure(String),

    /// A single table query failed (bad name, permission, transport).
    FetchFailure { table: String, reason: String },

    /// Caller supplied an argument the operation cannot accept.
    InvalidArgument(String),

    /// Data processing errors (Polars, ingestion)
    DataProcessing(String),

    /// I/O errors (settings file, log directory)
    Io(std::io::Error),

    /// Settings file errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl LensError {
    /// Whether this error ends the session rather than a single request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing(_) | Self::ConnectionFailure(_)
        )
    }
}

impl fmt::Display for LensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationMissing(msg) => write!(f, "Configuration missing: {msg}"),
            Self::ConnectionFailure(msg) => write!(f, "Connection failure: {msg}"),
            Self::FetchFailure { table, reason } => {
                write!(f, "Failed to fetch table '{table}': {reason}")
            }
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LensError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for LensError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for LensError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for LensError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<reqwest::Error> for LensError {
    fn from(err: reqwest::Error) -> Self {
        Self::Other(format!("HTTP error: {err}"))
    }
}

/// Result type alias for tablelens operations.
pub type Result<T> = std::result::Result<T, LensError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<LensError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: LensError = e.into();
            LensError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: LensError = e.into();
            LensError::Other(format!("{}: {}", f(), err))
        })
    }
}
