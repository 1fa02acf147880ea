//! User-facing messages produced while fetching and analysing a table.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The control a diagnostic belongs to, so it can be shown next to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Fetch,
    Statistics,
    Duplicates,
    Subset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub scope: Scope,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, scope: Scope, message: impl Into<String>) -> Self {
        Self {
            severity,
            scope,
            message: message.into(),
        }
    }

    pub fn info(scope: Scope, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, scope, message)
    }

    pub fn warning(scope: Scope, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, scope, message)
    }

    pub fn error(scope: Scope, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, scope, message)
    }
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Statistics => "statistics",
            Self::Duplicates => "duplicates",
            Self::Subset => "subset",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity.as_str(),
            self.scope.as_str(),
            self.message
        )
    }
}
