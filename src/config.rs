use crate::error::{LensError, Result, ResultExt as _};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_KEY";

/// Endpoint and access key for the remote backend.
///
/// Read once at startup; the key never leaves this struct except through
/// [`ConnectionSettings::key`].
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub url: String,
    key: SecretString,
}

impl ConnectionSettings {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        let key: String = key.into();
        Self {
            url: url.into(),
            key: SecretString::new(key.into()),
        }
    }

    /// Loads `.env` when present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::ConfigurationMissing`] when either variable is
    /// unset or blank.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::ConfigurationMissing`] naming every variable
    /// that is unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        match (read(URL_VAR), read(KEY_VAR)) {
            (Some(url), Some(key)) => Ok(Self::new(url.trim(), key.trim())),
            (url, key) => {
                let missing: Vec<&str> = [(URL_VAR, url.is_none()), (KEY_VAR, key.is_none())]
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                Err(LensError::ConfigurationMissing(format!(
                    "environment variable(s) {} not set",
                    missing.join(" and ")
                )))
            }
        }
    }

    pub fn key(&self) -> &str {
        self.key.expose_secret()
    }
}

/// Non-secret settings for the dashboard, persisted as JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// Number of rows shown in the raw preview.
    pub preview_rows: usize,
    /// Table requested when none is given on the command line.
    pub default_table: String,
    /// Connect timeout for the HTTP client, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            default_table: "compras".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tablelens").join("config.json"))
}

/// Reads settings from `path`, or from the default location when `None`.
///
/// A missing file yields the defaults. A file that exists but cannot be
/// parsed is an error, so a typo never silently reverts to defaults.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Result<AppSettings> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_settings_path() {
            Some(p) => p,
            None => return Ok(AppSettings::default()),
        },
    };

    if !path.exists() {
        tracing::debug!("No settings file at {}, using defaults", path.display());
        return Ok(AppSettings::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings = serde_json::from_str::<AppSettings>(&content)?;
    Ok(settings)
}

/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub fn save_settings(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
