//! Remote table sources.
//!
//! The fetcher needs exactly one capability from the backend: "give me every
//! row of this table". [`RestSource`] provides it over the PostgREST API that
//! Supabase exposes; [`MemorySource`] serves fixed records for offline use
//! and tests.

use crate::analyser::Record;
use crate::config::{ConnectionSettings, URL_VAR};
use crate::error::{LensError, Result};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Something that can return all rows of a named table.
pub trait TableSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`LensError::FetchFailure`] when the table cannot be read.
    fn select_all(&self, table: &str) -> Result<Vec<Record>>;
}

/// Blocking client for a Supabase project's REST endpoint.
pub struct RestSource {
    client: Client,
    base: Url,
}

impl RestSource {
    /// Builds the HTTP client once for the session.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::ConnectionFailure`] if the endpoint is not a
    /// usable base URL, the key cannot be sent as a header, or the client
    /// cannot be built.
    pub fn connect(settings: &ConnectionSettings, connect_timeout: Duration) -> Result<Self> {
        let base = Url::parse(&settings.url).map_err(|e| {
            LensError::ConnectionFailure(format!("{URL_VAR} '{}' is not a valid URL: {e}", settings.url))
        })?;
        if base.cannot_be_a_base() {
            return Err(LensError::ConnectionFailure(format!(
                "{URL_VAR} '{}' cannot be used as a base URL",
                settings.url
            )));
        }

        let client = client_builder(settings, connect_timeout)?
            .build()
            .map_err(|e| LensError::ConnectionFailure(format!("failed to build HTTP client: {e}")))?;

        tracing::info!("Using REST endpoint {}", base);
        Ok(Self { client, base })
    }

    /// `{base}/rest/v1/{table}?select=*`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot take path segments.
    pub fn table_url(&self, table: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| LensError::ConnectionFailure(format!("{} cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        url.query_pairs_mut().clear().append_pair("select", "*");
        Ok(url)
    }
}

/// Client settings shared by every request: the key goes out both as
/// `apikey` and as a bearer token, and neither is ever logged.
fn client_builder(
    settings: &ConnectionSettings,
    connect_timeout: Duration,
) -> Result<ClientBuilder> {
    let invalid_key = |_| {
        LensError::ConnectionFailure(
            "access key contains characters that cannot be sent in an HTTP header".to_owned(),
        )
    };
    let mut apikey = HeaderValue::from_str(settings.key()).map_err(invalid_key)?;
    apikey.set_sensitive(true);
    let mut bearer =
        HeaderValue::from_str(&format!("Bearer {}", settings.key())).map_err(invalid_key)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);

    Ok(Client::builder()
        .default_headers(headers)
        .connect_timeout(connect_timeout))
}

impl TableSource for RestSource {
    fn select_all(&self, table: &str) -> Result<Vec<Record>> {
        let failure = |reason: String| LensError::FetchFailure {
            table: table.to_owned(),
            reason,
        };

        let url = self.table_url(table)?;
        tracing::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failure(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(failure(format!("{status}: {}", body.trim())));
        }

        response
            .json::<Vec<Record>>()
            .map_err(|e| failure(format!("unexpected response body: {e}")))
    }
}

/// In-memory source with a per-table call counter.
#[derive(Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<Record>>,
    failures: HashMap<String, String>,
    calls: HashMap<String, AtomicUsize>,
    delay: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        let name = name.into();
        self.calls.entry(name.clone()).or_default();
        self.tables.insert(name, records);
        self
    }

    /// Makes every request for `name` fail with `reason`.
    pub fn with_failure(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = name.into();
        self.calls.entry(name.clone()).or_default();
        self.failures.insert(name, reason.into());
        self
    }

    /// Sleeps this long inside every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `name` was requested. Only registered names are counted.
    pub fn calls(&self, name: &str) -> usize {
        self.calls
            .get(name)
            .map_or(0, |n| n.load(Ordering::SeqCst))
    }
}

impl TableSource for MemorySource {
    fn select_all(&self, table: &str) -> Result<Vec<Record>> {
        if let Some(counter) = self.calls.get(table) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(reason) = self.failures.get(table) {
            return Err(LensError::FetchFailure {
                table: table.to_owned(),
                reason: reason.clone(),
            });
        }
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| LensError::FetchFailure {
                table: table.to_owned(),
                reason: "relation does not exist".to_owned(),
            })
    }
}

impl<S: TableSource + ?Sized> TableSource for std::sync::Arc<S> {
    fn select_all(&self, table: &str) -> Result<Vec<Record>> {
        (**self).select_all(table)
    }
}
