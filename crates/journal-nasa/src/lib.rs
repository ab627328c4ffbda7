#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/stellar-journal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! NASA Astronomy Picture of the Day (APOD) record source.
//!
//! This crate implements the [`RecordSource`] trait from `journal-core` for the
//! [NASA APOD](https://github.com/nasa/apod-api) API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use journal_nasa::NasaApodSource;
//! use journal_core::RecordSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = NasaApodSource::new("DEMO_KEY");
//!     let today = source.fetch_today().await?;
//!     println!("{}: {}", today.date, today.title);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use journal_core::{ApodRecord, JournalError, MediaKind, RecordSource, Result};
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Base URL for the NASA open APIs.
pub const NASA_API_BASE_URL: &str = "https://api.nasa.gov";

/// Path of the APOD endpoint relative to the base URL.
const APOD_ENDPOINT: &str = "planetary/apod";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const SOURCE_NAME: &str = "NASA APOD";

/// NASA APOD record source.
///
/// Each call to [`fetch_today`](RecordSource::fetch_today) issues one request; the
/// source keeps no state between calls.
#[derive(Clone)]
pub struct NasaApodSource {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for NasaApodSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NasaApodSource")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NasaApodSource {
    /// Create a new APOD source with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Create a new APOD source with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: NASA_API_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the source at a different host (mirrors, proxies, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the endpoint URL. The API key is sent as a query parameter and is
    /// not part of this string.
    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        tracing::debug!("APOD request: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| JournalError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(JournalError::RateLimited {
                source_name: SOURCE_NAME.to_string(),
                retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(JournalError::AuthenticationFailed(SOURCE_NAME.to_string()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(JournalError::Network(format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| JournalError::Network(e.to_string()))?;

        serde_json::from_str(&text).map_err(|e| JournalError::Parse(format!("{e}: {text}")))
    }
}

#[async_trait]
impl RecordSource for NasaApodSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_today(&self) -> Result<ApodRecord> {
        let response: ApodResponse = self.get(APOD_ENDPOINT).await?;
        response.try_into()
    }
}

// ============================================================================
// APOD API Response Types
// ============================================================================

/// APOD response for a single day.
#[derive(Debug, Clone, Deserialize)]
struct ApodResponse {
    date: String,
    title: String,
    explanation: String,
    url: Option<String>,
    hdurl: Option<String>,
    copyright: Option<String>,
    media_type: String,
    #[serde(default)]
    service_version: String,
}

impl TryFrom<ApodResponse> for ApodRecord {
    type Error = JournalError;

    fn try_from(resp: ApodResponse) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&resp.date, "%Y-%m-%d")
            .map_err(|e| JournalError::Parse(format!("Invalid APOD date {}: {e}", resp.date)))?;
        let media_type = resp.media_type.parse::<MediaKind>()?;

        // Interactive entries sometimes ship without a media URL.
        let url = match (resp.url, media_type) {
            (Some(url), _) => url,
            (None, MediaKind::Other) => String::new(),
            (None, _) => {
                return Err(JournalError::Parse(format!(
                    "APOD entry for {date} has no url"
                )));
            }
        };

        Ok(Self {
            date,
            title: resp.title,
            explanation: resp.explanation,
            url,
            hd_url: resp.hdurl,
            copyright: resp.copyright,
            media_type,
            service_version: resp.service_version,
        })
    }
}
