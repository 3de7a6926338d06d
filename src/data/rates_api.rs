//! open.er-api.com exchange rate client
//!
//! Fetches the latest rates for one base currency and parses them into a
//! [`RateSet`]. The [`RateSource`] trait is the seam the refresh cycle uses,
//! so tests can substitute canned rate sets.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::{retain_valid_rates, RateSet};

/// Base URL for the open exchange rate API
pub const DEFAULT_BASE_URL: &str = "https://open.er-api.com/v6/latest";

/// Request timeout used unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching rates from upstream
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Rate API returned HTTP {status} for {anchor}")]
    Status { anchor: String, status: u16 },

    /// Server answered but reported an error in the body
    #[error("Rate API error for {anchor}: {message}")]
    Api { anchor: String, message: String },

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can produce the rate set for an anchor currency
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the rates of every currency against `anchor`.
    async fn fetch_rates(&self, anchor: &str) -> Result<RateSet, FetchError>;
}

/// Response body of the `/latest/{code}` endpoint
#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    base_code: Option<String>,
    rates: Option<IndexMap<String, f64>>,
    time_last_update_unix: Option<i64>,
}

/// Client for the open.er-api.com latest-rates endpoint
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    client: Client,
    base_url: String,
}

impl Default for ExchangeRateClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeRateClient {
    /// Creates a client against the public API with the default timeout
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (mirrors, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Replaces the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rates_url(&self, anchor: &str) -> String {
        format!("{}/{}", self.base_url, anchor)
    }

    /// Parses a response body into the rate set for `anchor`
    fn parse_response(anchor: &str, body: &str) -> Result<RateSet, FetchError> {
        let response: ApiResponse = serde_json::from_str(body)?;

        if response.result != "success" {
            return Err(FetchError::Api {
                anchor: anchor.to_string(),
                message: response
                    .error_type
                    .unwrap_or_else(|| format!("result '{}'", response.result)),
            });
        }

        if let Some(base) = response.base_code.as_deref() {
            if base != anchor {
                warn!(anchor, base, "rate API answered with a different base currency");
            }
        }

        let mut rates = response
            .rates
            .ok_or_else(|| FetchError::MissingField("rates".to_string()))?;
        retain_valid_rates(anchor, &mut rates);

        let last_updated = response
            .time_last_update_unix
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Ok(RateSet::new(anchor, rates).with_last_updated(last_updated))
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn fetch_rates(&self, anchor: &str) -> Result<RateSet, FetchError> {
        let url = self.rates_url(anchor);
        debug!(%url, "fetching rates");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                anchor: anchor.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Self::parse_response(anchor, &text)
    }
}

fn build_client(timeout: Duration) -> Client {
    match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, ?timeout, "cannot build HTTP client; using defaults without timeout");
            Client::new()
        }
    }
}
