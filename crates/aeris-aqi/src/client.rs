//! Upstream fetch adapter for the air quality feed.

use std::time::Duration;

use tracing::instrument;

use crate::normalize::normalize;
use crate::types::{AirQualityError, AirQualityRecord, FeedEnvelope};

const FEED_API_BASE: &str = "https://api.waqi.info/feed";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the upstream air quality feed.
///
/// Transport and HTTP failures never cross this boundary: they are folded
/// into the same envelope shape as upstream logical errors, so callers hand
/// everything to [`normalize`] and branch on the record's validity.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl FeedClient {
    /// Build a client against the production feed endpoint.
    pub fn new(token: Option<String>) -> Result<Self, AirQualityError> {
        Self::with_base_url(token, FEED_API_BASE)
    }

    /// Build a client from application configuration.
    pub fn from_config(feed: &aeris_core::FeedConfig) -> Result<Self, AirQualityError> {
        Self::with_base_url(feed.api_token.clone(), feed.api_url.clone())
    }

    /// Build a client against an arbitrary base URL. Tests point this at a
    /// mock server.
    pub fn with_base_url(
        token: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AirQualityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, token, base_url: base_url.into() })
    }

    /// Fetch the latest raw reading near a coordinate pair.
    ///
    /// Returns the decoded body verbatim on success; no validation happens
    /// here. A missing token short-circuits without touching the network.
    #[instrument(skip(self), level = "info")]
    pub async fn latest_by_coords(&self, lat: f64, lon: f64) -> FeedEnvelope {
        let Some(token) = self.token.as_deref() else {
            return FeedEnvelope::error("Air quality API token not provided");
        };

        let url = format!("{}/geo:{};{}/?token={}", self.base_url, lat, lon, token);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Feed request failed: {}", e);
                return FeedEnvelope::error(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            // The provider ships a structured error body with some non-2xx
            // statuses; prefer its reason over the bare code.
            return match response.json::<FeedEnvelope>().await {
                Ok(body) if !body.is_ok() => body,
                _ => FeedEnvelope::error(format!("HTTP error! status: {}", status.as_u16())),
            };
        }

        match response.json::<FeedEnvelope>().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Feed response decode failed: {}", e);
                FeedEnvelope::error(e.to_string())
            }
        }
    }

    /// Fetch and normalize in one step.
    #[instrument(skip(self), level = "info")]
    pub async fn latest_record(&self, lat: f64, lon: f64) -> AirQualityRecord {
        normalize(&self.latest_by_coords(lat, lon).await)
    }
}
