//! IP-based location detection: resolve the machine's public address to an
//! approximate coordinate pair. Uses ipapi.co - free, no API key required.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const IPAPI_URL: &str = "https://ipapi.co/json/";
const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Approximate location derived from the caller's public IP.
#[derive(Debug, Clone, Deserialize)]
pub struct IpLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub country_code: Option<String>,
}

impl IpLocation {
    /// Human-readable place name (e.g. "Seattle, US"); falls back to
    /// formatted coordinates when the lookup returned no names.
    pub fn display_name(&self) -> String {
        match (self.city.as_deref(), self.country_code.as_deref()) {
            (Some(city), Some(cc)) if !city.is_empty() && !cc.is_empty() => {
                format!("{}, {}", city, cc)
            }
            (Some(city), _) if !city.is_empty() => city.to_string(),
            _ => format!("{:.2}, {:.2}", self.latitude, self.longitude),
        }
    }
}

/// Resolve the current location from the public IP.
/// Returns `None` on failure or timeout; the caller can fall back to
/// manually entered coordinates.
pub async fn locate_by_ip() -> Option<IpLocation> {
    let client = match Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to create location client: {}", e);
            return None;
        }
    };

    let response = match client.get(IPAPI_URL).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("IP location request failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("IP location returned status {}", response.status());
        return None;
    }

    let location: IpLocation = match response.json().await {
        Ok(l) => l,
        Err(e) => {
            tracing::debug!("IP location parse error: {}", e);
            return None;
        }
    };

    tracing::info!("Located via IP: {}", location.display_name());
    Some(location)
}
