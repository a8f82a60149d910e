use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity tier attached to an AQI category, used for color-coding
/// in presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Neutral,
    Success,
    Warning,
    Danger,
}

impl Severity {
    /// Theme/color-class name for UI collaborators.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// One named AQI band with inclusive bounds.
#[derive(Debug, Clone, Copy)]
pub struct CategoryBand {
    pub name: &'static str,
    pub low: f64,
    pub high: f64,
    pub severity: Severity,
}

/// US AQI bands, ascending and contiguous. The top band is open-ended:
/// any index above 300 stays "Hazardous".
pub const AQI_CATEGORIES: &[CategoryBand] = &[
    CategoryBand { name: "Good", low: 0.0, high: 50.0, severity: Severity::Success },
    CategoryBand { name: "Moderate", low: 51.0, high: 100.0, severity: Severity::Warning },
    CategoryBand {
        name: "Unhealthy for Sensitive",
        low: 101.0,
        high: 150.0,
        severity: Severity::Warning,
    },
    CategoryBand { name: "Unhealthy", low: 151.0, high: 200.0, severity: Severity::Danger },
    CategoryBand { name: "Very Unhealthy", low: 201.0, high: 300.0, severity: Severity::Danger },
    CategoryBand { name: "Hazardous", low: 301.0, high: f64::INFINITY, severity: Severity::Danger },
];

/// Map an overall index to its category name and severity tier.
///
/// The first band whose inclusive bounds contain the index wins. Indexes
/// below every band (e.g. negative readings) keep the "No Data" default.
pub fn classify(aqi: f64) -> (&'static str, Severity) {
    AQI_CATEGORIES
        .iter()
        .find(|band| band.low <= aqi && aqi <= band.high)
        .map(|band| (band.name, band.severity))
        .unwrap_or(("No Data", Severity::Neutral))
}

/// Raw response wrapper from the upstream feed.
///
/// Nothing here is validated; `normalize` owns the interpretation of every
/// shape this can take. The fetch adapter also constructs these directly to
/// fold transport failures into the same shape as upstream logical errors.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl FeedEnvelope {
    /// Success envelope wrapping a raw payload.
    pub fn ok(data: Value) -> Self {
        Self { status: Some("ok".to_string()), data: Some(data) }
    }

    /// Failure envelope carrying a human-readable reason.
    pub fn error(reason: impl Into<String>) -> Self {
        Self { status: Some("error".to_string()), data: Some(Value::String(reason.into())) }
    }

    /// Whether the envelope carries the provider's success marker.
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}

/// Success payload, decoded only after the overall index is known to be
/// numeric. Everything but `aqi` is optional; unknown provider fields are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub aqi: f64,
    /// Station name; may carry comma-separated city/region/country segments.
    #[serde(default)]
    pub city: Option<String>,
    /// Coordinate pair. Elements are tolerated individually so one bad
    /// entry does not discard the other.
    #[serde(default)]
    pub geo: Option<Vec<Value>>,
    /// Observation time, ISO-8601.
    #[serde(default)]
    pub time: Option<String>,
    /// Per-pollutant concentrations; values may be non-numeric upstream.
    #[serde(default)]
    pub iaqi: BTreeMap<String, Value>,
    /// `dominentpol` is the provider's spelling.
    #[serde(default, rename = "dominentpol")]
    pub dominant_pollutant: Option<String>,
}

/// Fully-normalized air quality reading.
///
/// Constructed fresh on every normalization call and immutable afterwards.
/// Collaborators branch on `is_valid` and display `category_name` as the
/// diagnostic text when it is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityRecord {
    pub is_valid: bool,
    pub overall_aqi: f64,
    pub location_name: String,
    pub city: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub pollutants: BTreeMap<String, f64>,
    pub dominant_pollutant: String,
    pub category_name: String,
    pub severity: Severity,
}

impl AirQualityRecord {
    /// Invalid record carrying a diagnostic reason in `category_name`.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            overall_aqi: 0.0,
            location_name: "Error".to_string(),
            city: "Error".to_string(),
            country: "N/A".to_string(),
            latitude: None,
            longitude: None,
            timestamp: Utc::now(),
            pollutants: BTreeMap::new(),
            dominant_pollutant: "N/A".to_string(),
            category_name: reason.into(),
            severity: Severity::Neutral,
        }
    }

    /// Multi-line summary for display under the AQI card.
    pub fn summary(&self) -> String {
        let readings = self
            .pollutants
            .iter()
            .map(|(code, value)| format!("{}: {:.1}", code.to_uppercase(), value))
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "Station: {}\nUpdated: {}\nDominant: {}\nReadings: {}",
            self.location_name,
            self.timestamp.format("%Y-%m-%d %H:%M:%S %Z"),
            self.dominant_pollutant,
            readings,
        )
    }
}

/// Air quality service errors
#[derive(Debug, thiserror::Error)]
pub enum AirQualityError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_good() {
        assert_eq!(classify(0.0), ("Good", Severity::Success));
        assert_eq!(classify(50.0), ("Good", Severity::Success));
    }

    #[test]
    fn test_classify_moderate() {
        assert_eq!(classify(51.0), ("Moderate", Severity::Warning));
        assert_eq!(classify(100.0), ("Moderate", Severity::Warning));
    }

    #[test]
    fn test_classify_unhealthy_for_sensitive() {
        assert_eq!(classify(101.0), ("Unhealthy for Sensitive", Severity::Warning));
        assert_eq!(classify(150.0), ("Unhealthy for Sensitive", Severity::Warning));
    }

    #[test]
    fn test_classify_unhealthy() {
        assert_eq!(classify(151.0), ("Unhealthy", Severity::Danger));
        assert_eq!(classify(200.0), ("Unhealthy", Severity::Danger));
    }

    #[test]
    fn test_classify_very_unhealthy() {
        assert_eq!(classify(201.0), ("Very Unhealthy", Severity::Danger));
        assert_eq!(classify(300.0), ("Very Unhealthy", Severity::Danger));
    }

    #[test]
    fn test_classify_hazardous_is_open_ended() {
        assert_eq!(classify(301.0), ("Hazardous", Severity::Danger));
        assert_eq!(classify(5000.0), ("Hazardous", Severity::Danger));
        assert_eq!(classify(10000.0), ("Hazardous", Severity::Danger));
    }

    #[test]
    fn test_classify_below_scale_is_no_data() {
        assert_eq!(classify(-1.0), ("No Data", Severity::Neutral));
        assert_eq!(classify(-500.0), ("No Data", Severity::Neutral));
    }

    #[test]
    fn test_bands_are_contiguous_and_ascending() {
        for pair in AQI_CATEGORIES.windows(2) {
            assert!(pair[0].high < pair[1].low);
            assert_eq!(pair[0].high + 1.0, pair[1].low);
        }
    }

    #[test]
    fn test_severity_as_str() {
        assert_eq!(Severity::Neutral.as_str(), "neutral");
        assert_eq!(Severity::Danger.as_str(), "danger");
    }

    #[test]
    fn test_envelope_constructors() {
        let env = FeedEnvelope::ok(serde_json::json!({"aqi": 42}));
        assert!(env.is_ok());

        let env = FeedEnvelope::error("token missing");
        assert!(!env.is_ok());
        assert_eq!(env.data, Some(Value::String("token missing".to_string())));
    }

    #[test]
    fn test_invalid_record_shape() {
        let record = AirQualityRecord::invalid("boom");
        assert!(!record.is_valid);
        assert_eq!(record.overall_aqi, 0.0);
        assert!(record.pollutants.is_empty());
        assert_eq!(record.dominant_pollutant, "N/A");
        assert_eq!(record.category_name, "boom");
        assert_eq!(record.severity, Severity::Neutral);
    }

    #[test]
    fn test_summary_sorts_and_uppercases_readings() {
        let mut record = AirQualityRecord::invalid("x");
        record.location_name = "Test Station".to_string();
        record.dominant_pollutant = "PM25".to_string();
        record.pollutants.insert("pm25".to_string(), 42.0);
        record.pollutants.insert("co".to_string(), 1.55);

        let summary = record.summary();
        assert!(summary.starts_with("Station: Test Station\n"));
        assert!(summary.contains("Dominant: PM25"));
        assert!(summary.ends_with("Readings: CO: 1.6 | PM25: 42.0"));
    }
}
