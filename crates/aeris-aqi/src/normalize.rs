//! Normalization of raw feed envelopes into [`AirQualityRecord`]s.
//!
//! The upstream feed overlaps several failure shapes: explicit error status,
//! success status with a bare message string, message-only objects, and
//! partial payloads. Everything funnels through [`normalize`], which never
//! fails across its boundary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{classify, AirQualityRecord, FeedEnvelope, Observation};

/// Normalize a raw feed envelope into an [`AirQualityRecord`].
///
/// Total over every envelope shape: success, structured error, bare error
/// string, and malformed or partial payloads each map to exactly one record.
/// A decode fault inside a well-formed-looking payload becomes an invalid
/// record with a `"Parsing error: ..."` reason rather than a panic.
pub fn normalize(envelope: &FeedEnvelope) -> AirQualityRecord {
    let data = envelope.data.as_ref();

    // Anything but the success marker is an upstream failure; dig out the
    // most specific reason available.
    if !envelope.is_ok() {
        let reason = match data {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Object(fields)) => match fields.get("message") {
                Some(Value::String(message)) => message.clone(),
                _ => status_reason(envelope),
            },
            _ => status_reason(envelope),
        };
        return AirQualityRecord::invalid(reason);
    }

    // Success marker with a bare string payload: provider-level message,
    // e.g. an unrecognized station.
    if let Some(Value::String(text)) = data {
        return AirQualityRecord::invalid(text.clone());
    }

    let Some(Value::Object(fields)) = data else {
        return AirQualityRecord::invalid("Invalid data format received from API.");
    };

    // The overall index is the field that decides success. Missing or
    // mistyped means the payload is incomplete, not faulty.
    if !fields.get("aqi").is_some_and(|v| v.as_f64().is_some()) {
        let reason = match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => "Received malformed or incomplete data from API.".to_string(),
        };
        return AirQualityRecord::invalid(reason);
    }

    match observation_record(Value::Object(fields.clone())) {
        Ok(record) => record,
        Err(e) => AirQualityRecord::invalid(format!("Parsing error: {e}")),
    }
}

fn status_reason(envelope: &FeedEnvelope) -> String {
    let status = envelope.status.as_deref().unwrap_or("Unknown");
    format!("API request failed with status: {status}")
}

fn observation_record(data: Value) -> Result<AirQualityRecord, serde_json::Error> {
    let obs: Observation = serde_json::from_value(data)?;

    let location_name = obs.city.unwrap_or_else(|| "N/A".to_string());
    let (city, country) = split_location(&location_name);
    let (latitude, longitude) = coordinates(obs.geo.as_deref());

    let timestamp = obs
        .time
        .as_deref()
        .and_then(|iso| DateTime::parse_from_rfc3339(iso).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let pollutants: BTreeMap<String, f64> = obs
        .iaqi
        .into_iter()
        .filter_map(|(code, value)| value.as_f64().map(|v| (code, v)))
        .collect();

    let dominant_pollutant = match obs.dominant_pollutant.as_deref() {
        Some(code) if !code.is_empty() => code.to_uppercase(),
        _ => "N/A".to_string(),
    };

    let (category_name, severity) = classify(obs.aqi);

    Ok(AirQualityRecord {
        is_valid: true,
        overall_aqi: obs.aqi,
        location_name,
        city,
        country,
        latitude,
        longitude,
        timestamp,
        pollutants,
        dominant_pollutant,
        category_name: category_name.to_string(),
        severity,
    })
}

/// Split "City, Region, CC" into the city (first segment) and the country
/// (last segment, only when more than one segment exists).
fn split_location(name: &str) -> (String, String) {
    let segments: Vec<&str> = name.split(',').map(str::trim).collect();
    let city = match segments.first() {
        Some(first) if !first.is_empty() => (*first).to_string(),
        _ => "N/A".to_string(),
    };
    let country = match segments.last() {
        Some(last) if segments.len() > 1 && !last.is_empty() => (*last).to_string(),
        _ => "N/A".to_string(),
    };
    (city, country)
}

/// First and second geo elements, kept only when they are finite numbers.
/// A legitimate 0.0 coordinate is preserved; only absent or non-numeric
/// entries map to `None`.
fn coordinates(geo: Option<&[Value]>) -> (Option<f64>, Option<f64>) {
    let finite = |idx: usize| {
        geo.and_then(|pair| pair.get(idx))
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    };
    (finite(0), finite(1))
}
