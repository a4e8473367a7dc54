use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{get_json, number_field, AirQualitySource, ProviderError};
use crate::domain::AirQualitySignal;

pub const OPENAQ_BASE_URL: &str = "https://api.openaq.org";
/// Reported when no monitoring station is within range.
pub const NEUTRAL_AQI: f64 = 50.0;

const PROVIDER: &str = "openaq";
const SEARCH_RADIUS_METRES: u32 = 50_000;

/// (pm2.5 low, pm2.5 high, aqi at band low, aqi span) above the 12 µg/m³ "good" band.
const PM25_BANDS: [(f64, f64, f64, f64); 5] = [
    (12.1, 35.4, 51.0, 49.0),
    (35.5, 55.4, 101.0, 49.0),
    (55.5, 150.4, 151.0, 49.0),
    (150.5, 250.4, 201.0, 99.0),
    (250.5, 500.4, 301.0, 199.0),
];

/// OpenAQ latest-measurement search around a coordinate.
#[derive(Debug, Clone)]
pub struct OpenAqClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenAqClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AirQualitySource for OpenAqClient {
    async fn fetch_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirQualitySignal, ProviderError> {
        let request = self
            .http
            .get(format!("{}/v2/latest", self.base_url))
            .query(&[
                ("coordinates", format!("{latitude},{longitude}")),
                ("radius", SEARCH_RADIUS_METRES.to_string()),
                ("limit", "1".to_string()),
            ]);

        let body = get_json(PROVIDER, request).await?;
        Ok(air_quality_from_latest(&body))
    }
}

/// A reachable feed with no nearby station is not an outage, so it maps to the neutral AQI.
pub(crate) fn air_quality_from_latest(body: &Value) -> AirQualitySignal {
    let pm25 = body
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(|station| station.get("measurements"))
        .and_then(Value::as_array)
        .and_then(|measurements| {
            measurements
                .iter()
                .find(|m| m.get("parameter").and_then(Value::as_str) == Some("pm25"))
        })
        .and_then(|measurement| measurement.get("value"))
        .and_then(number_field)
        .filter(|value| *value > 0.0);

    let aqi = pm25.map_or(NEUTRAL_AQI, pm25_to_aqi).round();

    AirQualitySignal {
        aqi,
        pm25,
        category: Some(aqi_category(aqi).to_string()),
        updated_at: Some(Utc::now()),
    }
}

/// Simplified EPA PM2.5 to AQI conversion, linear within each breakpoint band.
pub fn pm25_to_aqi(pm25: f64) -> f64 {
    if pm25 <= 12.0 {
        return pm25 / 12.0 * 50.0;
    }
    let (low, high, aqi_low, span) = PM25_BANDS
        .iter()
        .copied()
        .find(|(_, high, ..)| pm25 <= *high)
        .unwrap_or(PM25_BANDS[PM25_BANDS.len() - 1]);

    (pm25 - low) / (high - low) * span + aqi_low
}

pub fn aqi_category(aqi: f64) -> &'static str {
    if aqi > 300.0 {
        "Hazardous"
    } else if aqi > 200.0 {
        "Very Unhealthy"
    } else if aqi > 150.0 {
        "Unhealthy"
    } else if aqi > 100.0 {
        "Unhealthy for Sensitive Groups"
    } else if aqi > 50.0 {
        "Moderate"
    } else {
        "Good"
    }
}
