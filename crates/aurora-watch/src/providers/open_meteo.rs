use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{get_json, number_field, ProviderError, WeatherSource};
use crate::domain::WeatherSignal;

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";

const PROVIDER: &str = "open-meteo";
const CURRENT_FIELDS: &str =
    "cloud_cover,temperature_2m,visibility,relative_humidity_2m,weather_code";
/// Metres; reported when the model omits visibility.
const DEFAULT_VISIBILITY: f64 = 10_000.0;

/// Open-Meteo current-conditions forecast API. No key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSignal, ProviderError> {
        let request = self
            .http
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ]);

        let body = get_json(PROVIDER, request).await?;
        weather_from_current(&body)
    }
}

pub(crate) fn weather_from_current(body: &Value) -> Result<WeatherSignal, ProviderError> {
    let current = body
        .get("current")
        .filter(|current| current.is_object())
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER,
            detail: "missing `current` block".to_string(),
        })?;

    let field = |name: &str| current.get(name).and_then(number_field);
    let conditions = field("weather_code")
        .map(|code| weather_condition_label(code as i64))
        .unwrap_or("Unknown");

    Ok(WeatherSignal {
        cloud_coverage: field("cloud_cover").unwrap_or(0.0),
        temperature: Some(field("temperature_2m").unwrap_or(0.0)),
        visibility: Some(field("visibility").unwrap_or(DEFAULT_VISIBILITY)),
        humidity: Some(field("relative_humidity_2m").unwrap_or(0.0)),
        conditions: Some(conditions.to_string()),
        updated_at: Some(Utc::now()),
    })
}

/// WMO weather interpretation codes as reported by Open-Meteo.
pub fn weather_condition_label(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_current_block() {
        let body = json!({
            "latitude": 68.35,
            "current": {
                "time": "2026-02-01T21:00",
                "cloud_cover": 23,
                "temperature_2m": -18.4,
                "visibility": 24140.0,
                "relative_humidity_2m": 81,
                "weather_code": 1
            }
        });
        let weather = weather_from_current(&body).expect("parses");
        assert_eq!(weather.cloud_coverage, 23.0);
        assert_eq!(weather.temperature, Some(-18.4));
        assert_eq!(weather.visibility, Some(24140.0));
        assert_eq!(weather.humidity, Some(81.0));
        assert_eq!(weather.conditions.as_deref(), Some("Mainly clear"));
    }

    #[test]
    fn missing_fields_use_fallbacks() {
        let weather = weather_from_current(&json!({ "current": {} })).expect("parses");
        assert_eq!(weather.cloud_coverage, 0.0);
        assert_eq!(weather.visibility, Some(DEFAULT_VISIBILITY));
        assert_eq!(weather.conditions.as_deref(), Some("Unknown"));
    }

    #[test]
    fn missing_current_block_is_malformed() {
        let err = weather_from_current(&json!({ "error": true, "reason": "bad latitude" }))
            .expect_err("no current block");
        assert!(matches!(err, ProviderError::Malformed { .. }));
    }

    #[test]
    fn unknown_codes_have_generic_label() {
        assert_eq!(weather_condition_label(3), "Overcast");
        assert_eq!(weather_condition_label(42), "Unknown");
    }
}
