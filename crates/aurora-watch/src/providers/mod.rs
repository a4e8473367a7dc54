//! Upstream signal sources and the timeout policy that turns their failures into absent signals.

mod noaa;
mod open_meteo;
mod openaq;

pub use noaa::{NoaaSwpcClient, FORECAST_PERIODS, NOAA_SWPC_BASE_URL};
pub use open_meteo::{weather_condition_label, OpenMeteoClient, OPEN_METEO_BASE_URL};
pub use openaq::{aqi_category, pm25_to_aqi, OpenAqClient, NEUTRAL_AQI, OPENAQ_BASE_URL};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::ProviderConfig;
use crate::domain::{AirQualitySignal, AuroraSignal, Signal, WeatherSignal};

/// Planetary geomagnetic activity feed.
#[async_trait]
pub trait AuroraSource: Send + Sync {
    async fn fetch_current(&self) -> Result<AuroraSignal, ProviderError>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSignal, ProviderError>;
}

#[async_trait]
pub trait AirQualitySource: Send + Sync {
    async fn fetch_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AirQualitySignal, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} responded with status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("{provider} payload malformed: {detail}")]
    Malformed {
        provider: &'static str,
        detail: String,
    },
    #[error("{provider} did not respond within {timeout_ms}ms")]
    Timeout {
        provider: &'static str,
        timeout_ms: u64,
    },
}

/// Bounds a fetch by `timeout`, reporting expiry as [`ProviderError::Timeout`].
pub async fn fetch_within<T, F>(
    provider: &'static str,
    timeout: Duration,
    fetch: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(timeout, fetch).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider,
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Resolves a fetch into a signal, treating errors and timeouts as absence.
pub async fn fetch_signal<T, F>(provider: &'static str, timeout: Duration, fetch: F) -> Signal<T>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match fetch_within(provider, timeout, fetch).await {
        Ok(signal) => Signal::Present(signal),
        Err(err) => {
            warn!(provider, error = %err, "signal unavailable");
            Signal::Absent
        }
    }
}

/// The three upstream sources plus the per-fetch time bound.
#[derive(Clone)]
pub struct SignalProviders {
    aurora: Arc<dyn AuroraSource>,
    weather: Arc<dyn WeatherSource>,
    air_quality: Arc<dyn AirQualitySource>,
    fetch_timeout: Duration,
}

impl SignalProviders {
    pub fn new(
        aurora: Arc<dyn AuroraSource>,
        weather: Arc<dyn WeatherSource>,
        air_quality: Arc<dyn AirQualitySource>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            aurora,
            weather,
            air_quality,
            fetch_timeout,
        }
    }

    /// Public NOAA SWPC, Open-Meteo and OpenAQ clients sharing one HTTP connection pool.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(concat!("aurora-watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ProviderError::Http {
                provider: "http-client",
                source,
            })?;

        Ok(Self::new(
            Arc::new(NoaaSwpcClient::new(http.clone(), &config.noaa_base_url)),
            Arc::new(OpenMeteoClient::new(http.clone(), &config.open_meteo_base_url)),
            Arc::new(OpenAqClient::new(http, &config.openaq_base_url)),
            config.fetch_timeout,
        ))
    }

    pub async fn current_aurora(&self) -> Signal<AuroraSignal> {
        fetch_signal("aurora", self.fetch_timeout, self.aurora.fetch_current()).await
    }

    pub async fn weather_at(&self, latitude: f64, longitude: f64) -> Signal<WeatherSignal> {
        fetch_signal(
            "weather",
            self.fetch_timeout,
            self.weather.fetch_weather(latitude, longitude),
        )
        .await
    }

    pub async fn air_quality_at(&self, latitude: f64, longitude: f64) -> Signal<AirQualitySignal> {
        fetch_signal(
            "air-quality",
            self.fetch_timeout,
            self.air_quality.fetch_air_quality(latitude, longitude),
        )
        .await
    }

    /// Like [`Self::current_aurora`] but keeps the failure for callers that report it.
    pub async fn try_aurora(&self) -> Result<AuroraSignal, ProviderError> {
        fetch_within("aurora", self.fetch_timeout, self.aurora.fetch_current()).await
    }

    pub async fn try_weather_at(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSignal, ProviderError> {
        fetch_within(
            "weather",
            self.fetch_timeout,
            self.weather.fetch_weather(latitude, longitude),
        )
        .await
    }
}

pub(crate) async fn get_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|source| ProviderError::Http { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|source| ProviderError::Http { provider, source })
}

/// Accepts numbers and numeric strings; upstream feeds mix both.
pub(crate) fn number_field(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}
