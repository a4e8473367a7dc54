use crate::infra::AppState;
use aurora_watch::alerts::{alert_router, AlertRunService, NotificationSink, SubscriptionRepository};
use aurora_watch::domain::{
    AirQualitySignal, AuroraSignal, Location, LocationError, LocationId, Signal, WeatherSignal,
};
use aurora_watch::error::AppError;
use aurora_watch::providers::{aqi_category, NEUTRAL_AQI};
use aurora_watch::scoring::Score;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) location: Location,
    #[serde(default)]
    pub(crate) aurora: Option<AuroraSignal>,
    #[serde(default)]
    pub(crate) weather: Option<WeatherSignal>,
    #[serde(default)]
    pub(crate) air_quality: Option<AirQualitySignal>,
    #[serde(default)]
    pub(crate) at: Option<DateTime<Utc>>,
    /// Fetch any signal not supplied in the request.
    #[serde(default)]
    pub(crate) live: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) location_id: LocationId,
    pub(crate) scored_at: DateTime<Utc>,
    #[serde(flatten)]
    pub(crate) score: Score,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct Coordinates {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
}

impl Coordinates {
    fn validate(self) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(LocationError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(LocationError::LongitudeOutOfRange(self.lon));
        }
        Ok(self)
    }
}

pub(crate) fn with_application_routes<R, N>(
    service: Arc<AlertRunService<R, N>>,
    cron_secret: Option<String>,
) -> axum::Router
where
    R: SubscriptionRepository + 'static,
    N: NotificationSink + 'static,
{
    alert_router(service, cron_secret)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/score", axum::routing::post(score_endpoint))
        .route("/api/v1/aurora", axum::routing::get(aurora_endpoint))
        .route("/api/v1/weather", axum::routing::get(weather_endpoint))
        .route(
            "/api/v1/air-quality",
            axum::routing::get(air_quality_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn score_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let ScoreRequest {
        location,
        aurora,
        weather,
        air_quality,
        at,
        live,
    } = payload;
    location.validate()?;

    let (latitude, longitude) = (location.latitude, location.longitude);
    let providers = &state.providers;
    let (aurora, weather, air_quality) = tokio::join!(
        async {
            match aurora {
                Some(signal) => Signal::Present(signal),
                None if live => providers.current_aurora().await,
                None => Signal::Absent,
            }
        },
        async {
            match weather {
                Some(signal) => Signal::Present(signal),
                None if live => providers.weather_at(latitude, longitude).await,
                None => Signal::Absent,
            }
        },
        async {
            match air_quality {
                Some(signal) => Signal::Present(signal),
                None if live => providers.air_quality_at(latitude, longitude).await,
                None => Signal::Absent,
            }
        },
    );

    let scored_at = at.unwrap_or_else(Utc::now);
    let score = state
        .engine
        .score(&location, &aurora, &weather, &air_quality, scored_at);

    Ok(Json(ScoreResponse {
        location_id: location.id,
        scored_at,
        score,
    }))
}

pub(crate) async fn aurora_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<AuroraSignal>, AppError> {
    let signal = state.providers.try_aurora().await?;
    Ok(Json(signal))
}

pub(crate) async fn weather_endpoint(
    Extension(state): Extension<AppState>,
    Query(coordinates): Query<Coordinates>,
) -> Result<Json<WeatherSignal>, AppError> {
    let Coordinates { lat, lon } = coordinates.validate()?;
    let signal = state.providers.try_weather_at(lat, lon).await?;
    Ok(Json(signal))
}

/// Never fails upstream: an unavailable feed reports the neutral index.
pub(crate) async fn air_quality_endpoint(
    Extension(state): Extension<AppState>,
    Query(coordinates): Query<Coordinates>,
) -> Result<Json<AirQualitySignal>, AppError> {
    let Coordinates { lat, lon } = coordinates.validate()?;
    let signal = state
        .providers
        .air_quality_at(lat, lon)
        .await
        .into_option()
        .unwrap_or_else(|| AirQualitySignal {
            category: Some(aqi_category(NEUTRAL_AQI).to_string()),
            ..AirQualitySignal::with_aqi(NEUTRAL_AQI)
        });
    Ok(Json(signal))
}
