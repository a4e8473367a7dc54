use crate::alerts::{AlertRunError, NotifyError};
use crate::config::ConfigError;
use crate::domain::LocationError;
use crate::providers::ProviderError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Seed(serde_json::Error),
    Provider(ProviderError),
    InvalidLocation(LocationError),
    AlertRun(AlertRunError),
    Notify(NotifyError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Seed(err) => write!(f, "seed data error: {}", err),
            AppError::Provider(err) => write!(f, "signal provider error: {}", err),
            AppError::InvalidLocation(err) => write!(f, "invalid location: {}", err),
            AppError::AlertRun(err) => write!(f, "alert run failed: {}", err),
            AppError::Notify(err) => write!(f, "notification transport error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Seed(err) => Some(err),
            AppError::Provider(err) => Some(err),
            AppError::InvalidLocation(err) => Some(err),
            AppError::AlertRun(err) => Some(err),
            AppError::Notify(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidLocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::AlertRun(err) => err.status_code(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Seed(_)
            | AppError::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Seed(value)
    }
}

impl From<ProviderError> for AppError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

impl From<LocationError> for AppError {
    fn from(value: LocationError) -> Self {
        Self::InvalidLocation(value)
    }
}

impl From<AlertRunError> for AppError {
    fn from(value: AlertRunError) -> Self {
        Self::AlertRun(value)
    }
}

impl From<NotifyError> for AppError {
    fn from(value: NotifyError) -> Self {
        Self::Notify(value)
    }
}
