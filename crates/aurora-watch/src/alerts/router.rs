use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::notifier::NotificationSink;
use super::repository::SubscriptionRepository;
use super::service::{AlertRunError, AlertRunService};

pub(crate) struct AlertRouteState<R, N> {
    pub(crate) service: Arc<AlertRunService<R, N>>,
    pub(crate) cron_secret: Option<Arc<str>>,
}

impl<R, N> Clone for AlertRouteState<R, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cron_secret: self.cron_secret.clone(),
        }
    }
}

/// Router exposing the scheduler-triggered alert run.
pub fn alert_router<R, N>(
    service: Arc<AlertRunService<R, N>>,
    cron_secret: Option<String>,
) -> Router
where
    R: SubscriptionRepository + 'static,
    N: NotificationSink + 'static,
{
    let state = AlertRouteState {
        service,
        cron_secret: cron_secret.map(Arc::from),
    };
    Router::new()
        .route("/api/v1/alerts/run", post(run_handler::<R, N>))
        .with_state(state)
}

/// Bearer check against the shared scheduler secret. An unset secret rejects everything.
pub(crate) fn authorize(headers: &HeaderMap, secret: Option<&str>) -> Result<(), AlertRunError> {
    let Some(secret) = secret else {
        warn!("alert run requested but CRON_SECRET is not configured");
        return Err(AlertRunError::Unauthorized);
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == secret => Ok(()),
        _ => Err(AlertRunError::Unauthorized),
    }
}

pub(crate) async fn run_handler<R, N>(
    State(state): State<AlertRouteState<R, N>>,
    headers: HeaderMap,
) -> Response
where
    R: SubscriptionRepository + 'static,
    N: NotificationSink + 'static,
{
    if let Err(err) = authorize(&headers, state.cron_secret.as_deref()) {
        return error_response(err);
    }

    match state.service.run(Utc::now()).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AlertRunError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (err.status_code(), axum::Json(payload)).into_response()
}
