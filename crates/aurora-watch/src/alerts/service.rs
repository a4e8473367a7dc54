use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use tracing::info;

use super::notifier::{NotificationSink, NotifyError};
use super::orchestrator::{AlertOrchestrator, AlertRunSummary, DispatchSettings};
use super::repository::{RepositoryError, SubscriptionRepository};
use crate::providers::SignalProviders;
use crate::scoring::ScoringEngine;

/// Service composing the subscription store, signal providers and notification transport.
pub struct AlertRunService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    providers: SignalProviders,
    orchestrator: AlertOrchestrator<N>,
}

impl<R, N> AlertRunService<R, N>
where
    R: SubscriptionRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        providers: SignalProviders,
        engine: Arc<ScoringEngine>,
        settings: DispatchSettings,
    ) -> Self {
        let orchestrator =
            AlertOrchestrator::new(engine, providers.clone(), notifier.clone(), settings);
        Self {
            repository,
            notifier,
            providers,
            orchestrator,
        }
    }

    /// Executes one alert run.
    ///
    /// Transport credentials are checked before the store is read. The geomagnetic signal is
    /// fetched once and shared by every subscription.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<AlertRunSummary, AlertRunError> {
        self.notifier
            .ready()
            .map_err(AlertRunError::MissingTransportCredentials)?;

        let records = self.repository.alert_enabled_subscriptions()?;
        if records.is_empty() {
            info!("no alert-enabled subscriptions");
            return Ok(AlertRunSummary::default());
        }

        let aurora = self.providers.current_aurora().await;
        let summary = self.orchestrator.dispatch(&records, &aurora, now).await;

        info!(
            subscriptions = records.len(),
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "alert run complete"
        );
        Ok(summary)
    }
}

/// Error raised before or while starting an alert run.
#[derive(Debug, thiserror::Error)]
pub enum AlertRunError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("notification transport not configured: {0}")]
    MissingTransportCredentials(#[source] NotifyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AlertRunError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AlertRunError::Unauthorized => StatusCode::UNAUTHORIZED,
            AlertRunError::MissingTransportCredentials(_) | AlertRunError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
