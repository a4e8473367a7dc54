use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::message::compose_alert;
use super::notifier::NotificationSink;
use super::repository::SubscriptionRecord;
use crate::domain::{AuroraSignal, Signal};
use crate::providers::SignalProviders;
use crate::scoring::{AlertThresholds, ScoringEngine, UNKNOWN_CLOUD_COVERAGE};

/// Fan-out bound and eligibility thresholds for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchSettings {
    pub max_concurrency: usize,
    pub thresholds: AlertThresholds,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: crate::config::DEFAULT_MAX_CONCURRENCY,
            thresholds: AlertThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Location or subscriber contact could not be joined.
    Unresolved,
    BelowSubscriberKp,
    ConditionsUnfavourable,
}

/// What happened to a single subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Sent,
    Skipped(SkipReason),
    Failed(String),
}

/// Aggregate counts for an alert run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRunSummary {
    pub sent: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl AlertRunSummary {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = SubscriptionOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome {
                    SubscriptionOutcome::Sent => summary.sent += 1,
                    SubscriptionOutcome::Skipped(_) => summary.skipped += 1,
                    SubscriptionOutcome::Failed(error) => summary.errors.push(error),
                }
                summary
            })
    }

    pub fn processed(&self) -> usize {
        self.sent + self.skipped + self.errors.len()
    }
}

/// Scores every subscription against live conditions and notifies the eligible ones.
pub struct AlertOrchestrator<N> {
    engine: Arc<ScoringEngine>,
    providers: SignalProviders,
    notifier: Arc<N>,
    settings: DispatchSettings,
}

impl<N> AlertOrchestrator<N>
where
    N: NotificationSink + 'static,
{
    pub fn new(
        engine: Arc<ScoringEngine>,
        providers: SignalProviders,
        notifier: Arc<N>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            engine,
            providers,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Processes subscriptions with at most `max_concurrency` in flight.
    ///
    /// Units never share mutable state; outcomes are collected first and reduced afterwards.
    /// Disabled subscriptions are ignored and do not count towards the summary.
    pub async fn dispatch(
        &self,
        records: &[SubscriptionRecord],
        aurora: &Signal<AuroraSignal>,
        now: DateTime<Utc>,
    ) -> AlertRunSummary {
        let pending: Vec<_> = records
            .iter()
            .filter(|record| record.subscription.alert_enabled)
            .map(|record| self.evaluate(record, aurora, now))
            .collect();

        let outcomes: Vec<SubscriptionOutcome> = stream::iter(pending)
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        AlertRunSummary::from_outcomes(outcomes)
    }

    /// Runs the full check-and-notify sequence for one subscription.
    pub async fn evaluate(
        &self,
        record: &SubscriptionRecord,
        aurora: &Signal<AuroraSignal>,
        now: DateTime<Utc>,
    ) -> SubscriptionOutcome {
        let subscription_id = record.subscription.id.as_str();
        let Some(resolved) = record.resolve() else {
            debug!(subscription_id, "skipping subscription with missing location or contact");
            return SubscriptionOutcome::Skipped(SkipReason::Unresolved);
        };
        let location = resolved.location;

        let (weather, air_quality) = tokio::join!(
            self.providers
                .weather_at(location.latitude, location.longitude),
            self.providers
                .air_quality_at(location.latitude, location.longitude),
        );
        let score = self
            .engine
            .score(location, aurora, &weather, &air_quality, now);

        let kp_index = aurora.present().map_or(0.0, |signal| signal.kp_index);
        if kp_index < f64::from(resolved.alert_min_kp) {
            return SubscriptionOutcome::Skipped(SkipReason::BelowSubscriberKp);
        }

        let cloud_coverage = weather
            .present()
            .map_or(UNKNOWN_CLOUD_COVERAGE, |signal| signal.cloud_coverage);
        if !self
            .settings
            .thresholds
            .permits(score.total_score, kp_index, cloud_coverage)
        {
            return SubscriptionOutcome::Skipped(SkipReason::ConditionsUnfavourable);
        }

        let notification = compose_alert(&resolved, &score, kp_index, cloud_coverage);
        match self.notifier.send(&notification).await {
            Ok(()) => {
                info!(
                    subscription_id,
                    location = %location.id.0,
                    total_score = score.total_score,
                    kp_index,
                    "aurora alert sent"
                );
                SubscriptionOutcome::Sent
            }
            Err(err) => {
                warn!(subscription_id, error = %err, "aurora alert delivery failed");
                SubscriptionOutcome::Failed(format!(
                    "Failed to send to {}: {}",
                    resolved.recipient, err
                ))
            }
        }
    }
}
