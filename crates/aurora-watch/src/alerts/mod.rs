//! Scheduled aurora alerts.
//!
//! An alert run loads every alert-enabled subscription, fetches the geomagnetic signal once,
//! then scores each subscribed location against live weather and air quality with a bounded
//! fan-out. Subscribers whose location clears both their own Kp floor and the standard alert
//! thresholds are notified through a [`NotificationSink`].

mod message;
pub mod notifier;
pub mod orchestrator;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use message::compose_alert;
pub use notifier::{Notification, NotificationSink, NotifyError, ResendEmailSink, RESEND_ENDPOINT};
pub use orchestrator::{
    AlertOrchestrator, AlertRunSummary, DispatchSettings, SkipReason, SubscriptionOutcome,
};
pub use repository::{
    AlertSubscription, RepositoryError, ResolvedSubscription, Subscriber, SubscriptionRecord,
    SubscriptionRepository, DEFAULT_ALERT_MIN_KP,
};
pub use router::alert_router;
pub use service::{AlertRunError, AlertRunService};
