use async_trait::async_trait;
use aurora_watch::alerts::{
    AlertSubscription, DispatchSettings, Notification, NotificationSink, NotifyError,
    RepositoryError, Subscriber, SubscriptionRecord, SubscriptionRepository,
};
use aurora_watch::config::{parse_reference_epoch, AppConfig};
use aurora_watch::domain::{Location, LocationId};
use aurora_watch::error::AppError;
use aurora_watch::providers::SignalProviders;
use aurora_watch::scoring::{AlertThresholds, ScoringEngine};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

const BUNDLED_SEED: &str = include_str!("../seed/locations.json");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<ScoringEngine>,
    pub(crate) providers: SignalProviders,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SeedProfile {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) display_name: Option<String>,
}

/// Locations, user profiles and saved locations loaded from a JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SeedData {
    #[serde(default)]
    pub(crate) locations: Vec<Location>,
    #[serde(default)]
    pub(crate) profiles: Vec<SeedProfile>,
    #[serde(default)]
    pub(crate) saved_locations: Vec<AlertSubscription>,
}

/// Reads the seed at `path`, or the bundled catalogue when no path is given.
pub(crate) fn load_seed(path: Option<&Path>) -> Result<SeedData, AppError> {
    let seed: SeedData = match path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::from_str(BUNDLED_SEED)?,
    };

    for location in &seed.locations {
        location.validate()?;
    }
    Ok(seed)
}

/// Read-only view over the seed; the data is fixed for the life of the process.
#[derive(Default, Clone)]
pub(crate) struct InMemorySubscriptionStore {
    seed: Arc<SeedData>,
}

impl InMemorySubscriptionStore {
    pub(crate) fn from_seed(seed: SeedData) -> Self {
        Self {
            seed: Arc::new(seed),
        }
    }
}

impl SubscriptionRepository for InMemorySubscriptionStore {
    fn alert_enabled_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError> {
        let seed = self.seed.as_ref();

        let locations: HashMap<&LocationId, &Location> = seed
            .locations
            .iter()
            .map(|location| (&location.id, location))
            .collect();
        let profiles: HashMap<&str, &SeedProfile> = seed
            .profiles
            .iter()
            .map(|profile| (profile.id.as_str(), profile))
            .collect();

        Ok(seed
            .saved_locations
            .iter()
            .filter(|saved| saved.alert_enabled)
            .map(|saved| SubscriptionRecord {
                subscription: saved.clone(),
                subscriber: profiles
                    .get(saved.user_id.as_str())
                    .map(|profile| Subscriber {
                        email: profile.email.clone(),
                        display_name: profile.display_name.clone(),
                    }),
                location: locations.get(&saved.location_id).map(|&location| location.clone()),
            })
            .collect())
    }
}

/// Sink that logs alerts instead of delivering them.
#[derive(Default, Clone)]
pub(crate) struct DryRunNotifier {
    outbox: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl NotificationSink for DryRunNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "dry run: alert not delivered"
        );
        self.outbox
            .lock()
            .expect("outbox mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

impl DryRunNotifier {
    pub(crate) fn outbox(&self) -> Vec<Notification> {
        self.outbox.lock().expect("outbox mutex poisoned").clone()
    }
}

pub(crate) fn dispatch_settings(config: &AppConfig) -> DispatchSettings {
    DispatchSettings {
        max_concurrency: config.providers.max_concurrency,
        thresholds: AlertThresholds::default(),
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_reference_epoch(raw)
        .map_err(|_| format!("failed to parse '{raw}' as an RFC 3339 timestamp or YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_seed_is_valid() {
        let seed = load_seed(None).expect("bundled seed loads");
        assert!(seed.locations.len() >= 5);
        assert!(seed
            .locations
            .iter()
            .any(|location| location.id == LocationId("abisko".to_string())));
    }

    #[test]
    fn store_joins_only_alert_enabled_locations() {
        let seed = load_seed(None).expect("bundled seed loads");
        let disabled = seed
            .saved_locations
            .iter()
            .filter(|saved| !saved.alert_enabled)
            .count();
        let total = seed.saved_locations.len();
        let store = InMemorySubscriptionStore::from_seed(seed);

        let records = store.alert_enabled_subscriptions().expect("store readable");

        assert_eq!(records.len(), total - disabled);
        assert!(records
            .iter()
            .all(|record| record.subscription.alert_enabled));
        assert!(records.iter().all(|record| record.location.is_some()));
    }

    #[test]
    fn store_leaves_missing_joins_empty() {
        let store = InMemorySubscriptionStore::from_seed(SeedData {
            locations: Vec::new(),
            profiles: Vec::new(),
            saved_locations: vec![AlertSubscription {
                id: "sl-1".to_string(),
                user_id: "ghost".to_string(),
                location_id: LocationId("nowhere".to_string()),
                alert_enabled: true,
                alert_min_kp: 5,
                notes: None,
            }],
        });

        let records = store.alert_enabled_subscriptions().expect("store readable");

        assert_eq!(records.len(), 1);
        assert!(records[0].location.is_none());
        assert!(records[0].subscriber.is_none());
    }

    #[test]
    fn store_clones_read_one_seed_concurrently() {
        let store = InMemorySubscriptionStore::from_seed(load_seed(None).expect("seed loads"));
        let expected = store
            .alert_enabled_subscriptions()
            .expect("store readable")
            .len();

        let clones: Vec<_> = (0..4).map(|_| store.clone()).collect();
        assert!(clones
            .iter()
            .all(|clone| Arc::ptr_eq(&clone.seed, &store.seed)));

        std::thread::scope(|scope| {
            let readers: Vec<_> = clones
                .iter()
                .map(|clone| scope.spawn(move || clone.alert_enabled_subscriptions()))
                .collect();
            for reader in readers {
                let records = reader
                    .join()
                    .expect("reader thread")
                    .expect("store readable");
                assert_eq!(records.len(), expected);
            }
        });
    }

    #[test]
    fn timestamps_accept_dates_and_rfc3339() {
        assert!(parse_timestamp("2026-02-14").is_ok());
        assert!(parse_timestamp("2026-02-14T21:00:00+01:00").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn dry_run_notifier_records_instead_of_sending() {
        let notifier = DryRunNotifier::default();
        let notification = Notification {
            recipient: "sky@example.com".to_string(),
            subject: "Aurora alert for Abisko: Kp 6".to_string(),
            body: "Hi there,".to_string(),
        };
        notifier.send(&notification).await.expect("dry run never fails");
        assert_eq!(notifier.outbox(), vec![notification]);
    }
}
