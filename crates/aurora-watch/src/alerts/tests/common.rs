use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::alerts::notifier::{Notification, NotificationSink, NotifyError};
use crate::alerts::orchestrator::DispatchSettings;
use crate::alerts::repository::{
    AlertSubscription, RepositoryError, Subscriber, SubscriptionRecord, SubscriptionRepository,
};
use crate::alerts::service::AlertRunService;
use crate::domain::{
    Accessibility, AirQualitySignal, AuroraSignal, Location, LocationId, Tier, WeatherSignal,
};
use crate::providers::{
    AirQualitySource, AuroraSource, ProviderError, SignalProviders, WeatherSource,
};
use crate::scoring::ScoringEngine;

pub(super) fn abisko() -> Location {
    Location {
        id: LocationId("abisko".to_string()),
        name: "Abisko".to_string(),
        description: Some("Lake Torneträsk shoreline".to_string()),
        latitude: 66.0,
        longitude: 18.8,
        country: "Sweden".to_string(),
        region: Some("Lapland".to_string()),
        tier: Tier::Primary,
        bortle_scale: Some(2),
        accessibility: Accessibility::Easy,
        amenities: BTreeMap::new(),
        best_months: vec![1, 2, 3, 9, 10, 11, 12],
        nearby_city: Some("Kiruna".to_string()),
        nearby_airport: Some("KRN".to_string()),
    }
}

pub(super) fn subscription(id: &str, alert_min_kp: i32) -> AlertSubscription {
    AlertSubscription {
        id: id.to_string(),
        user_id: format!("user-{id}"),
        location_id: LocationId("abisko".to_string()),
        alert_enabled: true,
        alert_min_kp,
        notes: None,
    }
}

pub(super) fn record(id: &str, email: &str, alert_min_kp: i32) -> SubscriptionRecord {
    SubscriptionRecord {
        subscription: subscription(id, alert_min_kp),
        subscriber: Some(Subscriber {
            email: Some(email.to_string()),
            display_name: Some("Sky".to_string()),
        }),
        location: Some(abisko()),
    }
}

pub(super) fn reference_now() -> DateTime<Utc> {
    ScoringEngine::default().moon().reference_new_moon()
}

pub(super) fn aurora_signal(kp_index: f64) -> AuroraSignal {
    AuroraSignal {
        kp_index,
        forecast: Vec::new(),
        updated_at: None,
    }
}

pub(super) struct FixedAurora {
    signal: Option<AuroraSignal>,
    pub(super) calls: AtomicUsize,
}

impl FixedAurora {
    pub(super) fn kp(kp_index: f64) -> Self {
        Self {
            signal: Some(aurora_signal(kp_index)),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn unavailable() -> Self {
        Self {
            signal: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AuroraSource for FixedAurora {
    async fn fetch_current(&self) -> Result<AuroraSignal, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.signal.clone().ok_or(ProviderError::Status {
            provider: "noaa-swpc",
            status: 503,
        })
    }
}

/// Weather fake that also records how many fetches overlap.
pub(super) struct FixedWeather {
    cloud_coverage: Option<f64>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub(super) peak_in_flight: AtomicUsize,
    pub(super) calls: AtomicUsize,
}

impl FixedWeather {
    pub(super) fn clouds(cloud_coverage: f64) -> Self {
        Self {
            cloud_coverage: Some(cloud_coverage),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn unavailable() -> Self {
        Self {
            cloud_coverage: None,
            ..Self::clouds(0.0)
        }
    }

    pub(super) fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn fetch_weather(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<WeatherSignal, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.cloud_coverage
            .map(WeatherSignal::with_cloud_coverage)
            .ok_or(ProviderError::Status {
                provider: "open-meteo",
                status: 500,
            })
    }
}

pub(super) struct FixedAir(pub(super) f64);

#[async_trait]
impl AirQualitySource for FixedAir {
    async fn fetch_air_quality(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<AirQualitySignal, ProviderError> {
        Ok(AirQualitySignal::with_aqi(self.0))
    }
}

pub(super) fn providers(aurora: Arc<FixedAurora>, weather: Arc<FixedWeather>) -> SignalProviders {
    SignalProviders::new(
        aurora,
        weather,
        Arc::new(FixedAir(20.0)),
        Duration::from_secs(2),
    )
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Vec<SubscriptionRecord>,
    pub(super) reads: AtomicUsize,
}

impl MemoryRepository {
    pub(super) fn with_records(records: Vec<SubscriptionRecord>) -> Self {
        Self {
            records,
            reads: AtomicUsize::new(0),
        }
    }
}

impl SubscriptionRepository for MemoryRepository {
    fn alert_enabled_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

pub(super) struct UnavailableRepository;

impl SubscriptionRepository for UnavailableRepository {
    fn alert_enabled_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
    failing_recipient: Option<String>,
    missing_credentials: bool,
}

impl RecordingSink {
    pub(super) fn failing_for(recipient: &str) -> Self {
        Self {
            failing_recipient: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub(super) fn unconfigured() -> Self {
        Self {
            missing_credentials: true,
            ..Self::default()
        }
    }

    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("sink mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn ready(&self) -> Result<(), NotifyError> {
        if self.missing_credentials {
            Err(NotifyError::MissingCredentials("RESEND_API_KEY"))
        } else {
            Ok(())
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.failing_recipient.as_deref() == Some(notification.recipient.as_str()) {
            return Err(NotifyError::Transport("smtp relay down".to_string()));
        }
        self.sent
            .lock()
            .expect("sink mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

pub(super) fn build_service<R>(
    repository: Arc<R>,
    sink: Arc<RecordingSink>,
    aurora: Arc<FixedAurora>,
    weather: Arc<FixedWeather>,
) -> AlertRunService<R, RecordingSink>
where
    R: SubscriptionRepository + 'static,
{
    AlertRunService::new(
        repository,
        sink,
        providers(aurora, weather),
        Arc::new(ScoringEngine::default()),
        DispatchSettings::default(),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
