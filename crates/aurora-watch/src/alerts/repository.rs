use serde::{Deserialize, Serialize};

use crate::domain::{Location, LocationId};

/// Minimum Kp a new subscription starts with.
pub const DEFAULT_ALERT_MIN_KP: i32 = 5;

fn default_alert_min_kp() -> i32 {
    DEFAULT_ALERT_MIN_KP
}

/// A user's saved location together with its alert preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSubscription {
    pub id: String,
    pub user_id: String,
    pub location_id: LocationId,
    #[serde(default)]
    pub alert_enabled: bool,
    #[serde(default = "default_alert_min_kp")]
    pub alert_min_kp: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Contact details joined from the subscriber's profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Subscriber {
    pub fn contact_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Subscription row with its joins. Either join may be missing when referential data is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRecord {
    pub subscription: AlertSubscription,
    pub subscriber: Option<Subscriber>,
    pub location: Option<Location>,
}

/// A subscription whose location and contact address both resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSubscription<'a> {
    pub location: &'a Location,
    pub recipient: &'a str,
    pub display_name: Option<&'a str>,
    pub alert_min_kp: i32,
}

impl SubscriptionRecord {
    pub fn resolve(&self) -> Option<ResolvedSubscription<'_>> {
        let location = self.location.as_ref()?;
        let subscriber = self.subscriber.as_ref()?;
        let recipient = subscriber.contact_address()?;

        Some(ResolvedSubscription {
            location,
            recipient,
            display_name: subscriber
                .display_name
                .as_deref()
                .filter(|name| !name.trim().is_empty()),
            alert_min_kp: self.subscription.alert_min_kp,
        })
    }
}

/// Read side of subscription storage used by alert runs.
pub trait SubscriptionRepository: Send + Sync {
    /// Every subscription with alerts switched on, joined with subscriber and location.
    fn alert_enabled_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("subscription store unavailable: {0}")]
    Unavailable(String),
}
