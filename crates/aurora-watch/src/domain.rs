use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for curated viewing locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub String);

/// Curation tier of a viewing site; tier 1 sites sit under the aurora oval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    Primary,
    Secondary,
    Tertiary,
}

impl Tier {
    pub const fn number(self) -> u8 {
        match self {
            Tier::Primary => 1,
            Tier::Secondary => 2,
            Tier::Tertiary => 3,
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = LocationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Primary),
            2 => Ok(Tier::Secondary),
            3 => Ok(Tier::Tertiary),
            other => Err(LocationError::InvalidTier(other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(value: Tier) -> Self {
        value.number()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    Easy,
    #[default]
    Moderate,
    Difficult,
}

/// Bortle dark-sky class, from 1 (pristine) to 9 (inner city).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BortleClass(u8);

impl BortleClass {
    pub const DARKEST: BortleClass = BortleClass(1);
    pub const BRIGHTEST: BortleClass = BortleClass(9);

    /// Returns `None` for anything outside 1-9.
    pub fn new(raw: i64) -> Option<Self> {
        if (1..=9).contains(&raw) {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Read-only reference record for a viewing site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
    pub tier: Tier,
    /// Raw Bortle value as stored; values outside 1-9 score as unknown.
    #[serde(default)]
    pub bortle_scale: Option<i64>,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub amenities: BTreeMap<String, bool>,
    #[serde(default)]
    pub best_months: Vec<u8>,
    #[serde(default)]
    pub nearby_city: Option<String>,
    #[serde(default)]
    pub nearby_airport: Option<String>,
}

impl Location {
    pub fn validate(&self) -> Result<(), LocationError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(LocationError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(LocationError::LongitudeOutOfRange(self.longitude));
        }
        if let Some(month) = self
            .best_months
            .iter()
            .copied()
            .find(|month| !(1..=12).contains(month))
        {
            return Err(LocationError::InvalidMonth(month));
        }
        Ok(())
    }

    pub fn bortle_class(&self) -> Option<BortleClass> {
        self.bortle_scale.and_then(BortleClass::new)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("tier {0} is not one of 1, 2, 3")]
    InvalidTier(u8),
    #[error("best month {0} is not a calendar month")]
    InvalidMonth(u8),
}

/// A single three-hour planetary K-index forecast slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpForecastEntry {
    pub time: String,
    pub kp: f64,
}

/// Geomagnetic snapshot: current planetary Kp plus the upcoming forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuroraSignal {
    pub kp_index: f64,
    #[serde(default)]
    pub forecast: Vec<KpForecastEntry>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AuroraSignal {
    pub fn peak_forecast_kp(&self) -> Option<f64> {
        self.forecast
            .iter()
            .map(|entry| entry.kp)
            .fold(None, |peak, kp| match peak {
                Some(current) if current >= kp => Some(current),
                _ => Some(kp),
            })
    }
}

/// Local sky conditions. Only `cloud_coverage` feeds the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSignal {
    pub cloud_coverage: f64,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WeatherSignal {
    pub fn with_cloud_coverage(cloud_coverage: f64) -> Self {
        Self {
            cloud_coverage,
            temperature: None,
            visibility: None,
            humidity: None,
            conditions: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySignal {
    pub aqi: f64,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AirQualitySignal {
    pub fn with_aqi(aqi: f64) -> Self {
        Self {
            aqi,
            pm25: None,
            category: None,
            updated_at: None,
        }
    }
}

/// Outcome of asking an upstream provider for a signal.
///
/// An absent signal is a valid input to scoring, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    Present(T),
    Absent,
}

impl<T> Signal<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Signal::Present(value) => Some(value),
            Signal::Absent => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Signal::Present(value) => Some(value),
            Signal::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Signal<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Signal::Present(value),
            None => Signal::Absent,
        }
    }
}
