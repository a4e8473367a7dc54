use serde::{Deserialize, Serialize};

use crate::domain::{AuroraSignal, Location, Signal, WeatherSignal};

/// Above this cloud coverage the sky is effectively closed.
pub const OVERCAST_CLOUD_COVERAGE: f64 = 80.0;
/// Below this Kp nothing is visible south of the oval.
pub const QUIET_KP_INDEX: f64 = 2.0;
pub const AURORA_OVAL_LATITUDE: f64 = 65.0;
/// Cloud coverage assumed for alerting when the weather signal is missing.
pub const UNKNOWN_CLOUD_COVERAGE: f64 = 100.0;

/// Five-level viewing outlook derived from the composite score and hard overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewingRecommendation {
    Excellent,
    Good,
    Moderate,
    Poor,
    NotVisible,
}

impl ViewingRecommendation {
    pub const fn label(self) -> &'static str {
        match self {
            ViewingRecommendation::Excellent => "excellent",
            ViewingRecommendation::Good => "good",
            ViewingRecommendation::Moderate => "moderate",
            ViewingRecommendation::Poor => "poor",
            ViewingRecommendation::NotVisible => "not-visible",
        }
    }
}

impl std::fmt::Display for ViewingRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn base_recommendation(total_score: u8) -> ViewingRecommendation {
    match total_score {
        80.. => ViewingRecommendation::Excellent,
        65..=79 => ViewingRecommendation::Good,
        50..=64 => ViewingRecommendation::Moderate,
        35..=49 => ViewingRecommendation::Poor,
        _ => ViewingRecommendation::NotVisible,
    }
}

/// Buckets the rounded total, then applies the overrides in order.
///
/// The quiet-geomagnetic override runs last so it wins over the overcast one.
pub(crate) fn recommend(
    total_score: u8,
    location: &Location,
    aurora: &Signal<AuroraSignal>,
    weather: &Signal<WeatherSignal>,
) -> ViewingRecommendation {
    let mut recommendation = base_recommendation(total_score);

    if let Some(weather) = weather.present() {
        if weather.cloud_coverage > OVERCAST_CLOUD_COVERAGE {
            recommendation = ViewingRecommendation::Poor;
        }
    }

    if let Some(aurora) = aurora.present() {
        if aurora.kp_index < QUIET_KP_INDEX && location.latitude < AURORA_OVAL_LATITUDE {
            recommendation = ViewingRecommendation::NotVisible;
        }
    }

    recommendation
}

/// Conditions a scored location must meet before anyone is notified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub min_total_score: u8,
    pub min_kp_index: f64,
    /// Exclusive upper bound.
    pub max_cloud_coverage: f64,
}

impl AlertThresholds {
    pub fn permits(&self, total_score: u8, kp_index: f64, cloud_coverage: f64) -> bool {
        total_score >= self.min_total_score
            && kp_index >= self.min_kp_index
            && cloud_coverage < self.max_cloud_coverage
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_total_score: 65,
            min_kp_index: 4.0,
            max_cloud_coverage: 50.0,
        }
    }
}

/// Alert eligibility with the standard thresholds.
pub fn should_alert(total_score: u8, kp_index: f64, cloud_coverage: f64) -> bool {
    AlertThresholds::default().permits(total_score, kp_index, cloud_coverage)
}
