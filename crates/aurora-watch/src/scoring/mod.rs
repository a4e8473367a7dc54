//! Aurora viewing score engine.
//!
//! Turns a location plus whatever geomagnetic, weather and air-quality signals are available
//! into a bounded composite score and a discrete viewing recommendation. Missing signals are
//! replaced by fixed neutral defaults so scoring always produces a value.

mod moon;
mod policy;
mod rules;
mod weights;

pub use moon::{MoonPhaseModel, DEFAULT_REFERENCE_NEW_MOON_UNIX, LUNAR_CYCLE_DAYS};
pub use policy::{
    base_recommendation, should_alert, AlertThresholds, ViewingRecommendation,
    AURORA_OVAL_LATITUDE, OVERCAST_CLOUD_COVERAGE, QUIET_KP_INDEX, UNKNOWN_CLOUD_COVERAGE,
};
pub use rules::{
    air_quality_score, cloud_score, kp_score, latitude_score, light_pollution_score,
    required_kp, ABSENT_AIR_QUALITY_SCORE, ABSENT_CLOUD_SCORE, ABSENT_KP_SCORE,
    UNKNOWN_BORTLE_SCORE,
};
pub use weights::ScoreWeights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AirQualitySignal, AuroraSignal, Location, Signal, WeatherSignal};

/// Per-factor sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub latitude: f64,
    pub kp_index: f64,
    pub clouds: f64,
    pub light_pollution: f64,
    pub moon_phase: f64,
    pub air_quality: f64,
}

/// Scoring result for one location at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub total_score: u8,
    pub scores: ScoreComponents,
    pub viewing_recommendation: ViewingRecommendation,
}

/// Stateless scorer. The only configuration is the moon-phase reference epoch.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    moon: MoonPhaseModel,
}

impl ScoringEngine {
    pub fn new(moon: MoonPhaseModel) -> Self {
        Self { moon }
    }

    pub fn moon(&self) -> &MoonPhaseModel {
        &self.moon
    }

    pub fn score(
        &self,
        location: &Location,
        aurora: &Signal<AuroraSignal>,
        weather: &Signal<WeatherSignal>,
        air_quality: &Signal<AirQualitySignal>,
        now: DateTime<Utc>,
    ) -> Score {
        let scores = rules::score_components(
            location,
            aurora,
            weather,
            air_quality,
            self.moon.score(now),
        );
        let weighted = ScoreWeights::STANDARD.weighted_total(&scores);
        let total_score = weighted.round().clamp(0.0, 100.0) as u8;
        let viewing_recommendation = policy::recommend(total_score, location, aurora, weather);

        Score {
            total_score,
            scores,
            viewing_recommendation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Accessibility, LocationId, Tier};
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn location(latitude: f64, bortle_scale: Option<i64>) -> Location {
        Location {
            id: LocationId("test-site".to_string()),
            name: "Test Site".to_string(),
            description: None,
            latitude,
            longitude: 18.0,
            country: "Sweden".to_string(),
            region: None,
            tier: Tier::Primary,
            bortle_scale,
            accessibility: Accessibility::Easy,
            amenities: BTreeMap::new(),
            best_months: vec![1, 2, 3, 10, 11, 12],
            nearby_city: None,
            nearby_airport: None,
        }
    }

    fn aurora(kp_index: f64) -> Signal<AuroraSignal> {
        Signal::Present(AuroraSignal {
            kp_index,
            forecast: Vec::new(),
            updated_at: None,
        })
    }

    fn clouds(coverage: f64) -> Signal<WeatherSignal> {
        Signal::Present(WeatherSignal::with_cloud_coverage(coverage))
    }

    fn aqi(value: f64) -> Signal<AirQualitySignal> {
        Signal::Present(AirQualitySignal::with_aqi(value))
    }

    fn engine() -> ScoringEngine {
        ScoringEngine::default()
    }

    fn new_moon() -> DateTime<Utc> {
        engine().moon().reference_new_moon()
    }

    fn full_moon() -> DateTime<Utc> {
        new_moon() + Duration::milliseconds((LUNAR_CYCLE_DAYS * 0.5 * 86_400_000.0) as i64)
    }

    #[test]
    fn ideal_arctic_conditions_are_excellent_in_any_moon_phase() {
        let site = location(66.0, Some(2));
        for now in [new_moon(), full_moon()] {
            let score = engine().score(&site, &aurora(5.0), &clouds(10.0), &aqi(20.0), now);
            assert_eq!(score.scores.latitude, 100.0);
            assert_eq!(score.scores.kp_index, 100.0);
            assert_eq!(score.scores.clouds, 90.0);
            assert_eq!(score.scores.light_pollution, 95.0);
            assert_eq!(score.scores.air_quality, 100.0);
            assert_eq!(score.viewing_recommendation, ViewingRecommendation::Excellent);
        }

        let dark = engine().score(&site, &aurora(5.0), &clouds(10.0), &aqi(20.0), new_moon());
        assert_eq!(dark.scores.moon_phase, 100.0);
        assert_eq!(dark.total_score, 97);

        let bright = engine().score(&site, &aurora(5.0), &clouds(10.0), &aqi(20.0), full_moon());
        assert_eq!(bright.total_score, 87);
    }

    #[test]
    fn heavy_cloud_forces_poor_despite_high_total() {
        let site = location(66.0, Some(2));
        let score = engine().score(&site, &aurora(5.0), &clouds(85.0), &aqi(20.0), new_moon());
        assert_eq!(score.total_score, 82);
        assert_eq!(score.viewing_recommendation, ViewingRecommendation::Poor);
    }

    #[test]
    fn quiet_field_south_of_oval_is_not_visible() {
        let site = location(50.0, Some(1));
        let score = engine().score(&site, &aurora(1.0), &clouds(0.0), &aqi(10.0), new_moon());
        assert_eq!(score.viewing_recommendation, ViewingRecommendation::NotVisible);
    }

    #[test]
    fn quiet_field_override_wins_over_cloud_override() {
        let site = location(50.0, Some(1));
        let score = engine().score(&site, &aurora(1.0), &clouds(95.0), &aqi(10.0), new_moon());
        assert_eq!(score.viewing_recommendation, ViewingRecommendation::NotVisible);
    }

    #[test]
    fn quiet_field_inside_oval_is_not_overridden() {
        let site = location(68.0, Some(1));
        let score = engine().score(&site, &aurora(1.0), &clouds(0.0), &aqi(10.0), new_moon());
        assert_ne!(score.viewing_recommendation, ViewingRecommendation::NotVisible);
    }

    #[test]
    fn missing_signals_fall_back_to_defaults() {
        let site = location(66.0, None);
        let score = engine().score(
            &site,
            &Signal::Absent,
            &Signal::Absent,
            &Signal::Absent,
            new_moon(),
        );
        assert_eq!(score.scores.kp_index, ABSENT_KP_SCORE);
        assert_eq!(score.scores.clouds, ABSENT_CLOUD_SCORE);
        assert_eq!(score.scores.light_pollution, UNKNOWN_BORTLE_SCORE);
        assert_eq!(score.scores.air_quality, ABSENT_AIR_QUALITY_SCORE);
        assert_eq!(score.total_score, 60);
        assert_eq!(score.viewing_recommendation, ViewingRecommendation::Moderate);
    }

    #[test]
    fn non_finite_readings_count_as_missing() {
        let site = location(66.0, Some(3));
        let score = engine().score(
            &site,
            &aurora(f64::NAN),
            &clouds(f64::INFINITY),
            &aqi(f64::NAN),
            new_moon(),
        );
        assert_eq!(score.scores.kp_index, ABSENT_KP_SCORE);
        assert_eq!(score.scores.clouds, ABSENT_CLOUD_SCORE);
        assert_eq!(score.scores.air_quality, ABSENT_AIR_QUALITY_SCORE);
    }

    #[test]
    fn total_stays_within_bounds_across_inputs() {
        let engine = engine();
        let kp_values = [None, Some(0.0), Some(2.0), Some(4.33), Some(9.0)];
        let cloud_values = [None, Some(0.0), Some(50.0), Some(100.0)];
        let aqi_values = [None, Some(0.0), Some(120.0), Some(480.0)];
        let latitudes = [-70.0, 0.0, 47.0, 58.0, 63.0, 69.0, 89.0];
        let bortles = [None, Some(1), Some(5), Some(9), Some(42)];
        let instants = [new_moon(), full_moon(), new_moon() - Duration::days(400)];

        for latitude in latitudes {
            for bortle in bortles {
                let site = location(latitude, bortle);
                for kp in kp_values {
                    for cloud in cloud_values {
                        for air in aqi_values {
                            for now in instants {
                                let aurora_signal = kp.map_or(Signal::Absent, aurora);
                                let weather = cloud.map_or(Signal::Absent, clouds);
                                let air_quality = air.map_or(Signal::Absent, aqi);
                                let score = engine.score(
                                    &site,
                                    &aurora_signal,
                                    &weather,
                                    &air_quality,
                                    now,
                                );
                                assert!(score.total_score <= 100);
                                for component in [
                                    score.scores.latitude,
                                    score.scores.kp_index,
                                    score.scores.clouds,
                                    score.scores.light_pollution,
                                    score.scores.moon_phase,
                                    score.scores.air_quality,
                                ] {
                                    assert!((0.0..=100.0).contains(&component));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn score_serializes_with_public_field_names() {
        let site = location(66.0, Some(2));
        let score = engine().score(&site, &aurora(5.0), &clouds(10.0), &aqi(20.0), new_moon());
        let value = serde_json::to_value(score).expect("serializes");
        assert_eq!(value["total_score"], serde_json::json!(97));
        assert_eq!(value["viewing_recommendation"], serde_json::json!("excellent"));
        assert!(value["scores"]["light_pollution"].is_number());
    }
}
