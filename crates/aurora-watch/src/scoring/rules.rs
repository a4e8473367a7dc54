use super::ScoreComponents;
use crate::domain::{AirQualitySignal, AuroraSignal, BortleClass, Location, Signal, WeatherSignal};

/// Kp score used when no geomagnetic snapshot is available; equivalent to very low activity.
pub const ABSENT_KP_SCORE: f64 = 15.0;
pub const ABSENT_CLOUD_SCORE: f64 = 50.0;
pub const UNKNOWN_BORTLE_SCORE: f64 = 50.0;
pub const ABSENT_AIR_QUALITY_SCORE: f64 = 80.0;

const BORTLE_SCORES: [f64; 9] = [100.0, 95.0, 85.0, 70.0, 50.0, 30.0, 15.0, 5.0, 0.0];

/// Step bands following the climatological footprint of the northern aurora oval.
pub fn latitude_score(latitude: f64) -> f64 {
    if (65.0..=72.0).contains(&latitude) {
        100.0
    } else if (60.0..65.0).contains(&latitude) {
        90.0
    } else if (55.0..60.0).contains(&latitude) {
        70.0
    } else if (50.0..55.0).contains(&latitude) {
        50.0
    } else if (45.0..50.0).contains(&latitude) {
        30.0
    } else {
        10.0
    }
}

/// Minimum Kp at which aurora is plausibly overhead for the given latitude.
pub fn required_kp(latitude: f64) -> f64 {
    if latitude >= 65.0 {
        2.0
    } else if latitude >= 60.0 {
        4.0
    } else {
        6.0
    }
}

pub fn kp_score(kp: f64, latitude: f64) -> f64 {
    let margin = kp - required_kp(latitude);
    if margin >= 3.0 {
        100.0
    } else if margin >= 2.0 {
        85.0
    } else if margin >= 1.0 {
        70.0
    } else if margin >= 0.0 {
        55.0
    } else if margin >= -1.0 {
        35.0
    } else {
        15.0
    }
}

/// Inverse of cloud coverage percent, bounded to [0, 100].
pub fn cloud_score(coverage: f64) -> f64 {
    (100.0 - coverage).clamp(0.0, 100.0)
}

pub fn light_pollution_score(bortle: Option<BortleClass>) -> f64 {
    match bortle {
        Some(class) => BORTLE_SCORES[usize::from(class.value()) - 1],
        None => UNKNOWN_BORTLE_SCORE,
    }
}

/// Steps at the EPA AQI breakpoints.
pub fn air_quality_score(aqi: f64) -> f64 {
    if aqi <= 50.0 {
        100.0
    } else if aqi <= 100.0 {
        80.0
    } else if aqi <= 150.0 {
        60.0
    } else if aqi <= 200.0 {
        40.0
    } else if aqi <= 300.0 {
        20.0
    } else {
        0.0
    }
}

/// Maps every signal, present or absent, onto its component score.
///
/// This is the only place absent or non-finite readings are replaced by defaults.
pub(crate) fn score_components(
    location: &Location,
    aurora: &Signal<AuroraSignal>,
    weather: &Signal<WeatherSignal>,
    air_quality: &Signal<AirQualitySignal>,
    moon_score: f64,
) -> ScoreComponents {
    let kp_index = aurora
        .present()
        .map(|signal| signal.kp_index)
        .filter(|kp| kp.is_finite())
        .map_or(ABSENT_KP_SCORE, |kp| kp_score(kp, location.latitude));

    let clouds = weather
        .present()
        .map(|signal| signal.cloud_coverage)
        .filter(|coverage| coverage.is_finite())
        .map_or(ABSENT_CLOUD_SCORE, cloud_score);

    let air_quality = air_quality
        .present()
        .map(|signal| signal.aqi)
        .filter(|aqi| aqi.is_finite())
        .map_or(ABSENT_AIR_QUALITY_SCORE, air_quality_score);

    ScoreComponents {
        latitude: latitude_score(location.latitude),
        kp_index,
        clouds,
        light_pollution: light_pollution_score(location.bortle_class()),
        moon_phase: moon_score,
        air_quality,
    }
}
