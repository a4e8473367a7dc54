use serde::{Deserialize, Serialize};

use super::ScoreComponents;

/// Relative importance of each component in the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub latitude: f64,
    pub kp_index: f64,
    pub clouds: f64,
    pub light_pollution: f64,
    pub moon_phase: f64,
    pub air_quality: f64,
}

impl ScoreWeights {
    /// Northern-hemisphere tuned weights. They sum to exactly 1.0.
    pub const STANDARD: ScoreWeights = ScoreWeights {
        latitude: 0.25,
        kp_index: 0.25,
        clouds: 0.20,
        light_pollution: 0.15,
        moon_phase: 0.10,
        air_quality: 0.05,
    };

    pub fn sum(&self) -> f64 {
        self.latitude
            + self.kp_index
            + self.clouds
            + self.light_pollution
            + self.moon_phase
            + self.air_quality
    }

    pub fn weighted_total(&self, scores: &ScoreComponents) -> f64 {
        scores.latitude * self.latitude
            + scores.kp_index * self.kp_index
            + scores.clouds * self.clouds
            + scores.light_pollution * self.light_pollution
            + scores.moon_phase * self.moon_phase
            + scores.air_quality * self.air_quality
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}
