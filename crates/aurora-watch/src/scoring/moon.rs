use chrono::{DateTime, Duration, Utc};

pub const LUNAR_CYCLE_DAYS: f64 = 29.53;

/// 2026-01-06T00:00:00Z, the epoch the public map has always used.
pub const DEFAULT_REFERENCE_NEW_MOON_UNIX: i64 = 1_767_657_600;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Mean synodic-month approximation anchored on a configurable new-moon epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoonPhaseModel {
    reference_new_moon: DateTime<Utc>,
}

impl MoonPhaseModel {
    pub fn new(reference_new_moon: DateTime<Utc>) -> Self {
        Self { reference_new_moon }
    }

    pub fn reference_new_moon(&self) -> DateTime<Utc> {
        self.reference_new_moon
    }

    /// Fraction of the lunar cycle elapsed at `now`, in `[0, 1)`. 0 is new, 0.5 is full.
    ///
    /// Dates before the reference wrap backwards into the previous cycle.
    pub fn phase(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_days =
            (now - self.reference_new_moon).num_milliseconds() as f64 / MILLIS_PER_DAY;
        let phase = elapsed_days.rem_euclid(LUNAR_CYCLE_DAYS) / LUNAR_CYCLE_DAYS;
        // rem_euclid can round up to exactly the divisor for tiny negative inputs
        if phase >= 1.0 {
            0.0
        } else {
            phase
        }
    }

    /// Darkness score: 100 at new moon, 0 at full moon, 20 at either quarter.
    pub fn score(&self, now: DateTime<Utc>) -> f64 {
        phase_score(self.phase(now))
    }
}

impl Default for MoonPhaseModel {
    fn default() -> Self {
        Self::new(
            DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(DEFAULT_REFERENCE_NEW_MOON_UNIX),
        )
    }
}

fn phase_score(phase: f64) -> f64 {
    if phase < 0.25 {
        100.0 - phase * 4.0 * 80.0
    } else if phase < 0.5 {
        20.0 - (phase - 0.25) * 4.0 * 20.0
    } else if phase < 0.75 {
        (phase - 0.5) * 4.0 * 20.0
    } else {
        20.0 + (phase - 0.75) * 4.0 * 80.0
    }
}
