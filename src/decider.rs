//! Basal rate decider.
//!
//! Threshold controller over four states, recomputed from scratch on every
//! call.  Nothing is carried between decisions, so the recommendation can
//! never desynchronise from the readings that produced it.
//!
//! ```text
//!   eventual|naive|current <= threshold ─────────────▶ SUSPEND   0
//!   |current - target| <= band ──────────────────────▶ NORMAL    baseline
//!   current below band, forecast flat/falling ───────▶ REDUCED   baseline × reduced
//!   current above band, not falling sharply ─────────▶ INCREASED min(baseline × increased, max)
//!   anything else ───────────────────────────────────▶ NORMAL
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PatientProfile;
use crate::forecast::BgForecast;
use crate::insulin::InsulinState;

/// Basal delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BasalState {
    Suspend = 0,
    Reduced = 1,
    Normal = 2,
    Increased = 3,
}

impl BasalState {
    /// Rate for this state under `profile` (U/h), always in `[0, max_basal]`.
    pub fn rate(self, profile: &PatientProfile) -> f32 {
        let rate = match self {
            Self::Suspend => 0.0,
            Self::Reduced => profile.baseline_basal * profile.reduced_multiplier,
            Self::Normal => profile.baseline_basal,
            Self::Increased => profile.baseline_basal * profile.increased_multiplier,
        };
        rate.clamp(0.0, profile.max_basal.max(0.0))
    }
}

/// Result of one decision, kept whole for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasalDecision {
    pub time: i64,
    pub current_bg: f32,
    pub state: BasalState,
    /// Recommended rate (U/h).
    pub rate: f32,
    pub insulin: InsulinState,
    pub forecast: BgForecast,
}

/// Pick the basal state for a reading and its forecast.
///
/// `profile` must already be validated; the engine short-circuits to
/// SUSPEND when it is not.
pub fn classify(profile: &PatientProfile, current_bg: f32, forecast: &BgForecast) -> BasalState {
    if !current_bg.is_finite() || !forecast.naive.is_finite() || !forecast.eventual.is_finite() {
        return BasalState::Suspend;
    }

    let threshold = profile.threshold_bg;
    if forecast.eventual <= threshold || forecast.naive <= threshold || current_bg <= threshold {
        return BasalState::Suspend;
    }

    let target = profile.target_bg;
    if (current_bg - target).abs() <= profile.target_band {
        return BasalState::Normal;
    }

    if current_bg < target {
        if forecast.naive <= current_bg {
            BasalState::Reduced
        } else {
            BasalState::Normal
        }
    } else if current_bg - forecast.naive < profile.sharp_drop_mgdl {
        BasalState::Increased
    } else {
        BasalState::Normal
    }
}
