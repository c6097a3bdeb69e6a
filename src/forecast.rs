//! BG forecaster.
//!
//! Two projections from the current reading and the insulin state:
//!
//! - **naive**: the current activity rate held for the lookahead window
//!   (`bg - activity · isf · lookahead`), i.e. where BG is trending now.
//! - **eventual**: every unit on board fully metabolised
//!   (`bg - iob · isf`), the floor if nothing else is given.
//!
//! No clamping to physiological bounds happens here; interpreting the
//! numbers is the decider's job.

use serde::{Deserialize, Serialize};

use crate::config::PatientProfile;
use crate::insulin::InsulinState;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BgForecast {
    /// Short-horizon linear projection (mg/dL).
    pub naive: f32,
    /// Projection once all IOB is absorbed (mg/dL).
    pub eventual: f32,
}

impl BgForecast {
    /// Projected change across the lookahead window (negative = falling).
    pub fn naive_delta(&self, current_bg: f32) -> f32 {
        self.naive - current_bg
    }
}

pub fn get_bg_forecast(
    profile: &PatientProfile,
    current_bg: f32,
    activity: f32,
    iob: f32,
) -> BgForecast {
    BgForecast {
        naive: current_bg - activity * profile.isf * profile.lookahead_minutes,
        eventual: current_bg - iob * profile.isf,
    }
}

/// Convenience wrapper over [`get_bg_forecast`] for an [`InsulinState`].
pub fn forecast_from_state(
    profile: &PatientProfile,
    current_bg: f32,
    state: InsulinState,
) -> BgForecast {
    get_bg_forecast(profile, current_bg, state.activity, state.iob)
}
