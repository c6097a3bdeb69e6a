//! Patient profile
//!
//! All tunable dosing parameters for one patient.  Supplied to the engine at
//! construction and replaceable at runtime; nothing here is a source-level
//! constant of the algorithm.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::insulin::ActionCurve;

/// Patient profile driving the IOB model, forecaster and basal decider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    // --- Insulin response ---
    /// Insulin sensitivity factor (mg/dL drop per unit)
    pub isf: f32,
    /// Duration of insulin action (hours)
    pub dia_hours: f32,
    /// Shape of the insulin-action curve
    pub curve: ActionCurve,

    // --- BG thresholds ---
    /// Target blood glucose (mg/dL)
    pub target_bg: f32,
    /// Suspend threshold (mg/dL), must be below `target_bg`
    pub threshold_bg: f32,
    /// Half-width of the band around target treated as "at target" (mg/dL)
    pub target_band: f32,
    /// Naive-forecast drop over the lookahead that counts as falling sharply (mg/dL)
    pub sharp_drop_mgdl: f32,

    // --- Basal ---
    /// Programmed baseline basal rate (U/h)
    pub baseline_basal: f32,
    /// Multiplier applied to baseline in the REDUCED state (0-1)
    pub reduced_multiplier: f32,
    /// Multiplier applied to baseline in the INCREASED state (>= 1)
    pub increased_multiplier: f32,
    /// Hard cap on any recommended rate (U/h)
    pub max_basal: f32,

    // --- Timing ---
    /// Naive forecast horizon (minutes)
    pub lookahead_minutes: f32,
    /// Decision cadence of the caller (minutes)
    pub cycle_minutes: u32,
    /// Ledger basal delivered above `baseline_basal` as treatments
    pub record_excess_basal: bool,
}

impl Default for PatientProfile {
    fn default() -> Self {
        Self {
            // Insulin response
            isf: 50.0,
            dia_hours: 3.0,
            curve: ActionCurve::Bilinear,

            // Thresholds
            target_bg: 110.0,
            threshold_bg: 70.0,
            target_band: 10.0,
            sharp_drop_mgdl: 30.0,

            // Basal
            baseline_basal: 1.0,
            reduced_multiplier: 0.5,
            increased_multiplier: 1.5,
            max_basal: 3.0,

            // Timing
            lookahead_minutes: 30.0,
            cycle_minutes: 5, // CGM cadence
            record_excess_basal: true,
        }
    }
}

impl PatientProfile {
    /// Check every field for physiological and structural sanity.
    ///
    /// Invalid values are rejected, never clamped: a dosing decision built
    /// on a silently repaired profile is worse than no decision.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.isf,
            self.dia_hours,
            self.target_bg,
            self.threshold_bg,
            self.target_band,
            self.sharp_drop_mgdl,
            self.baseline_basal,
            self.reduced_multiplier,
            self.increased_multiplier,
            self.max_basal,
            self.lookahead_minutes,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfiguration("all values must be finite"));
        }
        if self.isf <= 0.0 {
            return Err(Error::InvalidConfiguration("isf must be positive"));
        }
        if self.dia_hours <= 0.0 {
            return Err(Error::InvalidConfiguration("dia_hours must be positive"));
        }
        if self.threshold_bg >= self.target_bg {
            return Err(Error::InvalidConfiguration(
                "threshold_bg must be below target_bg",
            ));
        }
        if self.target_band < 0.0 {
            return Err(Error::InvalidConfiguration("target_band must be >= 0"));
        }
        if self.sharp_drop_mgdl < 0.0 {
            return Err(Error::InvalidConfiguration("sharp_drop_mgdl must be >= 0"));
        }
        if self.baseline_basal < 0.0 {
            return Err(Error::InvalidConfiguration("baseline_basal must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.reduced_multiplier) {
            return Err(Error::InvalidConfiguration(
                "reduced_multiplier must be within 0..=1",
            ));
        }
        if self.increased_multiplier < 1.0 {
            return Err(Error::InvalidConfiguration(
                "increased_multiplier must be >= 1",
            ));
        }
        if self.max_basal < self.baseline_basal {
            return Err(Error::InvalidConfiguration(
                "max_basal must be >= baseline_basal",
            ));
        }
        if self.lookahead_minutes <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "lookahead_minutes must be positive",
            ));
        }
        if self.cycle_minutes == 0 {
            return Err(Error::InvalidConfiguration("cycle_minutes must be positive"));
        }
        self.curve.validate()
    }

    /// Action window for a dose submitted without an explicit duration.
    pub fn default_duration_minutes(&self) -> u32 {
        (self.dia_hours * 60.0).round().max(1.0) as u32
    }
}
