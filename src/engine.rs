//! Dosing engine: ledger, IOB model, forecaster and decider behind one owner.
//!
//! Per cycle the caller appends new treatments, then asks for a basal rate:
//!
//! ```text
//!   ledger ──▶ insulin_calculations(t) ──▶ get_bg_forecast ──▶ classify ──▶ rate
//! ```
//!
//! Every read path is pure over the ledger contents.  The engine is not
//! internally synchronised; a shared instance needs one external lock
//! around each call.

use log::{debug, info, warn};

use crate::config::PatientProfile;
use crate::decider::{BasalDecision, BasalState, classify};
use crate::error::{Error, Result};
use crate::forecast::{BgForecast, get_bg_forecast};
use crate::insulin::{self, InsulinState};
use crate::ledger::{InsulinTreatment, TreatmentLedger};

pub struct DosingEngine {
    profile: PatientProfile,
    /// Validation failure of the current profile, if any.  While set, every
    /// decision is SUSPEND.
    profile_fault: Option<Error>,
    ledger: TreatmentLedger,
}

impl DosingEngine {
    /// Build an engine.  An invalid profile is accepted but latched: the
    /// engine suspends delivery until [`set_profile`](Self::set_profile)
    /// supplies a valid one.
    pub fn new(profile: PatientProfile) -> Self {
        let profile_fault = profile.validate().err();
        if let Some(e) = profile_fault {
            warn!("Engine built with {e}; delivery suspended until corrected");
        }
        Self {
            profile,
            profile_fault,
            ledger: TreatmentLedger::new(),
        }
    }

    /// Build an engine around a previously persisted ledger.
    pub fn with_ledger(profile: PatientProfile, ledger: TreatmentLedger) -> Self {
        let mut engine = Self::new(profile);
        info!("Restored {} treatments", ledger.len());
        engine.ledger = ledger;
        engine
    }

    /// Replace the patient profile.  Returns the validation result; an
    /// invalid profile is still installed and latches SUSPEND.
    pub fn set_profile(&mut self, profile: PatientProfile) -> Result<()> {
        let result = profile.validate();
        self.profile = profile;
        self.profile_fault = result.err();
        match result {
            Ok(()) => info!("Patient profile updated"),
            Err(e) => warn!("Rejected patient profile: {e}"),
        }
        result
    }

    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    /// True when the current profile is valid and decisions are live.
    pub fn is_configured(&self) -> bool {
        self.profile_fault.is_none()
    }

    pub fn profile_fault(&self) -> Option<Error> {
        self.profile_fault
    }

    pub fn ledger(&self) -> &TreatmentLedger {
        &self.ledger
    }

    // ── Ledger ────────────────────────────────────────────────

    pub fn add_insulin_treatment(&mut self, treatment: InsulinTreatment) -> Result<()> {
        self.ledger.add(treatment).map_err(|e| {
            warn!(
                "Treatment rejected ({e}): t={} dose={} duration={}",
                treatment.time, treatment.dose, treatment.duration
            );
            Error::from(e)
        })
    }

    /// Record a bolus whose action window is the profile's DIA.
    pub fn add_bolus(&mut self, time: i64, dose: f32) -> Result<()> {
        let duration = self.profile.default_duration_minutes();
        let duration = i32::try_from(duration)
            .map_err(|_| Error::InvalidConfiguration("dia_hours too large"))?;
        self.add_insulin_treatment(InsulinTreatment {
            time,
            dose,
            duration,
        })
    }

    /// Drop fully-decayed treatments.  Returns the count removed.
    pub fn prune(&mut self, now: i64) -> usize {
        let removed = self.ledger.prune(now);
        if removed > 0 {
            debug!("Pruned {removed} decayed treatments at t={now}");
        }
        removed
    }

    // ── Model ─────────────────────────────────────────────────

    /// Total activity and IOB at `t`.
    pub fn insulin_calculations(&self, t: i64) -> InsulinState {
        insulin::insulin_calculations(&self.ledger, &self.profile.curve, t)
    }

    pub fn get_bg_forecast(&self, current_bg: f32, activity: f32, iob: f32) -> BgForecast {
        get_bg_forecast(&self.profile, current_bg, activity, iob)
    }

    // ── Decision ──────────────────────────────────────────────

    /// Full decision at `t` for `current_bg`.
    pub fn decide(&self, t: i64, current_bg: f32) -> BasalDecision {
        let insulin = self.insulin_calculations(t);
        let forecast = self.get_bg_forecast(current_bg, insulin.activity, insulin.iob);

        let (state, rate) = if self.profile_fault.is_some() {
            (BasalState::Suspend, 0.0)
        } else {
            let state = classify(&self.profile, current_bg, &forecast);
            (state, state.rate(&self.profile))
        };

        debug!(
            "t={t} bg={current_bg:.0} iob={:.2}U act={:.4}U/min naive={:.0} eventual={:.0} -> {state:?} {rate:.2}U/h",
            insulin.iob, insulin.activity, forecast.naive, forecast.eventual
        );

        BasalDecision {
            time: t,
            current_bg,
            state,
            rate,
            insulin,
            forecast,
        }
    }

    /// Recommended basal rate (U/h, never negative).
    pub fn get_basal_rate(&self, t: i64, current_bg: f32) -> f32 {
        self.decide(t, current_bg).rate
    }
}
