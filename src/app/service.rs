//! Loop service — the hexagonal core of the closed loop.
//!
//! [`LoopService`] owns the [`DosingEngine`] and the little bookkeeping the
//! loop needs between cycles (last reading time, last basal state).  All
//! I/O flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  GlucoseSensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                        │      LoopService        │
//!          PumpPort ◀────│ Ledger · IOB · Decider  │
//!                        └────────────────────────┘
//! ```

use log::{error, info, warn};

use crate::config::PatientProfile;
use crate::decider::{BasalDecision, BasalState};
use crate::engine::DosingEngine;
use crate::error::{Error, SensorError};
use crate::ledger::InsulinTreatment;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, GlucoseReading, GlucoseSensorPort, PumpPort};

/// Lowest plausible CGM value (mg/dL).  Sensors report "LO" below this.
pub const MIN_PLAUSIBLE_BG: f32 = 20.0;
/// Highest plausible CGM value (mg/dL).  Sensors report "HI" above this.
pub const MAX_PLAUSIBLE_BG: f32 = 600.0;

// ───────────────────────────────────────────────────────────────
// LoopService
// ───────────────────────────────────────────────────────────────

pub struct LoopService {
    engine: DosingEngine,
    last_reading_time: Option<i64>,
    last_state: Option<BasalState>,
    last_decision: Option<BasalDecision>,
    tick_count: u64,
}

impl LoopService {
    pub fn new(profile: PatientProfile) -> Self {
        Self::with_engine(DosingEngine::new(profile))
    }

    /// Wrap an engine that already holds treatment history (e.g. restored
    /// from a ledger snapshot).
    pub fn with_engine(engine: DosingEngine) -> Self {
        Self {
            engine,
            last_reading_time: None,
            last_state: None,
            last_decision: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let configured = self.engine.is_configured();
        sink.emit(&AppEvent::Started { configured });
        info!("Loop started (configured={configured})");
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one closed-loop cycle: read CGM → decide → drive pump → record.
    ///
    /// Returns the decision applied this cycle, or `None` when no usable
    /// reading was available and delivery was suspended instead.
    pub fn tick(
        &mut self,
        hw: &mut (impl GlucoseSensorPort + PumpPort),
        sink: &mut impl EventSink,
    ) -> Option<BasalDecision> {
        self.tick_count += 1;

        // 1. Acquire a fresh, plausible reading
        let reading = match hw.read_glucose().and_then(|r| self.check_reading(r)) {
            Ok(r) => r,
            Err(e) => {
                warn!("No usable glucose reading ({e}); suspending basal");
                hw.suspend();
                sink.emit(&AppEvent::SensorUnavailable(e));
                self.note_state(BasalState::Suspend, sink);
                return None;
            }
        };
        self.last_reading_time = Some(reading.time);

        // 2. Bound ledger growth
        self.engine.prune(reading.time);

        // 3. Decide
        let decision = self.engine.decide(reading.time, reading.bg);

        // 4. Drive the pump
        let delivered = match hw.set_basal_rate(decision.rate) {
            Ok(()) => true,
            Err(e) => {
                error!("Pump rejected {:.2}U/h: {e}", decision.rate);
                hw.suspend();
                sink.emit(&AppEvent::PumpFault(e));
                false
            }
        };

        // 5. Feed basal above baseline back into the ledger
        if delivered {
            self.record_excess_basal(&decision, sink);
        }

        sink.emit(&AppEvent::Decision(decision));
        self.note_state(
            if delivered {
                decision.state
            } else {
                BasalState::Suspend
            },
            sink,
        );
        self.last_decision = Some(decision);
        Some(decision)
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) {
        let result = match cmd {
            AppCommand::AddTreatment(t) => self.engine.add_insulin_treatment(t),
            AppCommand::Bolus { time, dose } => self.engine.add_bolus(time, dose),
            AppCommand::UpdateProfile(profile) => self.engine.set_profile(profile),
            AppCommand::Prune { now } => {
                self.engine.prune(now);
                Ok(())
            }
        };
        if let Err(e) = result {
            Self::report(e, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn engine(&self) -> &DosingEngine {
        &self.engine
    }

    /// Basal state applied on the last cycle.
    pub fn state(&self) -> Option<BasalState> {
        self.last_state
    }

    pub fn last_decision(&self) -> Option<&BasalDecision> {
        self.last_decision.as_ref()
    }

    /// Total cycles executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn check_reading(&self, r: GlucoseReading) -> Result<GlucoseReading, SensorError> {
        if self.last_reading_time.is_some_and(|last| r.time <= last) {
            return Err(SensorError::Stale);
        }
        if !r.bg.is_finite() || !(MIN_PLAUSIBLE_BG..=MAX_PLAUSIBLE_BG).contains(&r.bg) {
            return Err(SensorError::OutOfRange);
        }
        Ok(r)
    }

    /// Ledger the basal delivered above the programmed baseline.  Baseline
    /// itself balances endogenous glucose and is not pending action.
    fn record_excess_basal(&mut self, decision: &BasalDecision, sink: &mut impl EventSink) {
        let profile = self.engine.profile();
        let excess = decision.rate - profile.baseline_basal;
        if !profile.record_excess_basal || excess <= 0.0 {
            return;
        }
        let dose = excess * profile.cycle_minutes as f32 / 60.0;
        let duration = i32::try_from(profile.default_duration_minutes()).unwrap_or(i32::MAX);
        let segment = InsulinTreatment {
            time: decision.time,
            dose,
            duration,
        };
        if let Err(e) = self.engine.add_insulin_treatment(segment) {
            Self::report(e, sink);
        }
    }

    fn note_state(&mut self, state: BasalState, sink: &mut impl EventSink) {
        if let Some(prev) = self.last_state {
            if prev != state {
                info!("Basal state {prev:?} -> {state:?}");
                sink.emit(&AppEvent::StateChanged {
                    from: prev,
                    to: state,
                });
            }
        }
        self.last_state = Some(state);
    }

    fn report(e: Error, sink: &mut impl EventSink) {
        match e {
            Error::InvalidTreatment(t) => sink.emit(&AppEvent::TreatmentRejected(t)),
            Error::InvalidConfiguration(msg) => sink.emit(&AppEvent::ProfileRejected(msg)),
            other => warn!("Command failed: {other}"),
        }
    }
}
