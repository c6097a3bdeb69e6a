//! Outbound application events.
//!
//! The [`LoopService`](super::service::LoopService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::decider::{BasalDecision, BasalState};
use crate::error::{ActuatorError, SensorError, TreatmentError};

/// Structured events emitted by the loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The loop has started; `configured` is false while the profile is invalid.
    Started { configured: bool },

    /// A basal decision was made and handed to the pump.
    Decision(BasalDecision),

    /// The basal state differs from the previous cycle.
    StateChanged { from: BasalState, to: BasalState },

    /// No usable glucose reading; delivery was suspended.
    SensorUnavailable(SensorError),

    /// The pump refused the commanded rate; delivery was suspended.
    PumpFault(ActuatorError),

    /// A treatment was refused by the ledger.
    TreatmentRejected(TreatmentError),

    /// A profile update failed validation.
    ProfileRejected(&'static str),
}
