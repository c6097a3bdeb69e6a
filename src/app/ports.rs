//! Port traits — the hexagonal boundary between the dosing core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LoopService (domain)
//! ```
//!
//! Driven adapters (CGM, pump, event sinks) implement these traits.  The
//! [`LoopService`](super::service::LoopService) consumes them via generics,
//! so the dosing core never touches hardware directly.

use serde::{Deserialize, Serialize};

use crate::error::{ActuatorError, SensorError};

/// One CGM sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    /// Sample time, minutes since the loop epoch.
    pub time: i64,
    /// Blood glucose (mg/dL).
    pub bg: f32,
}

// ───────────────────────────────────────────────────────────────
// Glucose sensor port (driven adapter: CGM → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle.
pub trait GlucoseSensorPort {
    /// Latest reading, or why none is available.
    fn read_glucose(&mut self) -> Result<GlucoseReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Pump port (driven adapter: domain → pump)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command basal delivery.
pub trait PumpPort {
    /// Deliver basal at `units_per_hour` until the next command.
    fn set_basal_rate(&mut self, units_per_hour: f32) -> Result<(), ActuatorError>;

    /// Stop basal delivery immediately.  Must not fail silently; adapters
    /// that cannot reach the pump should latch their own alarm.
    fn suspend(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT,
/// dashboard).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
