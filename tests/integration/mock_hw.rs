//! Mock CGM + pump adapter for integration tests.
//!
//! Records every pump call so tests can assert on the full command
//! history without a real pump on the bus.

use std::collections::VecDeque;

use openaps::app::events::AppEvent;
use openaps::app::ports::{EventSink, GlucoseReading, GlucoseSensorPort, PumpPort};
use openaps::error::{ActuatorError, SensorError};

// ── Pump call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PumpCall {
    SetBasal(f32),
    Suspend,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub readings: VecDeque<Result<GlucoseReading, SensorError>>,
    pub calls: Vec<PumpCall>,
    pub pump_error: Option<ActuatorError>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            calls: Vec::new(),
            pump_error: None,
        }
    }

    pub fn queue(&mut self, time: i64, bg: f32) {
        self.readings.push_back(Ok(GlucoseReading { time, bg }));
    }

    pub fn queue_error(&mut self, e: SensorError) {
        self.readings.push_back(Err(e));
    }

    pub fn last_call(&self) -> Option<&PumpCall> {
        self.calls.last()
    }

    /// Rate the pump is delivering after the last call.
    pub fn delivering(&self) -> f32 {
        match self.calls.last() {
            Some(PumpCall::SetBasal(r)) => *r,
            _ => 0.0,
        }
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl GlucoseSensorPort for MockHardware {
    fn read_glucose(&mut self) -> Result<GlucoseReading, SensorError> {
        self.readings.pop_front().unwrap_or(Err(SensorError::NoReading))
    }
}

impl PumpPort for MockHardware {
    fn set_basal_rate(&mut self, units_per_hour: f32) -> Result<(), ActuatorError> {
        if let Some(e) = self.pump_error {
            return Err(e);
        }
        self.calls.push(PumpCall::SetBasal(units_per_hour));
        Ok(())
    }

    fn suspend(&mut self) {
        self.calls.push(PumpCall::Suspend);
    }
}

// ── Recording sink ───────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
