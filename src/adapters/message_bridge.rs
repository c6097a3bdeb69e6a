//! Message bridge adapter.
//!
//! Sits between a publish/subscribe transport and the loop: inbound CGM
//! payloads are decoded into a small queue the loop drains as its
//! [`GlucoseSensorPort`], and every basal command becomes an
//! `{"insulin_rate": ...}` payload in the outbox for the transport to
//! publish as the loop's [`PumpPort`].

use heapless::Deque;
use log::{debug, warn};

use crate::app::ports::{GlucoseReading, GlucoseSensorPort, PumpPort};
use crate::error::{ActuatorError, CodecError, SensorError};
use crate::wire;

/// Readings buffered between two loop cycles.
const INBOX_DEPTH: usize = 8;
/// Pump payloads held until the transport drains them.
const OUTBOX_DEPTH: usize = 8;

pub struct MessageBridge {
    inbox: Deque<GlucoseReading, INBOX_DEPTH>,
    outbox: Deque<String, OUTBOX_DEPTH>,
}

impl MessageBridge {
    pub fn new() -> Self {
        Self {
            inbox: Deque::new(),
            outbox: Deque::new(),
        }
    }

    /// Accept a raw CGM payload.  When the inbox is full the oldest reading
    /// is dropped; only the newest matters to the next cycle.
    pub fn push_cgm(&mut self, payload: &[u8]) -> Result<(), CodecError> {
        let reading = wire::decode_cgm(payload).inspect_err(|e| {
            warn!("Dropping CGM payload: {e}");
        })?;
        if self.inbox.is_full() {
            self.inbox.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.inbox.push_back(reading);
        Ok(())
    }

    /// Take every pending pump payload, oldest first.
    pub fn drain_outbox(&mut self) -> Vec<String> {
        core::iter::from_fn(|| self.outbox.pop_front()).collect()
    }

    /// Queue a pump payload.  An undrained outbox loses its oldest command;
    /// the pump only acts on the latest rate.
    fn publish(&mut self, payload: String) {
        if self.outbox.is_full() {
            warn!("Outbox full, dropping oldest pump command");
            self.outbox.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.outbox.push_back(payload);
    }
}

impl Default for MessageBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl GlucoseSensorPort for MessageBridge {
    fn read_glucose(&mut self) -> Result<GlucoseReading, SensorError> {
        let newest = self.inbox.pop_back().ok_or(SensorError::NoReading)?;
        if !self.inbox.is_empty() {
            debug!("Skipping {} superseded CGM readings", self.inbox.len());
            self.inbox.clear();
        }
        Ok(newest)
    }
}

impl PumpPort for MessageBridge {
    fn set_basal_rate(&mut self, units_per_hour: f32) -> Result<(), ActuatorError> {
        let payload =
            wire::encode_insulin_rate(units_per_hour).map_err(|_| ActuatorError::PumpRejected)?;
        self.publish(payload);
        Ok(())
    }

    fn suspend(&mut self) {
        match wire::encode_insulin_rate(0.0) {
            Ok(payload) => self.publish(payload),
            Err(e) => warn!("Could not encode suspend command: {e}"),
        }
    }
}
