//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured loop events through the
//! `log` facade (UART / USB-CDC in production, whatever backend the host
//! installs in tests and simulation).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Decision(d) => {
                info!(
                    "LOOP | t={} | BG={:.0}mg/dL | IOB={:.2}U act={:.4}U/min | \
                     naive={:.0} eventual={:.0} | {:?} {:.2}U/h",
                    d.time,
                    d.current_bg,
                    d.insulin.iob,
                    d.insulin.activity,
                    d.forecast.naive,
                    d.forecast.eventual,
                    d.state,
                    d.rate,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::SensorUnavailable(e) => {
                warn!("CGM | {} | basal suspended", e);
            }
            AppEvent::PumpFault(e) => {
                warn!("PUMP | {} | basal suspended", e);
            }
            AppEvent::TreatmentRejected(e) => {
                warn!("LEDGER | treatment rejected: {}", e);
            }
            AppEvent::ProfileRejected(msg) => {
                warn!("PROFILE | rejected: {}", msg);
            }
            AppEvent::Started { configured } => {
                info!("START | configured={}", configured);
            }
        }
    }
}
