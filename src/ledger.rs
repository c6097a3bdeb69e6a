//! Treatment ledger: append-only history of delivered insulin.
//!
//! Storage is a fixed-capacity `heapless::Vec` so the ledger never touches
//! the heap on the control path.  A full ledger refuses appends; only the
//! caller knows the current time, so only the caller prunes.

use heapless::Vec;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, TreatmentError};

/// Maximum retained treatments.  A day of 5-minute basal segments is 288
/// entries, but segments decay after DIA so far fewer are ever live.
pub const LEDGER_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Treatment record
// ---------------------------------------------------------------------------

/// One delivered insulin dose (bolus or basal segment).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsulinTreatment {
    /// Delivery time, minutes since the loop epoch.
    pub time: i64,
    /// Units delivered.
    pub dose: f32,
    /// Action window, minutes.
    pub duration: i32,
}

impl InsulinTreatment {
    /// Build a treatment, rejecting negative / non-finite doses and
    /// non-positive durations.
    pub fn new(time: i64, dose: f32, duration: i32) -> Result<Self, TreatmentError> {
        let t = Self {
            time,
            dose,
            duration,
        };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<(), TreatmentError> {
        if !self.dose.is_finite() {
            return Err(TreatmentError::NonFiniteDose);
        }
        if self.dose < 0.0 {
            return Err(TreatmentError::NegativeDose);
        }
        if self.duration <= 0 {
            return Err(TreatmentError::NonPositiveDuration);
        }
        Ok(())
    }

    /// True once the action window has fully elapsed at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.time) > i64::from(self.duration)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Insertion-ordered treatment history owned by a single engine.
#[derive(Debug, Clone, Default)]
pub struct TreatmentLedger {
    entries: Vec<InsulinTreatment, LEDGER_CAPACITY>,
}

impl TreatmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a treatment.  On error the ledger is unchanged.
    pub fn add(&mut self, treatment: InsulinTreatment) -> Result<(), TreatmentError> {
        treatment.validate()?;
        self.entries.push(treatment).map_err(|_| {
            warn!("Ledger full: {} live treatments", self.entries.len());
            TreatmentError::LedgerFull
        })
    }

    /// Drop every treatment fully decayed at `now`.  Returns the count removed.
    pub fn prune(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|t| !t.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> core::slice::Iter<'_, InsulinTreatment> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[InsulinTreatment] {
        &self.entries
    }

    // ── Snapshot ──────────────────────────────────────────────

    /// Encode the ledger as a postcard blob for caller-side persistence.
    pub fn to_bytes(&self) -> Result<std::vec::Vec<u8>, CodecError> {
        postcard::to_allocvec(&self.entries).map_err(|_| CodecError::Encode)
    }

    /// Rebuild a ledger from [`to_bytes`](Self::to_bytes) output.
    ///
    /// Every entry is re-validated; a blob holding an invalid treatment is
    /// rejected as a whole.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let decoded: std::vec::Vec<InsulinTreatment> =
            postcard::from_bytes(bytes).map_err(|_| CodecError::Malformed)?;
        let mut ledger = Self::new();
        for t in decoded {
            ledger.add(t).map_err(|_| CodecError::Malformed)?;
        }
        Ok(ledger)
    }
}

impl<'a> IntoIterator for &'a TreatmentLedger {
    type Item = &'a InsulinTreatment;
    type IntoIter = core::slice::Iter<'a, InsulinTreatment>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
