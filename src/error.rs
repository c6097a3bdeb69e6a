//! Unified error types for the dosing firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop handles failures uniformly.  All variants are `Copy` so they can be
//! passed through the loop service and event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the dosing core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A treatment was refused by the ledger; the ledger is unchanged.
    InvalidTreatment(TreatmentError),
    /// The patient profile failed validation.  Names the offending field.
    InvalidConfiguration(&'static str),
    /// The glucose sensor could not provide a usable reading.
    Sensor(SensorError),
    /// The pump refused or could not execute a command.
    Actuator(ActuatorError),
    /// A wire message or snapshot could not be decoded or encoded.
    Codec(CodecError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTreatment(e) => write!(f, "invalid treatment: {e}"),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Codec(e) => write!(f, "codec: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Treatment errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentError {
    /// Dose below zero units.
    NegativeDose,
    /// Dose is NaN or infinite.
    NonFiniteDose,
    /// Action window of zero or negative minutes.
    NonPositiveDuration,
    /// Ledger is at capacity even after pruning decayed entries.
    LedgerFull,
}

impl fmt::Display for TreatmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeDose => write!(f, "dose is negative"),
            Self::NonFiniteDose => write!(f, "dose is not finite"),
            Self::NonPositiveDuration => write!(f, "duration must be positive"),
            Self::LedgerFull => write!(f, "ledger full"),
        }
    }
}

impl From<TreatmentError> for Error {
    fn from(e: TreatmentError) -> Self {
        Self::InvalidTreatment(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No reading available this cycle.
    NoReading,
    /// Reading is not newer than the last one processed.
    Stale,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReading => write!(f, "no glucose reading"),
            Self::Stale => write!(f, "stale glucose reading"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// The pump rejected the commanded rate.
    PumpRejected,
    /// The pump is not reachable.
    PumpUnavailable,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PumpRejected => write!(f, "pump rejected command"),
            Self::PumpUnavailable => write!(f, "pump unavailable"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload is not valid JSON / postcard for the expected shape.
    Malformed,
    /// A required field is absent.
    MissingField,
    /// Serialisation failed.
    Encode,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed payload"),
            Self::MissingField => write!(f, "missing field"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
