//! JSON messages exchanged with the CGM, the pump and the profile service.
//!
//! ```text
//!   cgm topic       {"Glucose": 142.7, "time": 35}        ──▶ GlucoseReading
//!   pump topic      {"insulin_rate": 0.5}                 ◀── basal rate
//!   profile topic   {"bolus_insulins": [{"time": 0, "dose": 4, "duration": 180}], ...}
//! ```
//!
//! Unknown keys are ignored so a full patient profile document can be fed
//! straight to [`decode_bolus_schedule`].

use serde::{Deserialize, Serialize};

use crate::app::ports::GlucoseReading;
use crate::config::PatientProfile;
use crate::error::{CodecError, Error, Result};
use crate::ledger::InsulinTreatment;

#[derive(Deserialize)]
struct CgmMessage {
    #[serde(rename = "Glucose")]
    glucose: Option<f32>,
    time: Option<f64>,
}

#[derive(Serialize)]
struct InsulinRateMessage {
    insulin_rate: f32,
}

#[derive(Deserialize)]
struct BolusEntry {
    time: f64,
    dose: f32,
    duration: f64,
}

#[derive(Deserialize)]
struct BolusSchedule {
    #[serde(default)]
    bolus_insulins: Vec<BolusEntry>,
}

/// Decode a CGM sample.  Times are rounded to whole minutes.
pub fn decode_cgm(payload: &[u8]) -> core::result::Result<GlucoseReading, CodecError> {
    let msg: CgmMessage = serde_json::from_slice(payload).map_err(|_| CodecError::Malformed)?;
    let (Some(bg), Some(time)) = (msg.glucose, msg.time) else {
        return Err(CodecError::MissingField);
    };
    Ok(GlucoseReading {
        time: whole_minutes(time)?,
        bg,
    })
}

/// Encode a basal command for the pump.
pub fn encode_insulin_rate(units_per_hour: f32) -> core::result::Result<String, CodecError> {
    serde_json::to_string(&InsulinRateMessage {
        insulin_rate: units_per_hour,
    })
    .map_err(|_| CodecError::Encode)
}

/// Decode the scheduled boluses of a patient profile document.
///
/// Every entry is validated; the first invalid one fails the whole batch so
/// a partially applied schedule never reaches the ledger.
pub fn decode_bolus_schedule(payload: &[u8]) -> Result<Vec<InsulinTreatment>> {
    let schedule: BolusSchedule =
        serde_json::from_slice(payload).map_err(|_| CodecError::Malformed)?;
    schedule
        .bolus_insulins
        .into_iter()
        .map(|b| -> Result<InsulinTreatment> {
            let time = whole_minutes(b.time)?;
            let duration = i32::try_from(whole_minutes(b.duration)?)
                .map_err(|_| CodecError::Malformed)?;
            Ok(InsulinTreatment::new(time, b.dose, duration)?)
        })
        .collect()
}

/// Decode and validate a patient profile.
pub fn decode_profile(payload: &[u8]) -> Result<PatientProfile> {
    let profile: PatientProfile =
        serde_json::from_slice(payload).map_err(|_| Error::Codec(CodecError::Malformed))?;
    profile.validate()?;
    Ok(profile)
}

fn whole_minutes(v: f64) -> core::result::Result<i64, CodecError> {
    // i64::MAX as f64 rounds up; stay strictly inside.
    if v.is_finite() && v.abs() < 9.0e18 {
        Ok(v.round() as i64)
    } else {
        Err(CodecError::Malformed)
    }
}
