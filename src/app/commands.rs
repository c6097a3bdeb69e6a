//! Inbound commands to the loop service.
//!
//! Actions requested by the outside world (bolus calculator, remote
//! profile editor, maintenance task) that the
//! [`LoopService`](super::service::LoopService) applies.

use crate::config::PatientProfile;
use crate::ledger::InsulinTreatment;

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Record a treatment with an explicit action window.
    AddTreatment(InsulinTreatment),

    /// Record a bolus; its action window is the profile's DIA.
    Bolus { time: i64, dose: f32 },

    /// Hot-swap the patient profile.
    UpdateProfile(PatientProfile),

    /// Drop treatments fully decayed at `now`.
    Prune { now: i64 },
}
