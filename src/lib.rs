//! OpenAPS closed-loop dosing library.
//!
//! Pure-logic core of the loop firmware: treatment ledger, insulin-on-board
//! model, BG forecaster and basal decider, plus the hexagonal loop service
//! and adapters around them.  No module performs I/O; hardware and
//! transports are reached through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod decider;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod insulin;
pub mod ledger;
pub mod wire;

pub use config::PatientProfile;
pub use decider::{BasalDecision, BasalState};
pub use engine::DosingEngine;
pub use error::{Error, Result};
pub use forecast::BgForecast;
pub use insulin::{ActionCurve, InsulinState};
pub use ledger::{InsulinTreatment, TreatmentLedger};
