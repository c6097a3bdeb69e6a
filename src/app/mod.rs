//! Application core: the closed loop around the dosing engine, zero I/O.
//!
//! Each cycle reads a CGM sample, asks the engine for a basal rate, drives
//! the pump, and feeds the delivered basal back into the ledger.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
