//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real CGM or pump required.

mod bridge_flow_tests;
mod loop_service_tests;
mod mock_hw;
