//! Fuzz target: arbitrary engine operation sequences
//!
//! Interprets the input as a stream of add / prune / decide operations and
//! asserts the engine never panics and never recommends a rate outside
//! `[0, max_basal]`.
//!
//! cargo fuzz run fuzz_ledger_ops

#![no_main]

use libfuzzer_sys::fuzz_target;
use openaps::{DosingEngine, InsulinTreatment, PatientProfile};

fuzz_target!(|data: &[u8]| {
    let mut engine = DosingEngine::new(PatientProfile::default());
    let max = engine.profile().max_basal;

    for chunk in data.chunks_exact(8) {
        let time = i64::from(i16::from_le_bytes([chunk[1], chunk[2]]));
        let value = f32::from_le_bytes([chunk[3], chunk[4], chunk[5], chunk[6]]);
        match chunk[0] % 3 {
            0 => {
                let duration = i32::from(chunk[7] as i8) * 4;
                let before = engine.ledger().len();
                let t = InsulinTreatment { time, dose: value, duration };
                if engine.add_insulin_treatment(t).is_err() {
                    assert_eq!(engine.ledger().len(), before);
                }
            }
            1 => {
                engine.prune(time);
            }
            _ => {
                let rate = engine.get_basal_rate(time, value);
                assert!(rate.is_finite() && (0.0..=max).contains(&rate));
            }
        }
    }
});
