//! Fuzz target: wire decoders and ledger snapshot import
//!
//! Drives arbitrary bytes into every inbound decoder and asserts that
//! whatever is accepted satisfies the invariants the engine relies on.
//!
//! cargo fuzz run fuzz_wire_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use openaps::ledger::TreatmentLedger;
use openaps::wire;

fuzz_target!(|data: &[u8]| {
    if let Ok(treatments) = wire::decode_bolus_schedule(data) {
        for t in treatments {
            assert!(t.dose >= 0.0 && t.dose.is_finite());
            assert!(t.duration > 0);
        }
    }

    if let Ok(profile) = wire::decode_profile(data) {
        assert!(profile.threshold_bg < profile.target_bg);
        assert!(profile.isf > 0.0 && profile.dia_hours > 0.0);
    }

    let _ = wire::decode_cgm(data);

    if let Ok(ledger) = TreatmentLedger::from_bytes(data) {
        assert!(ledger.iter().all(|t| t.validate().is_ok()));
    }
});
