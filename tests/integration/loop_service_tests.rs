//! Integration tests for the LoopService → engine → pump pipeline.
//!
//! These run on the host (x86_64) and verify the full cycle from a CGM
//! reading down to a pump command without any real hardware.

use super::mock_hw::{MockHardware, PumpCall, RecordingSink};

use openaps::app::commands::AppCommand;
use openaps::app::events::AppEvent;
use openaps::app::service::LoopService;
use openaps::error::{ActuatorError, SensorError, TreatmentError};
use openaps::{BasalState, PatientProfile};

fn make_loop() -> (LoopService, MockHardware, RecordingSink) {
    let mut svc = LoopService::new(PatientProfile::default());
    let hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);
    (svc, hw, sink)
}

#[test]
fn start_reports_configuration() {
    let (_svc, _hw, sink) = make_loop();
    assert!(matches!(
        sink.events[0],
        AppEvent::Started { configured: true }
    ));

    let bad = PatientProfile {
        dia_hours: 0.0,
        ..PatientProfile::default()
    };
    let mut svc = LoopService::new(bad);
    let mut sink = RecordingSink::new();
    svc.start(&mut sink);
    assert!(matches!(
        sink.events[0],
        AppEvent::Started { configured: false }
    ));
}

#[test]
fn at_target_delivers_baseline() {
    let (mut svc, mut hw, mut sink) = make_loop();
    hw.queue(0, 110.0);
    let d = svc.tick(&mut hw, &mut sink).expect("decision");
    assert_eq!(d.state, BasalState::Normal);
    assert_eq!(hw.calls, [PumpCall::SetBasal(1.0)]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Decision(_))),
        1,
        "one decision per cycle"
    );
}

#[test]
fn bolus_with_low_eventual_suspends() {
    let (mut svc, mut hw, mut sink) = make_loop();
    svc.handle_command(AppCommand::Bolus { time: 0, dose: 4.0 }, &mut sink);
    hw.queue(90, 150.0);
    let d = svc.tick(&mut hw, &mut sink).expect("decision");
    assert_eq!(d.state, BasalState::Suspend);
    assert!((d.forecast.eventual - 50.0).abs() < 1e-3);
    assert_eq!(hw.delivering(), 0.0);
    // Nothing delivered, so only the bolus is on the ledger.
    assert_eq!(svc.engine().ledger().len(), 1);
}

#[test]
fn rising_bg_emits_state_change() {
    let (mut svc, mut hw, mut sink) = make_loop();
    hw.queue(0, 110.0);
    hw.queue(5, 200.0);
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), Some(BasalState::Increased));
    assert!((hw.delivering() - 1.5).abs() < 1e-6);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::StateChanged {
            from: BasalState::Normal,
            to: BasalState::Increased
        }
    )));
}

#[test]
fn missing_reading_suspends_delivery() {
    let (mut svc, mut hw, mut sink) = make_loop();
    hw.queue(0, 110.0);
    hw.queue_error(SensorError::NoReading);
    svc.tick(&mut hw, &mut sink);
    assert!(svc.tick(&mut hw, &mut sink).is_none());
    assert_eq!(hw.last_call(), Some(&PumpCall::Suspend));
    assert_eq!(svc.state(), Some(BasalState::Suspend));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SensorUnavailable(SensorError::NoReading))),
        1
    );
}

#[test]
fn reading_going_backwards_is_stale() {
    let (mut svc, mut hw, mut sink) = make_loop();
    hw.queue(10, 110.0);
    hw.queue(5, 110.0);
    svc.tick(&mut hw, &mut sink);
    assert!(svc.tick(&mut hw, &mut sink).is_none());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SensorUnavailable(SensorError::Stale))),
        1
    );
}

#[test]
fn pump_fault_suspends_and_skips_ledger() {
    let (mut svc, mut hw, mut sink) = make_loop();
    hw.pump_error = Some(ActuatorError::PumpRejected);
    hw.queue(0, 110.0);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(hw.calls, [PumpCall::Suspend]);
    assert!(svc.engine().ledger().is_empty());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::PumpFault(ActuatorError::PumpRejected))),
        1
    );
}

#[test]
fn excess_basal_accumulates_as_iob() {
    let (mut svc, mut hw, mut sink) = make_loop();
    for i in 0..6 {
        hw.queue(i * 5, 200.0);
    }
    for _ in 0..6 {
        svc.tick(&mut hw, &mut sink);
    }
    assert_eq!(svc.state(), Some(BasalState::Increased));
    assert_eq!(svc.engine().ledger().len(), 6);
    let iob = svc.engine().insulin_calculations(25).iob;
    // Six five-minute segments of 0.5 U/h above baseline, mostly on board.
    assert!(iob > 0.24 && iob < 0.25, "iob={iob}");
}

#[test]
fn steady_target_leaves_ledger_empty() {
    let (mut svc, mut hw, mut sink) = make_loop();
    for i in 0..72 {
        hw.queue(i * 5, 110.0);
    }
    for _ in 0..72 {
        let d = svc.tick(&mut hw, &mut sink).expect("decision");
        assert_eq!(d.state, BasalState::Normal, "t={}", d.time);
    }
    assert!(svc.engine().ledger().is_empty());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::StateChanged { .. })),
        0
    );
}

#[test]
fn basal_recording_can_be_disabled() {
    let profile = PatientProfile {
        record_excess_basal: false,
        ..PatientProfile::default()
    };
    let mut svc = LoopService::new(profile);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    hw.queue(0, 200.0);
    svc.tick(&mut hw, &mut sink);
    assert!((hw.delivering() - 1.5).abs() < 1e-6);
    assert!(svc.engine().ledger().is_empty());
}

#[test]
fn rejected_profile_suspends_next_cycle() {
    let (mut svc, mut hw, mut sink) = make_loop();
    let bad = PatientProfile {
        threshold_bg: 200.0,
        ..PatientProfile::default()
    };
    svc.handle_command(AppCommand::UpdateProfile(bad), &mut sink);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ProfileRejected(_))),
        1
    );
    hw.queue(0, 110.0);
    let d = svc.tick(&mut hw, &mut sink).expect("decision");
    assert_eq!(d.state, BasalState::Suspend);
    assert_eq!(hw.delivering(), 0.0);
}

#[test]
fn negative_bolus_is_reported() {
    let (mut svc, _hw, mut sink) = make_loop();
    svc.handle_command(AppCommand::Bolus { time: 0, dose: -1.0 }, &mut sink);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::TreatmentRejected(TreatmentError::NegativeDose))),
        1
    );
    assert!(svc.engine().ledger().is_empty());
}

#[test]
fn prune_command_drops_decayed_entries() {
    let (mut svc, _hw, mut sink) = make_loop();
    svc.handle_command(AppCommand::Bolus { time: 0, dose: 1.0 }, &mut sink);
    svc.handle_command(AppCommand::Bolus { time: 200, dose: 1.0 }, &mut sink);
    svc.handle_command(AppCommand::Prune { now: 250 }, &mut sink);
    assert_eq!(svc.engine().ledger().len(), 1);
}
