//! End-to-end message flow: CGM payload in, pump payload out.
//!
//! Mirrors the deployed topology where the loop talks to the virtual
//! patient over a pub/sub broker, with [`MessageBridge`] standing in for
//! the transport on both sides.

use super::mock_hw::RecordingSink;

use openaps::adapters::message_bridge::MessageBridge;
use openaps::app::commands::AppCommand;
use openaps::app::service::LoopService;
use openaps::engine::DosingEngine;
use openaps::ledger::TreatmentLedger;
use openaps::{BasalState, PatientProfile, wire};

#[test]
fn cgm_payload_produces_rate_payload() {
    let mut svc = LoopService::new(PatientProfile::default());
    let mut bridge = MessageBridge::new();
    let mut sink = RecordingSink::new();

    bridge.push_cgm(br#"{"Glucose": 110.0, "time": 0}"#).unwrap();
    svc.tick(&mut bridge, &mut sink);
    assert_eq!(bridge.drain_outbox(), [r#"{"insulin_rate":1.0}"#]);
}

#[test]
fn empty_inbox_publishes_suspend() {
    let mut svc = LoopService::new(PatientProfile::default());
    let mut bridge = MessageBridge::new();
    let mut sink = RecordingSink::new();

    assert!(svc.tick(&mut bridge, &mut sink).is_none());
    assert_eq!(bridge.drain_outbox(), [r#"{"insulin_rate":0.0}"#]);
}

#[test]
fn profile_boluses_feed_the_ledger() {
    let doc = br#"{
        "diabetic": true,
        "bolus_insulins": [{"time": 0, "dose": 4.0, "duration": 180}]
    }"#;
    let mut svc = LoopService::new(PatientProfile::default());
    let mut sink = RecordingSink::new();
    for t in wire::decode_bolus_schedule(doc).unwrap() {
        svc.handle_command(AppCommand::AddTreatment(t), &mut sink);
    }

    let mut bridge = MessageBridge::new();
    bridge.push_cgm(br#"{"Glucose": 150.0, "time": 90}"#).unwrap();
    let d = svc.tick(&mut bridge, &mut sink).expect("decision");
    assert_eq!(d.state, BasalState::Suspend);
    assert_eq!(bridge.drain_outbox(), [r#"{"insulin_rate":0.0}"#]);
}

#[test]
fn ledger_snapshot_survives_restart() {
    let mut svc = LoopService::new(PatientProfile::default());
    let mut sink = RecordingSink::new();
    svc.handle_command(AppCommand::Bolus { time: 0, dose: 4.0 }, &mut sink);
    let before = svc.engine().insulin_calculations(90);
    let blob = svc.engine().ledger().to_bytes().unwrap();

    let ledger = TreatmentLedger::from_bytes(&blob).unwrap();
    let engine = DosingEngine::with_ledger(PatientProfile::default(), ledger);
    let restored = LoopService::with_engine(engine);
    assert_eq!(restored.engine().insulin_calculations(90), before);
}
