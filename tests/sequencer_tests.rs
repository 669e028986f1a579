//! Check battery tests against the simulated fixture.
//!
//! Covers ordering, inverse-logic outcome rules, fault isolation between
//! checks, protocol errors aborting the run, the settle delay and the
//! loopback mismatch count.

mod common;

use common::{Fault, SimFixture};
use fixture_tester::check::{CheckResult, Outcome};
use fixture_tester::pin::LogicalPin;
use fixture_tester::probe::ProbeError;
use fixture_tester::sequencer::{input_check, output_check, SETTLE_DELAY};
use fixture_tester::{SequenceError, Sequencer, SequencerSettings};
use pretty_assertions::assert_eq;
use std::time::Duration;

/// Settings with a short settle delay so the battery runs quickly.
fn fast_settings() -> SequencerSettings {
    SequencerSettings {
        settle_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

fn names(results: &[CheckResult]) -> Vec<&str> {
    results.iter().map(|r| r.name.as_str()).collect()
}

fn outcome_of(results: &[CheckResult], name: &str) -> Outcome {
    results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no result named {name}"))
        .outcome
}

#[test]
fn test_healthy_fixture_passes_everything_in_order() {
    let fixture = SimFixture::healthy();
    let mut ctx = fixture.context();

    let report = Sequencer::new(fast_settings()).run_all(&mut ctx).unwrap();

    assert!(report.all_passed(), "unexpected failures: {:?}", report.results());
    assert_eq!(
        names(report.results()),
        vec![
            "Loopback", "5V test", "3V3 test", "GND test", "RTS test", "DTR test", "CTS test",
            "DSR test", "DCD test", "RI test"
        ]
    );
    assert_eq!(fixture.bridge_writes(), 1000);
}

#[test]
fn test_probe_sees_commands_in_battery_order() {
    let fixture = SimFixture::healthy();
    let mut ctx = fixture.context();

    Sequencer::new(fast_settings())
        .run_pin_battery(&mut ctx)
        .unwrap();

    assert_eq!(
        fixture.probe_commands(),
        vec![
            "READ.5V", "READ.3V3", "READ.GND", "READ.RTS", "READ.RTS", "READ.DTR", "READ.DTR",
            "WRITE0.CTS", "WRITE1.CTS", "WRITE0.DSR", "WRITE1.DSR", "WRITE0.DCD", "WRITE1.DCD",
            "WRITE0.RI", "WRITE1.RI"
        ]
    );
}

#[test]
fn test_floating_5v_fails_alone() {
    let fixture = SimFixture::healthy().with_fault(LogicalPin::FiveVolt, Fault::Stuck(false));
    let mut ctx = fixture.context();

    let report = Sequencer::new(fast_settings())
        .run_pin_battery(&mut ctx)
        .unwrap();

    assert_eq!(report.results().len(), 9);
    let failures: Vec<String> = report.failures().map(|r| r.to_string()).collect();
    assert_eq!(failures, vec!["5V test failed"]);
}

#[test]
fn test_ground_must_read_low() {
    let fixture = SimFixture::healthy().with_fault(LogicalPin::Ground, Fault::Stuck(true));
    let mut ctx = fixture.context();

    let report = Sequencer::new(fast_settings())
        .run_pin_battery(&mut ctx)
        .unwrap();

    assert_eq!(outcome_of(report.results(), "GND test"), Outcome::Failed);
    assert_eq!(outcome_of(report.results(), "3V3 test"), Outcome::Ok);
}

#[test]
fn test_output_check_outcomes() {
    let cases = [
        (Fault::Stuck(false), Outcome::FailedHigh),
        (Fault::Stuck(true), Outcome::FailedLow),
        (Fault::NotInverted, Outcome::FailedBoth),
    ];

    for (fault, expected) in cases {
        let fixture = SimFixture::healthy().with_fault(LogicalPin::Rts, fault.clone());
        let mut ctx = fixture.context();

        let result = output_check(&mut ctx, LogicalPin::Rts).unwrap();
        assert_eq!(result.outcome, expected, "fault {:?}", fault);
    }

    let mut ctx = SimFixture::healthy().context();
    assert!(output_check(&mut ctx, LogicalPin::Dtr).unwrap().passed());
}

#[test]
fn test_output_check_leaves_line_low() {
    let fixture = SimFixture::healthy();
    let mut ctx = fixture.context();

    output_check(&mut ctx, LogicalPin::Dtr).unwrap();
    assert!(!ctx.bridge.get(fixture_tester::ControlLine::Dtr).unwrap());
}

#[test]
fn test_input_check_outcomes() {
    let cases = [
        (LogicalPin::Cts, Fault::Stuck(false), Outcome::FailedHigh),
        (LogicalPin::Dsr, Fault::Stuck(true), Outcome::FailedLow),
        (LogicalPin::Ri, Fault::NotInverted, Outcome::FailedBoth),
    ];

    for (pin, fault, expected) in cases {
        let fixture = SimFixture::healthy().with_fault(pin, fault);
        let mut ctx = fixture.context();

        let result = input_check(&mut ctx, pin, Duration::from_millis(1)).unwrap();
        assert_eq!(result.outcome, expected, "pin {}", pin);
    }
}

#[test]
fn test_both_failures_reported_as_two_lines() {
    let fixture = SimFixture::healthy().with_fault(LogicalPin::Dcd, Fault::NotInverted);
    let mut ctx = fixture.context();

    let report = Sequencer::new(fast_settings())
        .run_pin_battery(&mut ctx)
        .unwrap();

    let lines: Vec<String> = report
        .failures()
        .flat_map(|r| r.lines())
        .map(|(line, _)| line)
        .collect();
    assert_eq!(
        lines,
        vec!["DCD test failed on HIGH check", "DCD test failed on LOW check"]
    );
    // RI still ran after the DCD failure.
    assert_eq!(outcome_of(report.results(), "RI test"), Outcome::Ok);
}

#[test]
fn test_input_samples_wait_for_settle_delay() {
    let fixture = SimFixture::healthy();
    let mut ctx = fixture.context();

    let result = input_check(&mut ctx, LogicalPin::Cts, SETTLE_DELAY).unwrap();
    assert!(result.passed());

    let samples = fixture.samples();
    assert_eq!(samples.len(), 2);
    for sample in samples {
        assert_eq!(sample.pin, LogicalPin::Cts);
        let elapsed = sample.since_last_write.expect("sampled before any write");
        assert!(
            elapsed >= Duration::from_millis(300),
            "sampled {:?} after the write",
            elapsed
        );
    }
}

#[test]
fn test_garbage_response_aborts_run() {
    let fixture = SimFixture::healthy()
        .with_fault(LogicalPin::Ground, Fault::Garbage(b"ERR\n".to_vec()));
    let mut ctx = fixture.context();

    let err = Sequencer::new(fast_settings())
        .run_pin_battery(&mut ctx)
        .unwrap_err();

    match err {
        SequenceError::Probe {
            pin: LogicalPin::Ground,
            source: ProbeError::Protocol(raw),
        } => assert_eq!(raw, b"ERR\n"),
        other => panic!("expected protocol error on GND, got {:?}", other),
    }
    // Nothing after GND was attempted.
    assert_eq!(
        fixture.probe_commands(),
        vec!["READ.5V", "READ.3V3", "READ.GND"]
    );
}

#[test]
fn test_silent_probe_is_not_read_as_low() {
    let fixture = SimFixture::healthy().with_fault(LogicalPin::Rts, Fault::Silent);
    let mut ctx = fixture.context();

    let err = output_check(&mut ctx, LogicalPin::Rts).unwrap_err();
    assert!(matches!(
        err,
        SequenceError::Probe { pin: LogicalPin::Rts, source: ProbeError::Protocol(ref raw) } if raw.is_empty()
    ));
}

#[test]
fn test_loopback_reports_mismatch_count() {
    let fixture = SimFixture::healthy().corrupt_every(100);
    let mut bridge = fixture.bridge_port();

    let report = Sequencer::new(fast_settings())
        .run_loopback(&mut bridge)
        .unwrap();

    let result = &report.results()[0];
    assert_eq!(result.outcome, Outcome::Mismatched { count: 10, total: 1000 });
    assert_eq!(result.to_string(), "Loopback failed (10 mismatched strings)");
}

#[test]
fn test_loopback_ok_on_bridged_port() {
    let fixture = SimFixture::healthy();
    let mut bridge = fixture.bridge_port();

    let report = Sequencer::new(fast_settings())
        .run_loopback(&mut bridge)
        .unwrap();

    assert!(report.all_passed());
    assert_eq!(report.results()[0].to_string(), "Loopback OK");
}
