//! Ordered battery of fixture checks.
//!
//! Checks that read the wrong level are reported and the run continues. A
//! probe that answers with anything but `0`/`1`, or a transport fault, aborts
//! the run.

use crate::bridge::{Bridge, BridgeError, LineAccessor};
use crate::check::{CheckResult, Outcome, Report};
use crate::pin::LogicalPin;
use crate::port::{read_line, ControlLines, PortError, SerialPortAdapter};
use crate::probe::{ProbeClient, ProbeError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Wait between a probe write and the bridge sample it should cause.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Round-trips in the loopback stress test.
pub const LOOPBACK_ITERATIONS: usize = 1000;

/// Line sent on every loopback round-trip.
pub const LOOPBACK_PAYLOAD: &[u8] = b"Loopback Test\n";

/// Rail checks and the level each must read.
pub const RAIL_CHECKS: [(LogicalPin, bool); 3] = [
    (LogicalPin::FiveVolt, true),
    (LogicalPin::ThreeVoltThree, true),
    (LogicalPin::Ground, false),
];

/// Lines the host drives and the probe reads back.
pub const OUTPUT_CHECKS: [LogicalPin; 2] = [LogicalPin::Rts, LogicalPin::Dtr];

/// Lines the probe drives and the host samples.
pub const INPUT_CHECKS: [LogicalPin; 4] = [
    LogicalPin::Cts,
    LogicalPin::Dsr,
    LogicalPin::Dcd,
    LogicalPin::Ri,
];

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("{pin} check aborted: {source}")]
    Probe {
        pin: LogicalPin,
        #[source]
        source: ProbeError,
    },

    #[error("{pin} check aborted: {source}")]
    Bridge {
        pin: LogicalPin,
        #[source]
        source: BridgeError,
    },

    #[error("loopback aborted: {0}")]
    Loopback(#[source] PortError),

    #[error("{0} has no bridge line")]
    NoControlLine(LogicalPin),
}

/// Tunables for a run.
#[derive(Debug, Clone)]
pub struct SequencerSettings {
    pub settle_delay: Duration,
    pub loopback_iterations: usize,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            loopback_iterations: LOOPBACK_ITERATIONS,
        }
    }
}

/// Both fixture connections for the length of one run.
///
/// Dropping the context closes both ports, whichever way the run ends.
#[derive(Debug)]
pub struct TestContext<P, B> {
    pub probe: ProbeClient<P>,
    pub bridge: Bridge<B>,
}

impl<P, B> TestContext<P, B>
where
    P: SerialPortAdapter,
    B: SerialPortAdapter + ControlLines,
{
    pub fn new(probe_port: P, bridge_port: B) -> Self {
        Self {
            probe: ProbeClient::new(probe_port),
            bridge: Bridge::new(bridge_port),
        }
    }
}

/// Runs checks in a fixed order and collects their results.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    settings: SequencerSettings,
    print: bool,
}

impl Sequencer {
    pub fn new(settings: SequencerSettings) -> Self {
        Self {
            settings,
            print: false,
        }
    }

    /// Print every result to the console as soon as it is known.
    pub fn printing(mut self, print: bool) -> Self {
        self.print = print;
        self
    }

    pub fn settings(&self) -> &SequencerSettings {
        &self.settings
    }

    fn record(&self, report: &mut Report, result: CheckResult) {
        if result.passed() {
            info!(check = %result.name, "passed");
        } else {
            warn!(check = %result.name, outcome = ?result.outcome, "failed");
        }
        if self.print {
            result.print();
        }
        report.push(result);
    }

    /// Loopback, then the pin battery.
    pub fn run_all<P, B>(&self, ctx: &mut TestContext<P, B>) -> Result<Report, SequenceError>
    where
        P: SerialPortAdapter,
        B: SerialPortAdapter + ControlLines,
    {
        let mut report = Report::new();
        let loopback = self.loopback(ctx.bridge.port_mut())?;
        self.record(&mut report, loopback);
        self.pin_battery_into(ctx, &mut report)?;
        Ok(report)
    }

    /// Rails, ground, output lines, then input lines.
    pub fn run_pin_battery<P, B>(
        &self,
        ctx: &mut TestContext<P, B>,
    ) -> Result<Report, SequenceError>
    where
        P: SerialPortAdapter,
        B: SerialPortAdapter + ControlLines,
    {
        let mut report = Report::new();
        self.pin_battery_into(ctx, &mut report)?;
        Ok(report)
    }

    /// Loopback stress test on its own.
    pub fn run_loopback<B>(&self, port: &mut B) -> Result<Report, SequenceError>
    where
        B: SerialPortAdapter + ?Sized,
    {
        let mut report = Report::new();
        let result = self.loopback(port)?;
        self.record(&mut report, result);
        Ok(report)
    }

    fn pin_battery_into<P, B>(
        &self,
        ctx: &mut TestContext<P, B>,
        report: &mut Report,
    ) -> Result<(), SequenceError>
    where
        P: SerialPortAdapter,
        B: SerialPortAdapter + ControlLines,
    {
        for (pin, expected) in RAIL_CHECKS {
            let result = rail_check(&mut ctx.probe, pin, expected)?;
            self.record(report, result);
        }
        for pin in OUTPUT_CHECKS {
            let result = output_check(ctx, pin)?;
            self.record(report, result);
        }
        for pin in INPUT_CHECKS {
            let result = input_check(ctx, pin, self.settings.settle_delay)?;
            self.record(report, result);
        }
        Ok(())
    }

    fn loopback<B>(&self, port: &mut B) -> Result<CheckResult, SequenceError>
    where
        B: SerialPortAdapter + ?Sized,
    {
        let outcome = loopback_check(port, LOOPBACK_PAYLOAD, self.settings.loopback_iterations)
            .map_err(SequenceError::Loopback)?;
        Ok(CheckResult::new("Loopback", outcome))
    }
}

fn check_name(pin: LogicalPin) -> String {
    format!("{pin} test")
}

/// One probe read; passes when it matches `expected`.
pub fn rail_check<P: SerialPortAdapter>(
    probe: &mut ProbeClient<P>,
    pin: LogicalPin,
    expected: bool,
) -> Result<CheckResult, SequenceError> {
    let _span = info_span!("rail_check", %pin).entered();
    let level = probe
        .read_pin(pin)
        .map_err(|source| SequenceError::Probe { pin, source })?;
    debug!(level, expected, "rail sample");
    Ok(CheckResult::new(check_name(pin), Outcome::from_match(level == expected)))
}

/// Drive a bridge output and read it back through the probe.
///
/// The fixture inverts these lines: driving high must read false on the
/// probe, driving low must read true.
pub fn output_check<P, B>(
    ctx: &mut TestContext<P, B>,
    pin: LogicalPin,
) -> Result<CheckResult, SequenceError>
where
    P: SerialPortAdapter,
    B: ControlLines,
{
    let _span = info_span!("output_check", %pin).entered();
    let accessor = accessor_for(pin)?;
    let bridge_err = |source| SequenceError::Bridge { pin, source };
    let probe_err = |source| SequenceError::Probe { pin, source };

    accessor.set(&mut ctx.bridge, true).map_err(bridge_err)?;
    let should_be_false = ctx.probe.read_pin(pin).map_err(probe_err)?;

    accessor.set(&mut ctx.bridge, false).map_err(bridge_err)?;
    let should_be_true = ctx.probe.read_pin(pin).map_err(probe_err)?;

    debug!(should_be_true, should_be_false, "output samples");
    Ok(CheckResult::new(
        check_name(pin),
        Outcome::from_samples(should_be_true, should_be_false),
    ))
}

/// Have the probe drive a line and sample it on the bridge.
///
/// Inverse logic as for outputs. Each sample waits `settle` after the probe
/// write so the level has propagated.
pub fn input_check<P, B>(
    ctx: &mut TestContext<P, B>,
    pin: LogicalPin,
    settle: Duration,
) -> Result<CheckResult, SequenceError>
where
    P: SerialPortAdapter,
    B: ControlLines,
{
    let _span = info_span!("input_check", %pin).entered();
    let accessor = accessor_for(pin)?;
    let bridge_err = |source| SequenceError::Bridge { pin, source };
    let probe_err = |source| SequenceError::Probe { pin, source };

    ctx.probe.write_pin(pin, false).map_err(probe_err)?;
    thread::sleep(settle);
    let should_be_true = accessor.get(&mut ctx.bridge).map_err(bridge_err)?;

    ctx.probe.write_pin(pin, true).map_err(probe_err)?;
    thread::sleep(settle);
    let should_be_false = accessor.get(&mut ctx.bridge).map_err(bridge_err)?;

    debug!(should_be_true, should_be_false, "input samples");
    Ok(CheckResult::new(
        check_name(pin),
        Outcome::from_samples(should_be_true, should_be_false),
    ))
}

fn accessor_for(pin: LogicalPin) -> Result<LineAccessor, SequenceError> {
    pin.control_line()
        .map(LineAccessor::new)
        .ok_or(SequenceError::NoControlLine(pin))
}

/// Send `payload` `iterations` times and count echoes that differ from it.
///
/// Needs TX bridged to RX on the port. Only the raw transport is exercised.
pub fn loopback_check<B>(
    port: &mut B,
    payload: &[u8],
    iterations: usize,
) -> Result<Outcome, PortError>
where
    B: SerialPortAdapter + ?Sized,
{
    let _span = info_span!("loopback", port = port.name(), iterations).entered();
    // Leave room for a garbled echo longer than the payload.
    let max_len = payload.len() * 2;
    let mut mismatches = 0;

    for round in 0..iterations {
        port.write_all_bytes(payload)?;
        let returned = read_line(port, max_len)?;
        if returned != payload {
            mismatches += 1;
            debug!(round, returned = ?String::from_utf8_lossy(&returned), "loopback mismatch");
        }
    }

    if mismatches == 0 {
        Ok(Outcome::Ok)
    } else {
        Ok(Outcome::Mismatched {
            count: mismatches,
            total: iterations,
        })
    }
}
