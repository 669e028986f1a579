//! Shared test utilities for fixture-tester tests.
//!
//! This module provides a simulated fixture: a probe port that answers the
//! READ/WRITE line protocol and a bridge port whose control lines are wired
//! to the probe with the fixture's inverse logic. Faults can be injected per
//! pin to model a miswired board.

#![allow(dead_code)]

use fixture_tester::pin::LogicalPin;
use fixture_tester::port::{ControlLines, PortError, SerialPortAdapter};
use fixture_tester::TestContext;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// How a pin misbehaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Always reads this level.
    Stuck(bool),
    /// Reads the driven level without the fixture's inversion.
    NotInverted,
    /// The probe answers READ for this pin with these bytes.
    Garbage(Vec<u8>),
    /// The probe never answers READ for this pin.
    Silent,
}

/// A bridge sample and how long after the last probe write it was taken.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub pin: LogicalPin,
    pub since_last_write: Option<Duration>,
}

#[derive(Debug)]
struct Wiring {
    faults: HashMap<LogicalPin, Fault>,
    rts: bool,
    dtr: bool,
    /// Levels the probe drives on the input pins.
    probe_outputs: HashMap<LogicalPin, bool>,
    probe_rx: VecDeque<u8>,
    probe_commands: Vec<String>,
    last_probe_write: Option<Instant>,
    samples: Vec<Sample>,
    bridge_rx: VecDeque<u8>,
    bridge_writes: usize,
    /// Corrupt every n-th loopback echo.
    corrupt_every: Option<usize>,
}

/// Shared handle on the simulated fixture.
#[derive(Debug, Clone)]
pub struct SimFixture {
    wiring: Arc<Mutex<Wiring>>,
}

impl SimFixture {
    pub fn healthy() -> Self {
        Self {
            wiring: Arc::new(Mutex::new(Wiring {
                faults: HashMap::new(),
                rts: false,
                dtr: false,
                // Probe firmware starts with its outputs high.
                probe_outputs: [
                    (LogicalPin::Cts, true),
                    (LogicalPin::Dsr, true),
                    (LogicalPin::Dcd, true),
                    (LogicalPin::Ri, true),
                ]
                .into_iter()
                .collect(),
                probe_rx: VecDeque::new(),
                probe_commands: Vec::new(),
                last_probe_write: None,
                samples: Vec::new(),
                bridge_rx: VecDeque::new(),
                bridge_writes: 0,
                corrupt_every: None,
            })),
        }
    }

    fn wiring(&self) -> MutexGuard<'_, Wiring> {
        self.wiring.lock().unwrap()
    }

    pub fn with_fault(self, pin: LogicalPin, fault: Fault) -> Self {
        self.wiring().faults.insert(pin, fault);
        self
    }

    pub fn corrupt_every(self, n: usize) -> Self {
        self.wiring().corrupt_every = Some(n);
        self
    }

    pub fn probe_port(&self) -> SimProbePort {
        SimProbePort {
            fixture: self.clone(),
        }
    }

    pub fn bridge_port(&self) -> SimBridgePort {
        SimBridgePort {
            fixture: self.clone(),
        }
    }

    pub fn context(&self) -> TestContext<SimProbePort, SimBridgePort> {
        TestContext::new(self.probe_port(), self.bridge_port())
    }

    /// Every command line the probe received, newline stripped.
    pub fn probe_commands(&self) -> Vec<String> {
        self.wiring().probe_commands.clone()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.wiring().samples.clone()
    }

    pub fn bridge_writes(&self) -> usize {
        self.wiring().bridge_writes
    }
}

impl Wiring {
    /// Level the probe reads on `pin`.
    fn probe_reading(&self, pin: LogicalPin) -> Option<Vec<u8>> {
        let healthy = match pin {
            LogicalPin::FiveVolt | LogicalPin::ThreeVoltThree => true,
            LogicalPin::Ground => false,
            LogicalPin::Rts => !self.rts,
            LogicalPin::Dtr => !self.dtr,
            // The probe reads back its own outputs.
            other => self.probe_outputs.get(&other).copied().unwrap_or(false),
        };
        let level = match self.faults.get(&pin) {
            None => healthy,
            Some(Fault::Stuck(level)) => *level,
            Some(Fault::NotInverted) => !healthy,
            Some(Fault::Garbage(bytes)) => return Some(bytes.clone()),
            Some(Fault::Silent) => return None,
        };
        Some(if level { b"1\r\n".to_vec() } else { b"0\r\n".to_vec() })
    }

    /// Level the bridge samples on the line wired to `pin`.
    fn bridge_reading(&self, pin: LogicalPin) -> bool {
        let driven = self.probe_outputs.get(&pin).copied().unwrap_or(true);
        match self.faults.get(&pin) {
            Some(Fault::Stuck(level)) => *level,
            Some(Fault::NotInverted) => driven,
            _ => !driven,
        }
    }

    fn handle_command(&mut self, line: &str) {
        self.probe_commands.push(line.to_string());
        if let Some(name) = line.strip_prefix("READ.") {
            let pin: LogicalPin = name.parse().unwrap();
            if let Some(response) = self.probe_reading(pin) {
                self.probe_rx.extend(response);
            }
        } else if let Some(rest) = line.strip_prefix("WRITE") {
            let (level, name) = rest.split_once('.').unwrap();
            let pin: LogicalPin = name.parse().unwrap();
            self.probe_outputs.insert(pin, level == "1");
            self.last_probe_write = Some(Instant::now());
        } else {
            panic!("probe received unknown command {:?}", line);
        }
    }

    fn sample(&mut self, pin: LogicalPin) -> bool {
        let since_last_write = self.last_probe_write.map(|at| at.elapsed());
        self.samples.push(Sample {
            pin,
            since_last_write,
        });
        self.bridge_reading(pin)
    }
}

fn would_block() -> PortError {
    PortError::Io(std::io::Error::new(
        std::io::ErrorKind::WouldBlock,
        "No data available",
    ))
}

fn pop_into(queue: &mut VecDeque<u8>, buffer: &mut [u8]) -> Result<usize, PortError> {
    let mut n = 0;
    while n < buffer.len() {
        match queue.pop_front() {
            Some(byte) => {
                buffer[n] = byte;
                n += 1;
            }
            None => break,
        }
    }
    if n == 0 {
        Err(would_block())
    } else {
        Ok(n)
    }
}

/// Probe side of the simulated fixture.
#[derive(Debug)]
pub struct SimProbePort {
    fixture: SimFixture,
}

impl SerialPortAdapter for SimProbePort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let text = std::str::from_utf8(data).expect("probe commands are ASCII");
        let mut wiring = self.fixture.wiring();
        for line in text.split_terminator('\n') {
            wiring.handle_command(line);
        }
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        pop_into(&mut self.fixture.wiring().probe_rx, buffer)
    }

    fn name(&self) -> &str {
        "SIM-PROBE"
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.fixture.wiring().probe_rx.clear();
        Ok(())
    }
}

/// Bridge side of the simulated fixture, with TX looped back to RX.
#[derive(Debug)]
pub struct SimBridgePort {
    fixture: SimFixture,
}

impl SerialPortAdapter for SimBridgePort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut wiring = self.fixture.wiring();
        wiring.bridge_writes += 1;
        let corrupt = wiring
            .corrupt_every
            .map(|n| wiring.bridge_writes % n == 0)
            .unwrap_or(false);
        if corrupt {
            let mut garbled = data.to_vec();
            garbled[0] ^= 0x20;
            wiring.bridge_rx.extend(garbled);
        } else {
            wiring.bridge_rx.extend(data);
        }
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        pop_into(&mut self.fixture.wiring().bridge_rx, buffer)
    }

    fn name(&self) -> &str {
        "SIM-BRIDGE"
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.fixture.wiring().bridge_rx.clear();
        Ok(())
    }
}

impl ControlLines for SimBridgePort {
    fn write_request_to_send(&mut self, level: bool) -> Result<(), PortError> {
        self.fixture.wiring().rts = level;
        Ok(())
    }

    fn write_data_terminal_ready(&mut self, level: bool) -> Result<(), PortError> {
        self.fixture.wiring().dtr = level;
        Ok(())
    }

    fn read_clear_to_send(&mut self) -> Result<bool, PortError> {
        Ok(self.fixture.wiring().sample(LogicalPin::Cts))
    }

    fn read_data_set_ready(&mut self) -> Result<bool, PortError> {
        Ok(self.fixture.wiring().sample(LogicalPin::Dsr))
    }

    fn read_carrier_detect(&mut self) -> Result<bool, PortError> {
        Ok(self.fixture.wiring().sample(LogicalPin::Dcd))
    }

    fn read_ring_indicator(&mut self) -> Result<bool, PortError> {
        Ok(self.fixture.wiring().sample(LogicalPin::Ri))
    }
}
