//! Access to the bridge chip's modem-control lines.

use crate::port::{ControlLines, PortError};
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// One of the six handshake lines of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    Rts,
    Dtr,
    Cts,
    Dsr,
    Dcd,
    Ri,
}

/// Who drives a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Driven by the host.
    Output,
    /// Driven by the board under test, sampled by the host.
    Input,
}

impl ControlLine {
    pub fn direction(self) -> Direction {
        match self {
            ControlLine::Rts | ControlLine::Dtr => Direction::Output,
            ControlLine::Cts | ControlLine::Dsr | ControlLine::Dcd | ControlLine::Ri => {
                Direction::Input
            }
        }
    }
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlLine::Rts => "RTS",
            ControlLine::Dtr => "DTR",
            ControlLine::Cts => "CTS",
            ControlLine::Dsr => "DSR",
            ControlLine::Dcd => "DCD",
            ControlLine::Ri => "RI",
        })
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{0} is an input line and cannot be driven")]
    NotWritable(ControlLine),

    #[error(transparent)]
    Port(#[from] PortError),
}

/// Control-line accessor over the bridge's port.
///
/// The driver cannot read back RTS/DTR, so the levels last driven are
/// remembered here.
#[derive(Debug)]
pub struct Bridge<P> {
    port: P,
    rts: bool,
    dtr: bool,
}

impl<P: ControlLines> Bridge<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            rts: false,
            dtr: false,
        }
    }

    /// Drive an output line. The physical level changes immediately.
    pub fn set(&mut self, line: ControlLine, level: bool) -> Result<(), BridgeError> {
        match line {
            ControlLine::Rts => {
                self.port.write_request_to_send(level)?;
                self.rts = level;
            }
            ControlLine::Dtr => {
                self.port.write_data_terminal_ready(level)?;
                self.dtr = level;
            }
            input => return Err(BridgeError::NotWritable(input)),
        }
        trace!(%line, level, "drove control line");
        Ok(())
    }

    /// Sample a line once. Output lines report the level last driven.
    pub fn get(&mut self, line: ControlLine) -> Result<bool, BridgeError> {
        let level = match line {
            ControlLine::Rts => self.rts,
            ControlLine::Dtr => self.dtr,
            ControlLine::Cts => self.port.read_clear_to_send()?,
            ControlLine::Dsr => self.port.read_data_set_ready()?,
            ControlLine::Dcd => self.port.read_carrier_detect()?,
            ControlLine::Ri => self.port.read_ring_indicator()?,
        };
        trace!(%line, level, "sampled control line");
        Ok(level)
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

/// A capability for a single control line, handed to checks by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAccessor {
    line: ControlLine,
}

impl LineAccessor {
    pub fn new(line: ControlLine) -> Self {
        Self { line }
    }

    pub fn line(self) -> ControlLine {
        self.line
    }

    pub fn get<P: ControlLines>(self, bridge: &mut Bridge<P>) -> Result<bool, BridgeError> {
        bridge.get(self.line)
    }

    pub fn set<P: ControlLines>(
        self,
        bridge: &mut Bridge<P>,
        level: bool,
    ) -> Result<(), BridgeError> {
        bridge.set(self.line, level)
    }
}
