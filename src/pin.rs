//! Logical pins of the fixture.

use crate::bridge::ControlLine;
use std::fmt;
use std::str::FromStr;

/// A signal the fixture can check, named the way the probe firmware names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalPin {
    FiveVolt,
    ThreeVoltThree,
    Ground,
    Rts,
    Dtr,
    Cts,
    Dsr,
    Dcd,
    Ri,
}

impl LogicalPin {
    /// Every pin, in battery order.
    pub const ALL: [LogicalPin; 9] = [
        LogicalPin::FiveVolt,
        LogicalPin::ThreeVoltThree,
        LogicalPin::Ground,
        LogicalPin::Rts,
        LogicalPin::Dtr,
        LogicalPin::Cts,
        LogicalPin::Dsr,
        LogicalPin::Dcd,
        LogicalPin::Ri,
    ];

    /// Name used on the wire (`READ.<name>`).
    pub fn wire_name(self) -> &'static str {
        match self {
            LogicalPin::FiveVolt => "5V",
            LogicalPin::ThreeVoltThree => "3V3",
            LogicalPin::Ground => "GND",
            LogicalPin::Rts => "RTS",
            LogicalPin::Dtr => "DTR",
            LogicalPin::Cts => "CTS",
            LogicalPin::Dsr => "DSR",
            LogicalPin::Dcd => "DCD",
            LogicalPin::Ri => "RI",
        }
    }

    /// The bridge line wired to this pin, if any. Rails and ground have none.
    pub fn control_line(self) -> Option<ControlLine> {
        match self {
            LogicalPin::Rts => Some(ControlLine::Rts),
            LogicalPin::Dtr => Some(ControlLine::Dtr),
            LogicalPin::Cts => Some(ControlLine::Cts),
            LogicalPin::Dsr => Some(ControlLine::Dsr),
            LogicalPin::Dcd => Some(ControlLine::Dcd),
            LogicalPin::Ri => Some(ControlLine::Ri),
            LogicalPin::FiveVolt | LogicalPin::ThreeVoltThree | LogicalPin::Ground => None,
        }
    }
}

impl fmt::Display for LogicalPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Returned when a string names no known pin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pin '{0}'")]
pub struct UnknownPin(pub String);

impl FromStr for LogicalPin {
    type Err = UnknownPin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalPin::ALL
            .iter()
            .copied()
            .find(|pin| pin.wire_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPin(s.to_string()))
    }
}
