//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` covers the byte stream, `ControlLines` covers the
//! modem-control signals a USB-serial bridge exposes. Real ports and mocks
//! implement both so the probe client and the bridge accessor never see
//! `serialport` directly.

use super::error::PortError;
use std::time::Duration;

/// Default baud rate used for both fixture connections.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout; the only cancellation mechanism for a stalled device.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration parameters for a serial port.
#[derive(Debug, Clone)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Read/write timeout.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PortConfiguration {
    /// 8N1 without flow control at the given baud rate and timeout.
    pub fn new(baud_rate: u32, timeout: Duration) -> Self {
        Self {
            baud_rate,
            timeout,
            ..Default::default()
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
///
/// Hardware flow control would let the driver own RTS/CTS, so the fixture
/// always runs with `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// This trait abstracts over synchronous serial port operations, allowing both
/// real hardware ports and mock implementations for testing.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Clear both input and output buffers.
    fn clear_buffers(&mut self) -> Result<(), PortError>;

    /// Write the whole buffer, looping over short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), PortError> {
        while !data.is_empty() {
            match self.write_bytes(data)? {
                0 => {
                    return Err(PortError::Io(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "serial port accepted no bytes",
                    )))
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }
}

/// Modem-control signals of a serial port.
///
/// RTS and DTR are driven by the host; CTS, DSR, DCD and RI are sampled.
/// A single read is authoritative: implementations must not debounce.
pub trait ControlLines {
    /// Drive the Request To Send line.
    fn write_request_to_send(&mut self, level: bool) -> Result<(), PortError>;

    /// Drive the Data Terminal Ready line.
    fn write_data_terminal_ready(&mut self, level: bool) -> Result<(), PortError>;

    /// Sample the Clear To Send line.
    fn read_clear_to_send(&mut self) -> Result<bool, PortError>;

    /// Sample the Data Set Ready line.
    fn read_data_set_ready(&mut self) -> Result<bool, PortError>;

    /// Sample the Data Carrier Detect line.
    fn read_carrier_detect(&mut self) -> Result<bool, PortError>;

    /// Sample the Ring Indicator line.
    fn read_ring_indicator(&mut self) -> Result<bool, PortError>;
}
