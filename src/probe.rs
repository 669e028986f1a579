//! Client for the probe firmware's line protocol.
//!
//! Requests are ASCII lines: `READ.<PIN>\n` answered by a line whose first
//! byte is `1` or `0`, and `WRITE1.<PIN>\n` / `WRITE0.<PIN>\n` which get no
//! answer.

use crate::pin::LogicalPin;
use crate::port::{read_line, PortError, SerialPortAdapter, MAX_LINE_LEN};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while talking to the probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The response did not start with `1` or `0`. Carries the raw bytes.
    #[error("Expected 1 or 0 from probe, got {}", describe_bytes(.0))]
    Protocol(Vec<u8>),

    #[error(transparent)]
    Port(#[from] PortError),
}

fn describe_bytes(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        "nothing (read timed out)".to_string()
    } else {
        format!("{:?}", String::from_utf8_lossy(bytes))
    }
}

/// Decode a probe response line into a pin reading.
pub fn decode_reading(response: &[u8]) -> Result<bool, ProbeError> {
    match response.first() {
        Some(b'1') => Ok(true),
        Some(b'0') => Ok(false),
        _ => Err(ProbeError::Protocol(response.to_vec())),
    }
}

/// Encode a `READ` request.
pub fn read_command(pin: LogicalPin) -> Vec<u8> {
    format!("READ.{}\n", pin).into_bytes()
}

/// Encode a `WRITE0`/`WRITE1` request.
pub fn write_command(pin: LogicalPin, high: bool) -> Vec<u8> {
    let level = if high { '1' } else { '0' };
    format!("WRITE{}.{}\n", level, pin).into_bytes()
}

/// Probe protocol client over any serial transport.
#[derive(Debug)]
pub struct ProbeClient<P> {
    port: P,
}

impl<P: SerialPortAdapter> ProbeClient<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    /// Wait for the probe to come out of reset, then drop whatever it printed
    /// while booting.
    ///
    /// Opening the port toggles DTR, which resets most development boards.
    pub fn wait_ready(&mut self, delay: Duration) -> Result<(), ProbeError> {
        debug!(port = self.port.name(), ?delay, "waiting for probe to boot");
        thread::sleep(delay);
        self.port.clear_buffers()?;
        Ok(())
    }

    /// Ask the probe for the level of `pin`.
    pub fn read_pin(&mut self, pin: LogicalPin) -> Result<bool, ProbeError> {
        self.port.write_all_bytes(&read_command(pin))?;
        let response = read_line(&mut self.port, MAX_LINE_LEN)?;
        trace!(%pin, response = ?String::from_utf8_lossy(&response), "probe response");

        let level = decode_reading(&response)?;
        debug!(%pin, level, "read pin");
        Ok(level)
    }

    /// Tell the probe to drive `pin` high or low.
    pub fn write_pin(&mut self, pin: LogicalPin, high: bool) -> Result<(), ProbeError> {
        self.port.write_all_bytes(&write_command(pin, high))?;
        debug!(%pin, high, "wrote pin");
        Ok(())
    }
}
