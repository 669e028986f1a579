//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring the fixture. Supports a read queue, a write log, an echo mode that
//! stands in for a TX/RX loopback bridge, and modem-control line state.

use super::error::PortError;
use super::traits::{ControlLines, SerialPortAdapter};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Inner state of the mock port, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port.
    write_log: Vec<Vec<u8>>,
    /// Feed every write back into the read queue.
    echo: bool,
    /// Whether the next operation should time out.
    should_timeout: bool,
    /// Duration reported by simulated timeouts.
    timeout: Duration,
    /// Whether buffers have been cleared.
    buffers_cleared: bool,
    /// Host-driven lines.
    rts: bool,
    dtr: bool,
    /// Sampled lines.
    cts: bool,
    dsr: bool,
    dcd: bool,
    ri: bool,
}

/// Sampled control lines that a test can force on the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockInputLine {
    Cts,
    Dsr,
    Dcd,
    Ri,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep one handle for inspection while the
/// code under test owns another.
///
/// # Example
/// ```
/// use fixture_tester::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
///
/// // Enqueue data to be read
/// port.enqueue_read(b"1\n");
///
/// let mut buffer = [0u8; 2];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"1\n");
///
/// port.write_bytes(b"READ.5V\n").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"READ.5V\n".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, wrapped in Arc<Mutex<>> for interior mutability.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Create a mock whose writes come straight back, like a port with TX
    /// bridged to RX.
    pub fn loopback(name: impl Into<String>) -> Self {
        let port = Self::new(name);
        port.state().echo = true;
        port
    }

    fn state(&self) -> MutexGuard<'_, MockPortState> {
        // A panicking test thread must not hide the log from the next assertion.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state().read_queue.extend(data);
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state().write_log.clone()
    }

    /// Clear the write log.
    pub fn clear_write_log(&mut self) {
        self.state().write_log.clear();
    }

    /// Enable or disable echo mode.
    pub fn set_echo(&mut self, echo: bool) {
        self.state().echo = echo;
    }

    /// Set whether the next read/write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state().should_timeout = should_timeout;
    }

    /// Get whether buffers have been cleared.
    pub fn was_cleared(&self) -> bool {
        self.state().buffers_cleared
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state().read_queue.len()
    }

    /// Force the level of a sampled line.
    pub fn set_input_line(&mut self, line: MockInputLine, level: bool) {
        let mut state = self.state();
        match line {
            MockInputLine::Cts => state.cts = level,
            MockInputLine::Dsr => state.dsr = level,
            MockInputLine::Dcd => state.dcd = level,
            MockInputLine::Ri => state.ri = level,
        }
    }

    /// Last level driven on RTS.
    pub fn rts(&self) -> bool {
        self.state().rts
    }

    /// Last level driven on DTR.
    pub fn dtr(&self) -> bool {
        self.state().dtr
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        state.write_log.push(data.to_vec());
        if state.echo {
            state.read_queue.extend(data);
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued_byte) => {
                    *byte = queued_byte;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        if bytes_read == 0 {
            // Simulate "would block" behavior by returning an I/O error
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }
}

impl ControlLines for MockSerialPort {
    fn write_request_to_send(&mut self, level: bool) -> Result<(), PortError> {
        self.state().rts = level;
        Ok(())
    }

    fn write_data_terminal_ready(&mut self, level: bool) -> Result<(), PortError> {
        self.state().dtr = level;
        Ok(())
    }

    fn read_clear_to_send(&mut self) -> Result<bool, PortError> {
        Ok(self.state().cts)
    }

    fn read_data_set_ready(&mut self) -> Result<bool, PortError> {
        Ok(self.state().dsr)
    }

    fn read_carrier_detect(&mut self) -> Result<bool, PortError> {
        Ok(self.state().dcd)
    }

    fn read_ring_indicator(&mut self) -> Result<bool, PortError> {
        Ok(self.state().ri)
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}
