//! Line-oriented helpers over a `SerialPortAdapter`, plus port enumeration.

use super::error::PortError;
use super::traits::SerialPortAdapter;
use serialport::SerialPortType;
use tracing::trace;

/// Upper bound on a single line; the probe never sends more than a few bytes.
pub const MAX_LINE_LEN: usize = 256;

/// Read one line, newline included.
///
/// Stops at `\n`, after `max_len` bytes, or when the port's read timeout
/// passes with nothing received. A timeout ends the line early and is not an
/// error: a stalled device yields a short (possibly empty) line and the caller
/// decides what that means. Any other transport error is returned.
pub fn read_line<P>(port: &mut P, max_len: usize) -> Result<Vec<u8>, PortError>
where
    P: SerialPortAdapter + ?Sized,
{
    let mut line = Vec::with_capacity(16);
    let mut byte = [0u8; 1];

    while line.len() < max_len {
        match port.read_bytes(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.is_timeout() => {
                trace!(port = port.name(), received = line.len(), "line read timed out");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(line)
}

/// One entry of the system's serial port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub kind: String,
    pub product: Option<String>,
}

/// List serial ports visible to the system.
pub fn list_ports() -> Result<Vec<PortSummary>, PortError> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, product) = match port.port_type {
                SerialPortType::UsbPort(usb) => (
                    format!("USB {:04x}:{:04x}", usb.vid, usb.pid),
                    usb.product.or(usb.manufacturer),
                ),
                SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None),
                SerialPortType::PciPort => ("PCI".to_string(), None),
                SerialPortType::Unknown => ("Unknown".to_string(), None),
            };
            PortSummary {
                name: port.port_name,
                kind,
                product,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;

    #[test]
    fn test_reads_up_to_newline() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"1\r\n0\n");

        assert_eq!(read_line(&mut port, MAX_LINE_LEN).unwrap(), b"1\r\n");
        assert_eq!(read_line(&mut port, MAX_LINE_LEN).unwrap(), b"0\n");
    }

    #[test]
    fn test_timeout_returns_partial_line() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Loop");

        assert_eq!(read_line(&mut port, MAX_LINE_LEN).unwrap(), b"Loop");
        assert!(read_line(&mut port, MAX_LINE_LEN).unwrap().is_empty());
    }

    #[test]
    fn test_stops_at_max_len() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"abcdef\n");

        assert_eq!(read_line(&mut port, 3).unwrap(), b"abc");
        assert_eq!(port.available_bytes(), 4);
    }

    #[test]
    fn test_simulated_timeout_is_not_an_error() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_should_timeout(true);

        assert!(read_line(&mut port, MAX_LINE_LEN).unwrap().is_empty());
    }
}
