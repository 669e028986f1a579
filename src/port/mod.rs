//! Port abstraction layer for serial communication.
//!
//! Provides the traits the fixture code is written against, the real
//! `serialport`-backed implementation, a mock for tests, and line-oriented
//! helpers on top of the raw byte stream.

pub mod error;
pub mod line;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use line::{list_ports, read_line, PortSummary, MAX_LINE_LEN};
pub use mock::{MockInputLine, MockSerialPort};
pub use sync_port::*;
pub use traits::*;
