//! Fixture Tester Library
//!
//! Drives a serial test fixture: a probe microcontroller answering line
//! commands on one port, and a USB-serial bridge whose handshake lines are
//! wired to the board under test on the other.
//!
//! # Modules
//!
//! - `port`: Port abstraction layer for serial communication
//! - `pin`: Logical pins of the fixture
//! - `probe`: Probe firmware protocol client
//! - `bridge`: Bridge control-line accessor
//! - `check`: Check outcomes and console rendering
//! - `sequencer`: Ordered check battery and loopback stress test
//! - `flash`: Firmware build/upload through an external toolchain
//! - `config`: Configuration management with TOML support
//! - `logging`: Tracing subscriber setup
//! - `error`: Unified error handling

pub mod bridge;
pub mod check;
pub mod config;
pub mod error;
pub mod flash;
pub mod logging;
pub mod pin;
pub mod port;
pub mod probe;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use bridge::{Bridge, BridgeError, ControlLine, Direction, LineAccessor};
pub use check::{CheckResult, Outcome, Report};
pub use error::{AppError, AppResult};
pub use flash::{FlashError, FlashOutput, Flasher};
pub use pin::LogicalPin;
pub use port::{
    ControlLines, MockSerialPort, PortConfiguration, PortError, SerialPortAdapter, SyncSerialPort,
};
pub use probe::{ProbeClient, ProbeError};
pub use sequencer::{SequenceError, Sequencer, SequencerSettings, TestContext};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
