//! Configuration module for fixture-tester.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `--config <path>` on the command line
//! 2. `FIXTURE_TESTER_CONFIG` environment variable (explicit path)
//! 3. `./fixture-tester.toml` (current directory)
//! 4. `~/.config/fixture-tester/config.toml` (XDG on Linux/macOS)
//! 5. `%APPDATA%\fixture-tester\config.toml` (Windows)
//! 6. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `FIXTURE_TESTER_<SECTION>_<KEY>`
//!
//! Examples:
//! - `FIXTURE_TESTER_SERIAL_BAUD=9600`
//! - `FIXTURE_TESTER_PROBE_STARTUP_DELAY_MS=3000`
//! - `FIXTURE_TESTER_FLASH_TOOL=/opt/arduino/arduino-cli`
//!
//! # Example
//!
//! ```toml
//! [serial]
//! baud = 115200
//! timeout_ms = 1000
//!
//! [serial.port_aliases]
//! probe = "/dev/ttyACM0"
//! bridge = "/dev/ttyUSB1"
//!
//! [flash]
//! fqbn = "arduino:avr:nano"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, validate, ConfigLoader};
pub use schema::{
    Config, FlashConfig, LogFormat, LoggingConfig, ProbeConfig, SequencerConfig, SerialConfig,
};
