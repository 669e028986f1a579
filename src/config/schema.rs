//! Configuration schema definitions.
//!
//! Every section has defaults matching the fixture, so an empty (or missing)
//! file is a valid configuration.

use crate::flash::{Flasher, DEFAULT_FQBN, DEFAULT_TOOL};
use crate::port::PortConfiguration;
use crate::sequencer::SequencerSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Probe device configuration
    pub probe: ProbeConfig,
    /// Check sequencing configuration
    pub sequencer: SequencerConfig,
    /// Firmware toolchain configuration
    pub flash: FlashConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Serial port configuration section, applied to both connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate
    pub baud: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// Port aliases, e.g. `probe = "/dev/ttyACM0"`
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: 115_200,
            timeout_ms: 1000,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Get the read timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration::new(self.baud, self.timeout())
    }
}

/// Probe device section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Time the probe needs to boot after its port is opened
    pub startup_delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 2000,
        }
    }
}

impl ProbeConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

/// Check sequencing section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Wait between a probe write and the line sample, at least 300
    pub settle_delay_ms: u64,
    /// Loopback round-trips, at least 1000
    pub loopback_iterations: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let defaults = SequencerSettings::default();
        Self {
            settle_delay_ms: defaults.settle_delay.as_millis() as u64,
            loopback_iterations: defaults.loopback_iterations,
        }
    }
}

impl SequencerConfig {
    pub fn settings(&self) -> SequencerSettings {
        SequencerSettings {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            loopback_iterations: self.loopback_iterations,
        }
    }
}

/// Firmware toolchain section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    /// Toolchain binary, looked up on PATH
    pub tool: String,
    /// Fully qualified board name
    pub fqbn: String,
    /// Sketch directory of the probe firmware
    pub sketch: PathBuf,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            fqbn: DEFAULT_FQBN.to_string(),
            sketch: PathBuf::from("firmware/probe"),
        }
    }
}

impl FlashConfig {
    pub fn flasher(&self) -> Flasher {
        Flasher::new(self.tool.clone(), self.fqbn.clone(), self.sketch.clone())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line format with colors
    Pretty,
    /// Single-line format
    #[default]
    Compact,
}
