//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use crate::sequencer::{LOOPBACK_ITERATIONS, SETTLE_DELAY};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "FIXTURE_TESTER";

/// Config file name in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "fixture-tester.toml";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory under the per-user config directory
const APP_DIR: &str = "fixture-tester";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "FIXTURE_TESTER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `FIXTURE_TESTER_CONFIG` environment variable (explicit path)
    /// 2. `./fixture-tester.toml` (current directory)
    /// 3. `~/.config/fixture-tester/config.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\fixture-tester\config.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;

        debug!(path = ?config_path, "configuration loaded");
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || validate(&config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Get the default per-user config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn env_var(key: &str) -> Option<(String, String)> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&var).ok().map(|val| (var, val))
}

fn parse_env<T: std::str::FromStr>(var: &str, val: &str, what: &str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}")))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `FIXTURE_TESTER_<SECTION>_<KEY>`
/// For example:
/// - `FIXTURE_TESTER_SERIAL_BAUD=9600`
/// - `FIXTURE_TESTER_SEQUENCER_SETTLE_DELAY_MS=500`
/// - `FIXTURE_TESTER_FLASH_FQBN=arduino:avr:nano`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Some((var, val)) = env_var("SERIAL_BAUD") {
        config.serial.baud = parse_env(&var, &val, "baud rate")?;
    }
    if let Some((var, val)) = env_var("SERIAL_TIMEOUT_MS") {
        config.serial.timeout_ms = parse_env(&var, &val, "timeout")?;
    }

    // Probe overrides
    if let Some((var, val)) = env_var("PROBE_STARTUP_DELAY_MS") {
        config.probe.startup_delay_ms = parse_env(&var, &val, "delay")?;
    }

    // Sequencer overrides
    if let Some((var, val)) = env_var("SEQUENCER_SETTLE_DELAY_MS") {
        config.sequencer.settle_delay_ms = parse_env(&var, &val, "delay")?;
    }
    if let Some((var, val)) = env_var("SEQUENCER_LOOPBACK_ITERATIONS") {
        config.sequencer.loopback_iterations = parse_env(&var, &val, "iteration count")?;
    }

    // Flash overrides
    if let Some((_, val)) = env_var("FLASH_TOOL") {
        config.flash.tool = val;
    }
    if let Some((_, val)) = env_var("FLASH_FQBN") {
        config.flash.fqbn = val;
    }
    if let Some((_, val)) = env_var("FLASH_SKETCH") {
        config.flash.sketch = PathBuf::from(val);
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}

/// Reject values the fixture cannot run with.
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.serial.baud == 0 {
        return Err(ConfigError::validation("serial.baud", "must be greater than 0"));
    }
    if config.serial.timeout_ms == 0 {
        return Err(ConfigError::validation(
            "serial.timeout_ms",
            "must be greater than 0, reads would never time out",
        ));
    }
    if u128::from(config.sequencer.settle_delay_ms) < SETTLE_DELAY.as_millis() {
        return Err(ConfigError::validation(
            "sequencer.settle_delay_ms",
            format!(
                "must be at least {} ms, lines need time to settle after a probe write",
                SETTLE_DELAY.as_millis()
            ),
        ));
    }
    if config.sequencer.loopback_iterations < LOOPBACK_ITERATIONS {
        return Err(ConfigError::validation(
            "sequencer.loopback_iterations",
            format!("must be at least {LOOPBACK_ITERATIONS}"),
        ));
    }
    Ok(())
}
