//! Errors raised while locating, reading and checking the fixture config.

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration could not be produced.
///
/// All of these are fatal before any port is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("Config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("Could not read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has a field of the wrong type.
    #[error("Config file is not valid: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value parsed but the fixture cannot run with it.
    /// `key` is the dotted TOML path, e.g. `sequencer.settle_delay_ms`.
    #[error("{key} {message}")]
    ValidationError { key: String, message: String },

    /// A `FIXTURE_TESTER_*` override did not parse.
    #[error("{var}: {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
