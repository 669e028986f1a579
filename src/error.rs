use crate::config::ConfigError;
use crate::flash::FlashError;
use crate::port::PortError;
use crate::probe::ProbeError;
use crate::sequencer::SequenceError;
use thiserror::Error;

/// Unified application error type.
///
/// Everything here ends the process. Checks that read the wrong level are
/// not errors; they end up in the `Report`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not open {role} port '{port}': {source}")]
    Open {
        role: &'static str,
        port: String,
        #[source]
        source: PortError,
    },

    #[error("A serial port error occurred: {0}")]
    Port(#[from] PortError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Test run aborted: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Firmware tool error: {0}")]
    Flash(#[from] FlashError),
}

impl AppError {
    /// Process exit code for this error.
    ///
    /// A failing firmware tool is reported like a failed check (1); anything
    /// that stopped the tool itself from running is 2.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Flash(FlashError::ToolFailed(_)) => 1,
            _ => 2,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
