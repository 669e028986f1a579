//! Compile and upload the probe firmware through an external toolchain.
//!
//! The tool (`arduino-cli` unless configured otherwise) is run synchronously
//! from `PATH`. Its exit status and output are captured and handed back
//! instead of being dropped.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Default toolchain binary.
pub const DEFAULT_TOOL: &str = "arduino-cli";

/// Default fully qualified board name.
pub const DEFAULT_FQBN: &str = "arduino:avr:uno";

#[derive(Debug, Error)]
pub enum FlashError {
    #[error("could not run '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' exited with {}", .0.command, .0.describe_status())]
    ToolFailed(FlashOutput),
}

/// What the tool did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashOutput {
    /// Command line, for the operator.
    pub command: String,
    /// Exit code; `None` when the tool was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl FlashOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    fn describe_status(&self) -> String {
        match self.status {
            Some(code) => format!("status {code}"),
            None => "no status (terminated by signal)".to_string(),
        }
    }
}

/// Build and flash settings for the probe firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flasher {
    pub tool: String,
    pub fqbn: String,
    pub sketch: PathBuf,
}

impl Flasher {
    pub fn new(tool: impl Into<String>, fqbn: impl Into<String>, sketch: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            fqbn: fqbn.into(),
            sketch: sketch.into(),
        }
    }

    /// Compile the firmware without uploading it.
    pub fn verify(&self) -> Result<FlashOutput, FlashError> {
        info!(sketch = %self.sketch.display(), fqbn = %self.fqbn, "verifying firmware");
        self.run(verify_args(&self.fqbn, &self.sketch))
    }

    /// Compile the firmware and upload it to the board on `port`.
    pub fn upload(&self, port: &str) -> Result<FlashOutput, FlashError> {
        info!(sketch = %self.sketch.display(), fqbn = %self.fqbn, port, "uploading firmware");
        self.run(upload_args(&self.fqbn, &self.sketch, port))
    }

    fn run(&self, args: Vec<OsString>) -> Result<FlashOutput, FlashError> {
        let command = std::iter::once(self.tool.clone())
            .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");
        debug!(%command, "running firmware tool");

        let output = Command::new(&self.tool)
            .args(&args)
            .output()
            .map_err(|source| FlashError::Spawn {
                tool: self.tool.clone(),
                source,
            })?;

        let result = FlashOutput {
            command,
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success() {
            Ok(result)
        } else {
            Err(FlashError::ToolFailed(result))
        }
    }
}

impl Default for Flasher {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL, DEFAULT_FQBN, "firmware/probe")
    }
}

/// Arguments for a compile-only run.
pub fn verify_args(fqbn: &str, sketch: &Path) -> Vec<OsString> {
    vec![
        "compile".into(),
        "--fqbn".into(),
        fqbn.into(),
        sketch.as_os_str().to_owned(),
    ]
}

/// Arguments for compile-and-upload.
pub fn upload_args(fqbn: &str, sketch: &Path, port: &str) -> Vec<OsString> {
    vec![
        "compile".into(),
        "--upload".into(),
        "--port".into(),
        port.into(),
        "--fqbn".into(),
        fqbn.into(),
        sketch.as_os_str().to_owned(),
    ]
}
