//! Termination of the foreground game process on the quit combo.

use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

/// Terminates the configured foreground process.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessControl {
    /// Requests termination.
    ///
    /// # Returns
    ///
    /// `true` if the process was signalled.
    fn terminate(&mut self) -> bool;
}

/// Terminates processes by command line using `pkill -f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkillProcess {
    name: String,
    sudo: bool,
}

impl PkillProcess {
    /// # Arguments
    ///
    /// * `name` - Pattern matched against full command lines
    /// * `sudo` - Run `pkill` through `sudo`
    #[must_use]
    pub fn new(name: impl Into<String>, sudo: bool) -> Self {
        Self {
            name: name.into(),
            sudo,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command that would be run, for logging and tests.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut command = if self.sudo {
            let mut command = Command::new("sudo");
            command.arg("pkill");
            command
        } else {
            Command::new("pkill")
        };
        command
            .arg("-f")
            .arg(&self.name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl ProcessControl for PkillProcess {
    fn terminate(&mut self) -> bool {
        info!("Killing process \"{}\"", self.name);

        match self.command().status() {
            Ok(status) if status.success() => true,
            Ok(status) => {
                warn!("pkill \"{}\" exited with {}", self.name, status);
                false
            }
            Err(e) => {
                debug!("Failed to run pkill: {}", e);
                false
            }
        }
    }
}
