//! # Error Types
//!
//! Custom error types for padmap using `thiserror`.
//!
//! Only the outer shell (device discovery, uinput setup, config file I/O)
//! returns these. The control engine itself never fails at runtime: lookup
//! misses and collaborator failures are absorbed and logged.

use thiserror::Error;

/// Main error type for padmap
#[derive(Debug, Error)]
pub enum PadmapError {
    /// Configuration errors that prevent a file from being used at all
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable game controller was found under `/dev/input`
    #[error("No game controller found")]
    ControllerNotFound,

    /// Controller device errors (open, grab, read)
    #[error("Controller error: {0}")]
    Controller(String),

    /// Virtual output device errors
    #[error("Output device error: {0}")]
    Output(String),

    /// Settings could not be rendered for `--dump`
    #[error("Dump error: {0}")]
    Dump(#[from] toml::ser::Error),
}

/// Result type alias for padmap
pub type Result<T> = std::result::Result<T, PadmapError>;
