//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent
//! formatting and appropriate exit codes.

use panomap::error::CaptureError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Capture run failed
    Capture(CaptureError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Capture(CaptureError::InvalidGrid(_)) => {
                eprintln!();
                eprintln!("Check the tiling parameters:");
                eprintln!("  1. --tile-overlap must be smaller than --tile-resolution");
                eprintln!("  2. --width and --height must be positive");
                eprintln!("  3. The capture bounds must span a non-zero area");
            }
            CliError::Capture(CaptureError::Cancelled) => {
                // Not a failure; exit quietly with a distinct code.
                process::exit(130);
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Capture(err) => write!(f, "Capture failed: {}", err),
        }
    }
}

impl From<CaptureError> for CliError {
    fn from(err: CaptureError) -> Self {
        CliError::Capture(err)
    }
}
