//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use worldpreview::config::ConfigError;
use worldpreview::PreviewError;

/// Exit code used when the user interrupted the render.
pub const EXIT_CANCELLED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to install the Ctrl+C handler
    Signal(String),
    /// Configuration file could not be used
    Config(ConfigError),
    /// Command line values that cannot be rendered
    InvalidArgs(String),
    /// The preview engine failed to start or render
    Render(PreviewError),
    /// Failed to write the output image
    ImageWrite {
        path: PathBuf,
        error: image::ImageError,
    },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Render(e) if e.is_cancellation() => EXIT_CANCELLED,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Render(PreviewError::InvalidGeometry { .. }) => {
                eprintln!();
                eprintln!("Width, height and scale must all be at least 1, and");
                eprintln!("width × scale and height × scale must fit in a 32-bit world.");
            }
            CliError::Config(ConfigError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Colors are written as #RRGGBB or #RRGGBBAA; sizes and");
                eprintln!("thread counts must be positive integers.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Signal(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::Render(e) if e.is_cancellation() => write!(f, "Render aborted: {}", e),
            CliError::Render(e) => write!(f, "Failed to render preview: {}", e),
            CliError::ImageWrite { path, error } => {
                write!(f, "Failed to write image '{}': {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::ImageWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<PreviewError> for CliError {
    fn from(e: PreviewError) -> Self {
        CliError::Render(e)
    }
}
