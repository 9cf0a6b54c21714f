//! CLI error types.

use std::fmt;

use error_stack::Report;
use insticator_common::error::InsticatorError;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file error
    Config(String),
    /// Fixture file could not be parsed
    Fixture(String),
    /// Adapter rejected the input
    Adapter(String),
    /// IO error
    Io(std::io::Error),
    /// TOML parsing error
    Toml(String),
    /// HTTP request error
    Http(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Fixture(msg) => write!(f, "Fixture error: {}", msg),
            CliError::Adapter(msg) => write!(f, "Adapter error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Toml(msg) => write!(f, "TOML error: {}", msg),
            CliError::Http(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Toml(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Fixture(err.to_string())
    }
}

impl From<Report<InsticatorError>> for CliError {
    fn from(report: Report<InsticatorError>) -> Self {
        match report.current_context() {
            InsticatorError::Configuration { .. } => CliError::Config(format!("{report:?}")),
            InsticatorError::Transport { .. } => CliError::Http(format!("{report:?}")),
            _ => CliError::Adapter(format!("{report:?}")),
        }
    }
}
