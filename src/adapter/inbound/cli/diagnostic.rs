//! Miette-based error diagnostics for CLI error presentation.

use miette::Diagnostic;
use thiserror::Error;

use crate::error::{ConfigError, Error};

/// Error reported by a CLI command.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(quote_refresh::config),
        help("check the config file and the MARKET_DATA_* / PIPELINE_REFRESH_* / IB_* environment variables")
    )]
    Config(#[source] ConfigError),

    #[error("cannot read {path}: {message}")]
    #[diagnostic(code(quote_refresh::input))]
    Input {
        path: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{0}")]
    #[diagnostic(code(quote_refresh::runtime))]
    Runtime(String),
}

impl CliError {
    /// Input file problem with an optional hint.
    #[must_use]
    pub fn input(path: impl Into<String>, message: impl ToString, help: Option<&str>) -> Self {
        Self::Input {
            path: path.into(),
            message: message.to_string(),
            help: help.map(str::to_string),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        match err {
            Error::Config(err) => Self::Config(err),
            other => Self::Runtime(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Runtime(format!("failed to render output: {err}"))
    }
}
