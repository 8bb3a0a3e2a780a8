//! Error types for Pythodan.
//!
//! Uses `thiserror` for ergonomic error definitions. Target parsing errors
//! live next to the parser in [`crate::types::TargetError`].

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TargetError;

/// Failure to look up a single address. Never fatal to a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("no information available: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("{0}")]
    Fault(String),
}

impl QueryError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::RateLimited(_) => "rate-limited",
            Self::Fault(_) => "fault",
        }
    }
}

/// The API key was rejected before any query was issued.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("API key rejected: {0}")]
    Rejected(String),

    #[error("no API key supplied (use -k, SHODAN_API_KEY or the settings file)")]
    Missing,

    #[error("could not verify API key")]
    Unverified(#[from] QueryError),
}

/// Errors while writing the CSV report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),
}

/// Top-level errors surfaced by the command-line shell.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("target file {path}: {reason}")]
    TargetFile { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for host lookups.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_kind() {
        assert_eq!(QueryError::NotFound("x".into()).kind(), "not-found");
        assert_eq!(QueryError::RateLimited("x".into()).kind(), "rate-limited");
        assert_eq!(QueryError::Fault("x".into()).kind(), "fault");
    }

    #[test]
    fn test_cli_error_wraps_target_error() {
        let err: CliError = TargetError::InvalidFormat("abc".into()).into();
        assert_eq!(err.to_string(), "invalid target specification: abc");
    }
}
