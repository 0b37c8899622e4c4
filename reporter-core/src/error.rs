use std::path::PathBuf;

use thiserror::Error;

/// Every way a lookup or a log operation can fail.
///
/// All variants are terminal for the current invocation; nothing is retried.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("invalid city name: {0}")]
    InvalidInput(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("city not found: {0}")]
    NotFound(String),

    #[error("network request failed: {context}")]
    Network {
        context: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("could not parse provider response: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReporterError {
    pub(crate) fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network { context: context.into(), source: Some(source) }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into(), source: None }
    }

    /// Process exit code used by the CLI for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::Auth(_) => 3,
            Self::NotFound(_) => 4,
            Self::Network { .. } => 5,
            Self::Parse { .. } => 6,
            Self::Storage(_) => 7,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("log file '{0}' does not exist")]
    Missing(PathBuf),

    #[error("failed to create log directory '{0}'")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("failed to open log file '{0}'")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("failed to write to log file '{0}'")]
    Write(PathBuf, #[source] csv::Error),

    #[error("failed to read log file '{0}'")]
    Read(PathBuf, #[source] csv::Error),

    #[error("log file '{path}' has an unexpected header: {found}")]
    Header { path: PathBuf, found: String },

    #[error("malformed row on line {line} of log file '{path}'")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("invalid row on line {line} of log file '{path}': {reason}")]
    InvalidRow { path: PathBuf, line: u64, reason: String },
}
