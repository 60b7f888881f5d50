//! Error types for repocontext: error kinds and propagation policy.

use std::fmt;
use thiserror::Error;

/// Error kinds returned at the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotInitialized,
    NotFound,
    InvalidPath,
    InvalidChunkId,
    Corrupt,
    IoFailure,
    SqlFailure,
    ParseError,
    ParserUnavailable,
    UnsupportedRegex,
    UnsupportedFormat,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotInitialized => "not_initialized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidPath => "invalid_path",
            ErrorKind::InvalidChunkId => "invalid_chunk_id",
            ErrorKind::Corrupt => "corrupt",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::SqlFailure => "sql_failure",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::ParserUnavailable => "parser_unavailable",
            ErrorKind::UnsupportedRegex => "unsupported_regex",
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repository index error type.
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct RepoContextError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl RepoContextError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors, one per ErrorKind.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotInitialized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPath, message)
    }

    pub fn invalid_chunk_id(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidChunkId, message)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corrupt, message)
    }

    pub fn io_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoFailure, message)
    }

    pub fn sql_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SqlFailure, message)
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn parser_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParserUnavailable, message)
    }

    pub fn unsupported_regex(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedRegex, message)
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFormat, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }
}

impl From<rusqlite::Error> for RepoContextError {
    fn from(err: rusqlite::Error) -> Self {
        RepoContextError::sql_failure(format!("sqlite error: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for RepoContextError {
    fn from(err: serde_json::Error) -> Self {
        RepoContextError::corrupt(format!("json error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for RepoContextError {
    fn from(err: std::io::Error) -> Self {
        RepoContextError::io_failure(format!("io error: {}", err)).with_source(err)
    }
}

impl From<rmp_serde::encode::Error> for RepoContextError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        RepoContextError::corrupt(format!("chunk encode error: {}", err)).with_source(err)
    }
}

impl From<rmp_serde::decode::Error> for RepoContextError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        RepoContextError::corrupt(format!("chunk decode error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RepoContextError>;
