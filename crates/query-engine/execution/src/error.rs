//! Errors of running statements, and how to treat them.

use std::time::Duration;

/// What went wrong, independent of the database vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    /// Integrity or concurrency conflicts.
    Conflict,
    Unauthorized,
    /// The statement was rejected, for example for its syntax or its data.
    Client,
    ResourceExhausted,
    Connection,
    Timeout,
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error{}: {message}", code_suffix(.code))]
    Database {
        kind: ErrorKind,
        code: Option<String>,
        message: String,
    },
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("query was cancelled")]
    Cancelled,
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|code| format!(" {code}")).unwrap_or_default()
}

impl Error {
    /// An error reported by the database, classified by its code.
    pub fn database(code: Option<&str>, message: impl Into<String>) -> Error {
        Error::Database {
            kind: code.map_or(ErrorKind::Client, classify),
            code: code.map(ToString::to_string),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Database { kind, .. } => *kind,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::UnexpectedResult(_) => ErrorKind::Client,
        }
    }

    /// Whether running the same statement again may succeed.
    /// Only transient transport and resource failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ResourceExhausted | ErrorKind::Connection | ErrorKind::Timeout
        )
    }
}

/// Classify a SQLSTATE code.
pub fn classify(code: &str) -> ErrorKind {
    match code {
        "42501" => ErrorKind::Unauthorized,
        "57014" => ErrorKind::Cancelled,
        "57P01" | "57P02" | "57P03" => ErrorKind::Connection,
        _ => match code.get(..2) {
            Some("02") => ErrorKind::NotFound,
            Some("23" | "40") => ErrorKind::Conflict,
            Some("28") => ErrorKind::Unauthorized,
            Some("53" | "54") => ErrorKind::ResourceExhausted,
            Some("08") => ErrorKind::Connection,
            _ => ErrorKind::Client,
        },
    }
}
