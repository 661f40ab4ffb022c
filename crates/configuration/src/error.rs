//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

/// The errors that can be thrown when reading a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path:?}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("did not find a 'version' tag in {0:?}")]
    DidNotFindExpectedVersionTag(PathBuf),

    #[error("unsupported configuration version {version} in {file_path:?}, expected {expected}")]
    UnsupportedVersion {
        file_path: PathBuf,
        version: u64,
        expected: u32,
    },

    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("could not serialize the configuration: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// The metadata of a parsed configuration does not hang together.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("entity '{entity}' has no column '{column}'")]
    UnknownColumn { entity: String, column: String },

    #[error("association '{association}' of entity '{entity}' targets unknown entity '{target}'")]
    UnknownAssociationTarget {
        entity: String,
        association: String,
        target: String,
    },
}
