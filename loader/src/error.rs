//! Error types for declaration loading.
//!
//! Covers I/O, JSON/YAML decoding, spec construction, and library lookup
//! failures.

use argspec_core::SpecError;
use thiserror::Error;

/// Errors that can occur while loading declarations.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A declaration produced an invalid spec (bad range, duplicate alias...).
    #[error("invalid declaration for '{command}': {source}")]
    InvalidSpec {
        command: String,
        #[source]
        source: SpecError,
    },

    /// The file extension is neither JSON nor YAML.
    #[error("unsupported declaration format: {0}")]
    UnsupportedFormat(String),

    /// No declaration with this command name was loaded.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Two declarations share a command name.
    #[error("duplicate command declaration: {0}")]
    DuplicateCommand(String),

    /// All configured library sources failed.
    #[error("no declaration sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
