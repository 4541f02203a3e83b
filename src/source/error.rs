//! Source-specific error types

use crate::source::{Direction, Version};
use thiserror::Error;

/// Result alias used across the source drivers
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised while discovering or reading migrations
#[derive(Debug, Error)]
pub enum SourceError {
    /// No record is indexed for the requested position
    #[error("migration does not exist: {op} in {location}")]
    NotFound { op: String, location: String },

    /// Two source entries parsed to the same version and direction
    #[error("duplicate migration {version}.{direction}: {location}")]
    DuplicateMigration {
        version: Version,
        direction: Direction,
        location: String,
    },

    /// Name does not follow the migration naming grammar
    #[error("invalid migration name: {0}")]
    Parse(String),

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Storage backend reported a failure
    #[error("backend error at {location}: {message}")]
    Backend { location: String, message: String },

    #[error("read of {location} was cancelled")]
    Cancelled { location: String },

    #[error("no driver registered for scheme '{0}'")]
    UnknownScheme(String),

    #[error("invalid source locator: {0}")]
    InvalidLocator(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("driver is closed")]
    Closed,

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl SourceError {
    pub(crate) fn not_found(op: impl Into<String>, location: impl Into<String>) -> Self {
        SourceError::NotFound {
            op: op.into(),
            location: location.into(),
        }
    }

    pub(crate) fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        SourceError::Io {
            location: location.into(),
            source,
        }
    }

    /// Whether this error means "no such migration" rather than a failure
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }
}
