//! Migration record definition

use crate::source::{registry, SourceError};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Position of a migration step in the overall sequence
pub type Version = u64;

/// Direction of a migration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the migration
    Up,
    /// Roll the migration back
    Down,
}

impl Direction {
    /// Lowercase marker used in migration file names
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(SourceError::Parse(format!("unknown direction '{other}'"))),
        }
    }
}

/// Run status of a migration step
///
/// Every record starts out `Pending`. `Done`, `Failed` and `Skipped` are
/// terminal: once reached, the record keeps that status for the rest of the
/// run. A fresh run needs a fresh index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Pending,
    Done,
    Failed,
    Skipped,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Done => "done",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
        }
    }

    /// Whether no further transition is allowed out of this status
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "done" => Ok(Status::Done),
            "failed" => Ok(Status::Failed),
            "skipped" => Ok(Status::Skipped),
            other => Err(SourceError::Parse(format!("unknown status '{other}'"))),
        }
    }
}

/// One discovered migration step
///
/// Version, identifier, direction and raw location are fixed once the record
/// is built. Status and error text are only changed by the owning
/// [`Migrations`](crate::source::Migrations) index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    version: Version,
    identifier: String,
    direction: Direction,
    raw: String,
    status: Status,
    error: String,
}

impl Migration {
    /// Create a pending migration record
    pub fn new(
        version: Version,
        identifier: impl Into<String>,
        direction: Direction,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            version,
            identifier: identifier.into(),
            direction,
            raw: raw.into(),
            status: Status::Pending,
            error: String::new(),
        }
    }

    /// Replace the raw location (drivers set it after parsing a bare file name)
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Free-form label taken from the source name
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Backend-specific location reference, e.g. a path relative to the source root
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Last path segment of the raw location, the key used for registry lookups
    #[must_use]
    pub fn basename(&self) -> &str {
        registry::basename_of(&self.raw)
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Error text, empty unless the step failed
    #[must_use]
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Move to `status`, recording `error` alongside it
    ///
    /// Returns `false` (and leaves the record alone) when the record already
    /// sits in a different terminal status. Re-applying the current terminal
    /// status is accepted and refreshes the error text.
    pub(crate) fn transition(&mut self, status: Status, error: &str) -> bool {
        if self.status.is_terminal() && self.status != status {
            return false;
        }
        self.status = status;
        self.error = error.to_string();
        true
    }
}
