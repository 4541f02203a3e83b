//! Driver contract and locator-based opening

use crate::source::file::FileMedium;
use crate::source::registry::MigrationFn;
use crate::source::{
    Direction, MediumDriver, Migrations, SourceError, SourceResult, Status, Version,
};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::{LazyLock, PoisonError, RwLock};

/// Content of a migration step as handed to the runner
///
/// A registered function takes precedence over the stored content, so
/// exactly one of the two is ever returned for a read.
pub enum MigrationBody {
    /// Raw bytes of a file-content migration
    Stream(Box<dyn Read + Send>),
    /// Code-defined step registered for the record's basename
    Func(MigrationFn),
}

impl MigrationBody {
    #[must_use]
    pub fn func(&self) -> Option<&MigrationFn> {
        match self {
            MigrationBody::Func(func) => Some(func),
            MigrationBody::Stream(_) => None,
        }
    }

    #[must_use]
    pub fn into_stream(self) -> Option<Box<dyn Read + Send>> {
        match self {
            MigrationBody::Stream(stream) => Some(stream),
            MigrationBody::Func(_) => None,
        }
    }
}

impl fmt::Debug for MigrationBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationBody::Stream(_) => f.write_str("Stream(..)"),
            MigrationBody::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Result of a successful `read_up` / `read_down`
#[derive(Debug)]
pub struct ReadMigration {
    pub body: MigrationBody,
    pub identifier: String,
    /// Raw location of the record, for diagnostics
    pub location: String,
}

/// Capability set every storage backend provides
///
/// Drivers are opened with a full discovery pass already done, so
/// navigation and status calls only touch the in-memory index. Only reads
/// go back to the storage medium.
pub trait Driver: Send {
    /// Release the underlying medium. A second call returns `SourceError::Closed`.
    fn close(&mut self) -> SourceResult<()>;

    fn first(&self) -> SourceResult<Version>;

    fn prev(&self, version: Version) -> SourceResult<Version>;

    fn next(&self, version: Version) -> SourceResult<Version>;

    fn read_up(&self, version: Version) -> SourceResult<ReadMigration>;

    fn read_down(&self, version: Version) -> SourceResult<ReadMigration>;

    fn mark_skip_migrations(&mut self, version: Version, direction: Direction);

    fn update_status(&mut self, version: Version, status: Status, error: &str);

    fn print_summary(&self, direction: Direction);

    /// Read access to the driver's index
    fn migrations(&self) -> &Migrations;
}

/// Builds a driver from a full locator such as `file://migrations`
pub type DriverOpener = fn(&str) -> SourceResult<Box<dyn Driver>>;

static DRIVERS: LazyLock<RwLock<HashMap<String, DriverOpener>>> = LazyLock::new(|| {
    let mut drivers: HashMap<String, DriverOpener> = HashMap::new();
    drivers.insert("file".to_string(), open_file);
    RwLock::new(drivers)
});

fn open_file(locator: &str) -> SourceResult<Box<dyn Driver>> {
    let medium = FileMedium::from_locator(locator)?;
    Ok(Box::new(MediumDriver::new(medium)?))
}

/// Make `scheme://...` locators resolve through `opener`
pub fn register_driver(scheme: impl Into<String>, opener: DriverOpener) {
    let scheme = scheme.into();
    log::debug!("Registered source driver for scheme {scheme}");
    DRIVERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(scheme, opener);
}

/// Open a driver for `locator`, running discovery before returning
///
/// # Errors
///
/// Returns `SourceError::InvalidLocator` when the locator has no scheme,
/// `SourceError::UnknownScheme` when no driver is registered for it, and
/// whatever the driver's discovery pass reports otherwise.
pub fn open(locator: &str) -> SourceResult<Box<dyn Driver>> {
    let (scheme, _) = locator
        .split_once("://")
        .ok_or_else(|| SourceError::InvalidLocator(locator.to_string()))?;

    let opener = DRIVERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(scheme)
        .copied()
        .ok_or_else(|| SourceError::UnknownScheme(scheme.to_string()))?;

    opener(locator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_locator_without_scheme() {
        let Err(err) = open("migrations") else {
            panic!("locator without a scheme should not open");
        };
        assert!(matches!(err, SourceError::InvalidLocator(_)));
    }

    #[test]
    fn test_open_rejects_unknown_scheme() {
        let Err(err) = open("ftp://example.com/migrations") else {
            panic!("ftp scheme should not resolve");
        };
        assert!(matches!(err, SourceError::UnknownScheme(s) if s == "ftp"));
    }

    #[test]
    fn test_registered_scheme_is_used() {
        fn refuse(locator: &str) -> SourceResult<Box<dyn Driver>> {
            Err(SourceError::Unsupported(locator.to_string()))
        }
        register_driver("refuse", refuse);

        let Err(err) = open("refuse://anything") else {
            panic!("refusing opener should surface its error");
        };
        assert!(matches!(err, SourceError::Unsupported(l) if l == "refuse://anything"));
    }

    #[test]
    fn test_body_accessors() {
        let stream = MigrationBody::Stream(Box::new(std::io::empty()));
        assert!(stream.func().is_none());
        assert!(stream.into_stream().is_some());
    }
}
