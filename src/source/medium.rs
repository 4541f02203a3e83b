//! Shared driver glue over a storage medium
//!
//! A [`Medium`] only knows how to list candidate names and hand out content
//! for a location. [`MediumDriver`] does discovery on top of it and routes
//! the rest of the [`Driver`] contract through one [`Migrations`] index.

use crate::source::parse::{parse, ParseFn};
use crate::source::registry;
#[cfg(feature = "tracing")]
use crate::source::trace;
use crate::source::{
    Direction, Driver, MigrationBody, Migrations, ReadMigration, SourceError, SourceResult,
    Status, Version,
};
use std::io::Read;

/// One candidate discovered on a medium
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Display name handed to the parser, usually the file name
    pub name: String,
    /// Location the medium can open again later
    pub location: String,
}

impl Entry {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Storage medium a driver reads migrations from
pub trait Medium: Send {
    /// Human-readable root of the medium, used in errors and logs
    fn describe(&self) -> String;

    /// Every candidate entry; entries that fail to parse are skipped later
    fn entries(&self) -> SourceResult<Vec<Entry>>;

    /// Content stored at `location`
    fn open(&self, location: &str) -> SourceResult<Box<dyn Read + Send>>;

    /// Release any held resources
    fn close(&mut self) -> SourceResult<()> {
        Ok(())
    }
}

/// Parse every entry of `medium` into a fresh index
///
/// Names that fail to parse are skipped. Two entries parsing to the same
/// version and direction abort discovery with `DuplicateMigration`.
///
/// # Errors
///
/// Returns the medium's listing error or `SourceError::DuplicateMigration`.
pub fn discover<M: Medium + ?Sized>(medium: &M, parse: ParseFn) -> SourceResult<Migrations> {
    let root = medium.describe();
    #[cfg(feature = "tracing")]
    let _span = trace::discovery_span(&root).entered();

    let mut migrations = Migrations::new();
    for entry in medium.entries()? {
        let migration = match parse(&entry.name) {
            Ok(m) => m.with_raw(entry.location.as_str()),
            Err(e) => {
                log::debug!("Skipping {}: {e}", entry.location);
                continue;
            }
        };
        let (version, direction) = (migration.version(), migration.direction());
        if !migrations.append(migration) {
            return Err(SourceError::DuplicateMigration {
                version,
                direction,
                location: entry.location,
            });
        }
        log::debug!("Indexed {} as {version}.{direction}", entry.location);
    }

    log::info!(
        "Discovered {} migration version(s) in {root}",
        migrations.len()
    );
    Ok(migrations)
}

/// [`Driver`] implementation over any [`Medium`]
pub struct MediumDriver<M: Medium> {
    medium: Option<M>,
    root: String,
    migrations: Migrations,
}

impl<M: Medium> MediumDriver<M> {
    /// Discover `medium` with the default name grammar
    ///
    /// # Errors
    ///
    /// See [`discover`].
    pub fn new(medium: M) -> SourceResult<Self> {
        Self::with_parser(medium, parse)
    }

    /// Discover `medium` with a custom name parser
    ///
    /// # Errors
    ///
    /// See [`discover`].
    pub fn with_parser(medium: M, parse: ParseFn) -> SourceResult<Self> {
        let migrations = discover(&medium, parse)?;
        Ok(Self {
            root: medium.describe(),
            medium: Some(medium),
            migrations,
        })
    }

    /// Mutable access to the index, for pre-seeding state before a run
    pub fn migrations_mut(&mut self) -> &mut Migrations {
        &mut self.migrations
    }

    #[must_use]
    pub fn medium(&self) -> Option<&M> {
        self.medium.as_ref()
    }

    fn read(&self, version: Version, direction: Direction) -> SourceResult<ReadMigration> {
        let medium = self.medium.as_ref().ok_or(SourceError::Closed)?;
        let migration = self.migrations.get(version, direction).ok_or_else(|| {
            SourceError::not_found(format!("read {direction} for version {version}"), &self.root)
        })?;

        #[cfg(feature = "tracing")]
        let _span = trace::read_span(migration.raw()).entered();

        let body = match registry::lookup(migration.basename()) {
            Some(func) => MigrationBody::Func(func),
            None => MigrationBody::Stream(medium.open(migration.raw())?),
        };

        Ok(ReadMigration {
            body,
            identifier: migration.identifier().to_string(),
            location: migration.raw().to_string(),
        })
    }
}

impl<M: Medium> Driver for MediumDriver<M> {
    fn close(&mut self) -> SourceResult<()> {
        let mut medium = self.medium.take().ok_or(SourceError::Closed)?;
        medium.close()
    }

    fn first(&self) -> SourceResult<Version> {
        self.migrations
            .first()
            .ok_or_else(|| SourceError::not_found("first", &self.root))
    }

    fn prev(&self, version: Version) -> SourceResult<Version> {
        self.migrations.prev(version).ok_or_else(|| {
            SourceError::not_found(format!("prev for version {version}"), &self.root)
        })
    }

    fn next(&self, version: Version) -> SourceResult<Version> {
        self.migrations.next(version).ok_or_else(|| {
            SourceError::not_found(format!("next for version {version}"), &self.root)
        })
    }

    fn read_up(&self, version: Version) -> SourceResult<ReadMigration> {
        self.read(version, Direction::Up)
    }

    fn read_down(&self, version: Version) -> SourceResult<ReadMigration> {
        self.read(version, Direction::Down)
    }

    fn mark_skip_migrations(&mut self, version: Version, direction: Direction) {
        self.migrations.mark_skip_migrations(version, direction);
    }

    fn update_status(&mut self, version: Version, status: Status, error: &str) {
        self.migrations.update_status(version, status, error);
    }

    fn print_summary(&self, direction: Direction) {
        self.migrations.print_summary(direction);
    }

    fn migrations(&self) -> &Migrations {
        &self.migrations
    }
}
