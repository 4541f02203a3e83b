//! # Tidemark
//!
//! Ordered index of versioned migration steps discovered from a pluggable
//! backing store (local directory, embedded tree, object storage).
//!
//! The [`source::Migrations`] index is shared by every driver, so ordering,
//! duplicate rejection and run-status bookkeeping behave identically no
//! matter where the raw migration bytes come from.

pub mod config;
pub mod source;

pub use config::SourceConfig;
pub use source::{
    open, Direction, Driver, Migration, MigrationBody, Migrations, ReadMigration, SourceError,
    SourceResult, Status, Version,
};
