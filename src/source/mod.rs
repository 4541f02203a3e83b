//! Migration sources for Tidemark
//!
//! This module provides everything between a storage medium and a
//! migration runner:
//! - `Migration` records and the `Migrations` ordering index
//! - The `Driver` contract and locator-based `open`
//! - Media for local directories, embedded trees and object stores
//! - The process-wide registry of code-defined migrations
//!
//! # Example
//!
//! ```rust,no_run
//! use tidemark::source::{self, Direction, Driver, Status};
//!
//! fn run() -> Result<(), tidemark::SourceError> {
//!     let mut driver = source::open("file://migrations")?;
//!
//!     let mut version = driver.first()?;
//!     loop {
//!         let read = driver.read_up(version)?;
//!         println!("applying {} from {}", read.identifier, read.location);
//!         driver.update_status(version, Status::Done, "");
//!
//!         match driver.next(version) {
//!             Ok(next) => version = next,
//!             Err(e) if e.is_not_found() => break,
//!             Err(e) => return Err(e),
//!         }
//!     }
//!
//!     driver.print_summary(Direction::Up);
//!     driver.close()
//! }
//! ```

pub mod cancel;
pub mod driver;
#[cfg(feature = "embedded")]
pub mod embedded;
pub mod error;
pub mod file;
pub mod medium;
pub mod migration;
pub mod migrations;
pub mod object_store;
pub mod parse;
pub mod registry;
#[cfg(feature = "tracing")]
mod trace;

pub use cancel::Cancellation;
pub use driver::{open, register_driver, Driver, DriverOpener, MigrationBody, ReadMigration};
#[cfg(feature = "embedded")]
pub use embedded::{EmbeddedDriver, EmbeddedMedium};
pub use error::{SourceError, SourceResult};
pub use file::{FileDriver, FileMedium};
pub use medium::{discover, Entry, Medium, MediumDriver};
pub use migration::{Direction, Migration, Status, Version};
pub use migrations::Migrations;
pub use object_store::{MemoryObjectStore, ObjectStore, ObjectStoreDriver, ObjectStoreMedium};
pub use parse::{parse, ParseFn};
pub use registry::{MigrationContext, MigrationFn};
