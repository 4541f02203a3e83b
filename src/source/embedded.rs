//! Medium over a directory embedded at compile time
//!
//! ```rust,ignore
//! use include_dir::{include_dir, Dir};
//! use tidemark::source::{EmbeddedDriver, EmbeddedMedium};
//!
//! static MIGRATIONS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/migrations");
//!
//! let driver = EmbeddedDriver::new(EmbeddedMedium::new(&MIGRATIONS, "")?)?;
//! ```

use crate::source::{Entry, Medium, MediumDriver, SourceError, SourceResult};
use include_dir::Dir;
use std::io::{Cursor, Read};

/// Driver over an embedded migrations tree
pub type EmbeddedDriver = MediumDriver<EmbeddedMedium>;

/// Migrations compiled into the binary with `include_dir!`
///
/// There is no locator form for this medium; construct it directly from
/// the embedded directory. Raw locations are paths relative to the root of
/// the embedded tree.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedMedium {
    root: &'static Dir<'static>,
    dir: &'static Dir<'static>,
}

impl EmbeddedMedium {
    /// Use the subdirectory `path` of `root` (empty for the root itself)
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` when `path` is not a directory in `root`.
    pub fn new(root: &'static Dir<'static>, path: &str) -> SourceResult<Self> {
        let dir = if path.is_empty() {
            root
        } else {
            root.get_dir(path)
                .ok_or_else(|| SourceError::not_found("open", path))?
        };
        Ok(Self { root, dir })
    }
}

fn collect(dir: &'static Dir<'static>, entries: &mut Vec<Entry>) {
    for file in dir.files() {
        let path = file.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        entries.push(Entry::new(
            name.to_string_lossy(),
            path.to_string_lossy().replace('\\', "/"),
        ));
    }
    for sub in dir.dirs() {
        collect(sub, entries);
    }
}

impl Medium for EmbeddedMedium {
    fn describe(&self) -> String {
        let path = self.dir.path().to_string_lossy();
        if path.is_empty() {
            "embedded:/".to_string()
        } else {
            format!("embedded:/{path}")
        }
    }

    fn entries(&self) -> SourceResult<Vec<Entry>> {
        let mut entries = Vec::new();
        collect(self.dir, &mut entries);
        entries.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(entries)
    }

    fn open(&self, location: &str) -> SourceResult<Box<dyn Read + Send>> {
        let file = self
            .root
            .get_file(location)
            .ok_or_else(|| SourceError::not_found("open", location))?;
        Ok(Box::new(Cursor::new(file.contents())))
    }
}
