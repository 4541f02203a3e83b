//! Local directory medium

use crate::source::{Entry, Medium, MediumDriver, SourceError, SourceResult};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Driver over a local migrations directory
pub type FileDriver = MediumDriver<FileMedium>;

/// Migrations stored as files below a root directory
///
/// The whole tree is walked; each record's raw location is its path
/// relative to the root, using `/` separators.
#[derive(Debug, Clone)]
pub struct FileMedium {
    root: PathBuf,
}

impl FileMedium {
    /// Use `root` as the migrations directory
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` if `root` does not exist and
    /// `SourceError::InvalidLocator` if it is not a directory.
    pub fn new(root: impl AsRef<Path>) -> SourceResult<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(SourceError::not_found("open", root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(SourceError::InvalidLocator(format!(
                "path is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Resolve a `file://` locator
    ///
    /// Both `file:///abs/path` and relative `file://migrations` forms are
    /// accepted; relative paths resolve against the working directory.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InvalidLocator` for non-`file` locators, plus
    /// the errors of [`FileMedium::new`].
    pub fn from_locator(locator: &str) -> SourceResult<Self> {
        let path = locator
            .strip_prefix("file://")
            .ok_or_else(|| SourceError::InvalidLocator(locator.to_string()))?;
        if path.is_empty() {
            return Err(SourceError::InvalidLocator(locator.to_string()));
        }
        Self::new(path)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Medium for FileMedium {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn entries(&self) -> SourceResult<Vec<Entry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let location = e
                    .path()
                    .map_or_else(|| self.describe(), |p| p.display().to_string());
                SourceError::io(location, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(Entry::new(name, self.relative(entry.path())));
        }
        Ok(entries)
    }

    fn open(&self, location: &str) -> SourceResult<Box<dyn Read + Send>> {
        let file = File::open(self.root.join(location)).map_err(|e| SourceError::io(location, e))?;
        Ok(Box::new(file))
    }
}

impl MediumDriver<FileMedium> {
    /// Open a `file://` locator and discover its migrations
    ///
    /// # Errors
    ///
    /// See [`FileMedium::from_locator`] and [`discover`](crate::source::discover).
    pub fn open(locator: &str) -> SourceResult<Self> {
        Self::new(FileMedium::from_locator(locator)?)
    }
}
