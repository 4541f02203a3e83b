//! Medium over a flat object store
//!
//! The store itself is abstracted behind [`ObjectStore`]; concrete clients
//! for cloud object storage implement it outside this crate.
//! [`MemoryObjectStore`] is the in-process implementation.

use crate::source::registry::BoxError;
use crate::source::{Cancellation, Entry, Medium, MediumDriver, SourceError, SourceResult};
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};

/// Driver over objects stored under a prefix
pub type ObjectStoreDriver<S> = MediumDriver<ObjectStoreMedium<S>>;

/// Minimal client surface a driver needs from an object store
pub trait ObjectStore: Send + Sync {
    /// Keys of every object whose key starts with `prefix`
    fn list(&self, prefix: &str) -> Result<Vec<String>, BoxError>;

    /// Stream the object stored under `key`
    fn get(&self, key: &str) -> Result<Box<dyn Read + Send>, BoxError>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn list(&self, prefix: &str) -> Result<Vec<String>, BoxError> {
        (**self).list(prefix)
    }

    fn get(&self, key: &str) -> Result<Box<dyn Read + Send>, BoxError> {
        (**self).get(key)
    }
}

/// Objects held in memory, keyed by full object name
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), content.into());
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, BoxError> {
        Ok(self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn get(&self, key: &str) -> Result<Box<dyn Read + Send>, BoxError> {
        let content = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| format!("no such object: {key}"))?;
        Ok(Box::new(Cursor::new(content)))
    }
}

/// Objects directly below `prefix` in an [`ObjectStore`]
///
/// Listing stops at the `/` delimiter, so objects in nested "folders" are
/// not discovered. Raw locations are object names relative to the prefix.
pub struct ObjectStoreMedium<S: ObjectStore> {
    store: S,
    prefix: String,
    cancellation: Cancellation,
}

impl<S: ObjectStore> ObjectStoreMedium<S> {
    /// Read objects under `prefix` (leading and trailing `/` are ignored)
    pub fn new(store: S, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };
        Self {
            store,
            prefix,
            cancellation: Cancellation::default(),
        }
    }

    /// Abandon reads once `cancellation` is triggered
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, location: &str) -> String {
        format!("{}{location}", self.prefix)
    }
}

impl<S: ObjectStore> Medium for ObjectStoreMedium<S> {
    fn describe(&self) -> String {
        format!("object-store:/{}", self.prefix)
    }

    fn entries(&self) -> SourceResult<Vec<Entry>> {
        let keys = self.store.list(&self.prefix).map_err(|e| SourceError::Backend {
            location: self.describe(),
            message: e.to_string(),
        })?;

        let mut entries: Vec<Entry> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(&self.prefix))
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .map(|name| Entry::new(name, name))
            .collect();
        entries.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(entries)
    }

    fn open(&self, location: &str) -> SourceResult<Box<dyn Read + Send>> {
        let key = self.key(location);
        if self.cancellation.is_cancelled() {
            return Err(SourceError::Cancelled { location: key });
        }
        let inner = self.store.get(&key).map_err(|e| SourceError::Backend {
            location: key.clone(),
            message: e.to_string(),
        })?;
        Ok(Box::new(CancellableRead {
            inner,
            cancellation: self.cancellation.clone(),
        }))
    }
}

/// Stream that fails with `Interrupted` once its cancellation fires
struct CancellableRead {
    inner: Box<dyn Read + Send>,
    cancellation: Cancellation,
}

impl Read for CancellableRead {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancellation.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "read cancelled"));
        }
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Direction, Driver};

    fn store() -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        store.put("db/migrations/1_init.up.sql", "CREATE TABLE a;");
        store.put("db/migrations/1_init.down.sql", "DROP TABLE a;");
        store.put("db/migrations/2_users.up.sql", "CREATE TABLE users;");
        store.put("db/migrations/archive/3_old.up.sql", "-- nested, not listed");
        store.put("db/migrations/notes.txt", "unrelated");
        store.put("db/other/9_elsewhere.up.sql", "-- outside prefix");
        store
    }

    #[test]
    fn test_lists_only_direct_children_of_prefix() {
        let driver = ObjectStoreDriver::new(ObjectStoreMedium::new(store(), "/db/migrations/"))
            .unwrap();
        assert_eq!(driver.migrations().versions(), &[1, 2]);
        assert_eq!(driver.migrations().up(2).unwrap().raw(), "2_users.up.sql");
    }

    #[test]
    fn test_read_fetches_prefixed_key() {
        let driver =
            ObjectStoreDriver::new(ObjectStoreMedium::new(store(), "db/migrations")).unwrap();
        let read = driver.read_down(1).unwrap();
        assert_eq!(read.location, "1_init.down.sql");

        let mut content = String::new();
        read.body
            .into_stream()
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "DROP TABLE a;");
    }

    #[test]
    fn test_missing_object_is_backend_error() {
        let shared = store();
        let driver =
            ObjectStoreDriver::new(ObjectStoreMedium::new(Arc::clone(&shared), "db/migrations"))
                .unwrap();
        shared
            .objects
            .write()
            .unwrap()
            .remove("db/migrations/2_users.up.sql");

        let err = driver.read_up(2).unwrap_err();
        assert!(matches!(err, SourceError::Backend { ref location, .. }
            if location == "db/migrations/2_users.up.sql"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_cancelled_reads() {
        let cancel = Cancellation::new();
        let driver = ObjectStoreDriver::new(
            ObjectStoreMedium::new(store(), "db/migrations").with_cancellation(cancel.clone()),
        )
        .unwrap();

        let mut stream = driver.read_up(1).unwrap().body.into_stream().unwrap();
        cancel.cancel();

        let mut buf = [0_u8; 4];
        let err = stream.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);

        assert!(matches!(
            driver.read_up(2),
            Err(SourceError::Cancelled { .. })
        ));
        // navigation is unaffected
        assert_eq!(driver.migrations().first(), Some(1));
        assert!(driver.migrations().get(1, Direction::Up).is_some());
    }
}
