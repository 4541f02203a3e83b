//! Process-wide registry of code-defined migration steps
//!
//! A programmatic migration registers itself under the basename of the
//! source file that defines it. When a driver resolves a record whose raw
//! location has the same basename, it hands back the registered function
//! instead of the file content.
//!
//! Registration is a startup activity: populate the registry before the
//! first driver is opened and treat it as read-only afterwards.
//!
//! ```rust
//! use tidemark::source::registry;
//!
//! registry::register_func_migration_as("4_backfill.up.rs", |ctx, _db| {
//!     assert_eq!(ctx.version(), 4);
//!     Ok(())
//! });
//! assert!(registry::is_registered("4_backfill.up.rs"));
//! ```

use crate::source::{Cancellation, Version};
use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Boxed error returned by migration functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A code-defined migration step
///
/// Receives the execution context and a type-erased handle to the target
/// data store, which the function downcasts to whatever it expects.
pub type MigrationFn =
    Arc<dyn Fn(&MigrationContext, &mut dyn Any) -> Result<(), BoxError> + Send + Sync>;

static FUNC_REGISTRY: LazyLock<RwLock<HashMap<String, MigrationFn>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// What a migration function knows about the step it is running
#[derive(Debug, Clone)]
pub struct MigrationContext {
    version: Version,
    identifier: String,
    cancellation: Cancellation,
}

impl MigrationContext {
    pub fn new(version: Version, identifier: impl Into<String>) -> Self {
        Self {
            version,
            identifier: identifier.into(),
            cancellation: Cancellation::default(),
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

/// Register a migration function under an explicit basename
///
/// A later registration under the same basename replaces the earlier one.
pub fn register_func_migration_as<F>(basename: impl Into<String>, func: F)
where
    F: Fn(&MigrationContext, &mut dyn Any) -> Result<(), BoxError> + Send + Sync + 'static,
{
    let basename = basename.into();
    let mut registry = FUNC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if registry.insert(basename.clone(), Arc::new(func)).is_some() {
        log::warn!("Replacing migration function registered for {basename}");
    } else {
        log::debug!("Registered migration function for {basename}");
    }
}

/// Register a migration function under the basename of the calling file
///
/// ```rust,ignore
/// // in migrations/5_seed_roles.up.rs
/// tidemark::register_func_migration!(|_ctx, db| {
///     let db = db.downcast_mut::<MyConnection>().ok_or("unexpected handle")?;
///     db.seed_roles()?;
///     Ok(())
/// });
/// ```
#[macro_export]
macro_rules! register_func_migration {
    ($func:expr) => {
        $crate::source::registry::register_func_migration_as(
            $crate::source::registry::basename_of(::core::file!()),
            $func,
        )
    };
}

/// Function registered for `basename`, if any
#[must_use]
pub fn lookup(basename: &str) -> Option<MigrationFn> {
    FUNC_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(basename)
        .cloned()
}

#[must_use]
pub fn is_registered(basename: &str) -> bool {
    FUNC_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(basename)
}

/// All registered basenames, sorted
#[must_use]
pub fn registered_basenames() -> Vec<String> {
    let mut names: Vec<String> = FUNC_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort_unstable();
    names
}

/// Final path segment of a source location
#[must_use]
pub fn basename_of(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}
