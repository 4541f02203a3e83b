//! Migration file name parsing

use crate::source::{Direction, Migration, SourceError, SourceResult, Version};
use regex::Regex;
use std::sync::LazyLock;

/// Signature of a name parser handed to drivers for discovery
pub type ParseFn = fn(&str) -> SourceResult<Migration>;

// {version}_{identifier}.{up|down}.{extension}
#[allow(clippy::expect_used)] // constant pattern
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)_(.*)\.(down|up)\.(.*)$").expect("migration name pattern is valid")
});

/// Parse a migration file name into a pending record
///
/// Expected format: `{version}_{identifier}.{up|down}.{ext}`
///
/// # Example
/// - `1_create_users.up.sql` → version: 1, identifier: "create_users", direction: Up
///
/// The returned record's raw location is the name itself; drivers replace it
/// with their own location reference.
///
/// # Errors
///
/// Returns `SourceError::Parse` when the name does not match the pattern or
/// the version does not fit in a `u64`.
pub fn parse(name: &str) -> SourceResult<Migration> {
    let caps = NAME_PATTERN
        .captures(name)
        .ok_or_else(|| SourceError::Parse(name.to_string()))?;

    let version = caps[1]
        .parse::<Version>()
        .map_err(|e| SourceError::Parse(format!("{name}: version out of range: {e}")))?;
    let direction: Direction = caps[3].parse()?;

    Ok(Migration::new(version, &caps[2], direction, name))
}
