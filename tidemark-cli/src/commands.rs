//! Handlers for the `list`, `summary` and `show` subcommands
//!
//! Each handler writes to the given sink so callers decide where output goes.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{Read, Write};
use tidemark::source::{Direction, Driver, MigrationBody, Version};

/// Every indexed version with its up and down locations, in ascending order
pub fn handle_list<W: Write>(driver: &dyn Driver, out: &mut W) -> Result<()> {
    let migrations = driver.migrations();
    if migrations.is_empty() {
        writeln!(out, "No migrations found")?;
        return Ok(());
    }

    writeln!(out, "{}", format!("{} version(s)", migrations.len()).bold())?;
    for version in migrations.versions() {
        let up = migrations.up(*version).map_or("-", |m| m.raw());
        let down = migrations.down(*version).map_or("-", |m| m.raw());
        writeln!(
            out,
            "  {}  {} {}  {} {}",
            version.to_string().cyan(),
            "up:".green(),
            up,
            "down:".yellow(),
            down
        )?;
    }
    Ok(())
}

/// Run-status summary, optionally after skipping steps through `skip_through`
pub fn handle_summary<W: Write>(
    driver: &mut dyn Driver,
    direction: Direction,
    skip_through: Option<Version>,
    out: &mut W,
) -> Result<()> {
    if let Some(version) = skip_through {
        driver.mark_skip_migrations(version, direction);
    }
    driver
        .migrations()
        .write_summary(out, direction)
        .context("writing summary")
}

/// One step: its identifier, location and content
///
/// Registered migration functions have no content to print, so a marker
/// line stands in for it.
pub fn handle_show<W: Write>(
    driver: &dyn Driver,
    version: Version,
    direction: Direction,
    out: &mut W,
) -> Result<()> {
    let read = match direction {
        Direction::Up => driver.read_up(version),
        Direction::Down => driver.read_down(version),
    }
    .with_context(|| format!("reading {direction} migration {version}"))?;

    writeln!(out, "{} {}", "identifier:".bold(), read.identifier)?;
    writeln!(out, "{} {}", "location:".bold(), read.location)?;

    match read.body {
        MigrationBody::Func(_) => {
            writeln!(out, "{}", "(registered migration function)".italic())?;
        }
        MigrationBody::Stream(mut stream) => {
            let mut content = String::new();
            stream
                .read_to_string(&mut content)
                .with_context(|| format!("reading {}", read.location))?;
            writeln!(out)?;
            writeln!(out, "{content}")?;
        }
    }
    Ok(())
}
