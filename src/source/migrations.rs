//! In-memory migration index shared by every driver

use crate::source::{Direction, Migration, Status, Version};
use std::collections::HashMap;
use std::io::{self, Write};

const SUMMARY_TITLE: &str = "+++++ Migration Summary +++++";
const SUMMARY_HEADER: [&str; 3] = ["Migration Source", "Status", "Error"];
const SUMMARY_RULE: [&str; 3] = ["----------------", "------", "-----"];
const MISSING_CELL: &str = "-";

/// Ordered index of discovered migrations
///
/// Records are keyed by version and direction. `index` holds the distinct
/// versions in ascending order and is kept in sync with `migrations` on every
/// insertion, so positional lookups are a binary search.
#[derive(Debug, Default)]
pub struct Migrations {
    index: Vec<Version>,
    migrations: HashMap<Version, HashMap<Direction, Migration>>,
}

impl Migrations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the index
    ///
    /// Returns `false` without touching the index when a record already
    /// exists for the same version and direction. Callers decide whether
    /// that aborts discovery or just drops the entry.
    pub fn append(&mut self, migration: Migration) -> bool {
        let version = migration.version();
        let direction = migration.direction();

        if let Some(slots) = self.migrations.get(&version) {
            if slots.contains_key(&direction) {
                return false;
            }
        }

        self.migrations
            .entry(version)
            .or_default()
            .insert(direction, migration);
        if let Err(pos) = self.index.binary_search(&version) {
            self.index.insert(pos, version);
        }
        true
    }

    /// Lowest indexed version
    #[must_use]
    pub fn first(&self) -> Option<Version> {
        self.index.first().copied()
    }

    /// Version indexed directly before `version`
    ///
    /// `None` when `version` itself is not indexed, even if a smaller
    /// version exists.
    #[must_use]
    pub fn prev(&self, version: Version) -> Option<Version> {
        let pos = self.find_pos(version)?;
        pos.checked_sub(1).map(|p| self.index[p])
    }

    /// Version indexed directly after `version`
    ///
    /// `None` when `version` itself is not indexed, even if a larger
    /// version exists.
    #[must_use]
    pub fn next(&self, version: Version) -> Option<Version> {
        let pos = self.find_pos(version)?;
        self.index.get(pos + 1).copied()
    }

    #[must_use]
    pub fn up(&self, version: Version) -> Option<&Migration> {
        self.get(version, Direction::Up)
    }

    #[must_use]
    pub fn down(&self, version: Version) -> Option<&Migration> {
        self.get(version, Direction::Down)
    }

    /// Record for an exact version and direction
    #[must_use]
    pub fn get(&self, version: Version, direction: Direction) -> Option<&Migration> {
        self.migrations.get(&version)?.get(&direction)
    }

    /// Distinct indexed versions, ascending
    #[must_use]
    pub fn versions(&self) -> &[Version] {
        &self.index
    }

    /// Number of distinct versions
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Records for `direction` in ascending version order
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = &Migration> + '_ {
        self.index
            .iter()
            .filter_map(move |version| self.get(*version, direction))
    }

    /// Seed already-satisfied steps as skipped before resuming a run
    ///
    /// For `Up`, every version `<= version` has its up record skipped; for
    /// `Down`, every version `>= version` has its down record skipped.
    /// Versions without a record in that direction are ignored.
    pub fn mark_skip_migrations(&mut self, version: Version, direction: Direction) {
        let Self { index, migrations } = self;
        let in_range = |v: Version| match direction {
            Direction::Up => v <= version,
            Direction::Down => v >= version,
        };

        for v in index.iter().copied().filter(|v| in_range(*v)) {
            let Some(migration) = migrations.get_mut(&v).and_then(|s| s.get_mut(&direction))
            else {
                continue;
            };
            if !migration.transition(Status::Skipped, "") {
                log::debug!(
                    "Not skipping {}: already {}",
                    migration.raw(),
                    migration.status()
                );
            }
        }
    }

    /// Record the outcome of running `version`
    ///
    /// Both the up and the down record for that version are updated when
    /// both exist, so only report a version while a single direction of it
    /// is in flight. Missing versions are ignored.
    ///
    /// A record that already reached a terminal status does not move to a
    /// different one: a `Done` step reported as `Failed` stays `Done`, and
    /// the refused update is logged at warn level. Reporting the same
    /// terminal status again replaces the stored error text.
    pub fn update_status(&mut self, version: Version, status: Status, error: &str) {
        let Some(slots) = self.migrations.get_mut(&version) else {
            return;
        };
        for direction in [Direction::Up, Direction::Down] {
            if let Some(migration) = slots.get_mut(&direction) {
                if !migration.transition(status, error) {
                    log::warn!(
                        "Ignoring status {} for {}: already {}",
                        status,
                        migration.raw(),
                        migration.status()
                    );
                }
            }
        }
    }

    /// Write the run summary table for `direction`
    ///
    /// One row per indexed version in ascending order. A version with no
    /// record in `direction` renders placeholder cells instead of failing.
    pub fn write_summary<W: Write>(&self, out: &mut W, direction: Direction) -> io::Result<()> {
        let rows: Vec<[&str; 3]> = self
            .index
            .iter()
            .map(|version| match self.get(*version, direction) {
                Some(m) => [m.raw(), m.status().as_str(), m.error()],
                None => [MISSING_CELL; 3],
            })
            .collect();

        let mut widths = SUMMARY_HEADER.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        writeln!(out)?;
        writeln!(out, "{SUMMARY_TITLE}")?;
        writeln!(out)?;
        write_row(out, &widths, &SUMMARY_HEADER)?;
        write_row(out, &widths, &SUMMARY_RULE)?;
        for row in &rows {
            write_row(out, &widths, row)?;
        }
        write_row(out, &widths, &SUMMARY_RULE)?;
        out.flush()
    }

    /// Summary table rendered into a string
    #[must_use]
    pub fn summary(&self, direction: Direction) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_summary(&mut buf, direction);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Print the summary table to stdout
    pub fn print_summary(&self, direction: Direction) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = self.write_summary(&mut lock, direction) {
            log::warn!("Failed to write migration summary: {e}");
        }
    }

    fn find_pos(&self, version: Version) -> Option<usize> {
        let pos = self.index.partition_point(|v| *v < version);
        (self.index.get(pos) == Some(&version)).then_some(pos)
    }
}

// The last cell is written verbatim; only the column padding is dropped
// from rows that end in an empty cell.
fn write_row<W: Write>(out: &mut W, widths: &[usize; 3], cells: &[&str; 3]) -> io::Result<()> {
    let padded = format!(
        "{:<w0$}  {:<w1$}",
        cells[0],
        cells[1],
        w0 = widths[0],
        w1 = widths[1],
    );
    if cells[2].is_empty() {
        writeln!(out, "{}", padded.trim_end())
    } else {
        writeln!(out, "{padded}  {}", cells[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(version: Version) -> [Migration; 2] {
        [
            Migration::new(version, "step", Direction::Up, format!("{version}_step.up.sql")),
            Migration::new(version, "step", Direction::Down, format!("{version}_step.down.sql")),
        ]
    }

    fn index_of(versions: &[Version]) -> Migrations {
        let mut ms = Migrations::new();
        for v in versions {
            for m in pair(*v) {
                assert!(ms.append(m));
            }
        }
        ms
    }

    #[test]
    fn test_empty_index() {
        let ms = Migrations::new();
        assert!(ms.is_empty());
        assert_eq!(ms.first(), None);
        assert_eq!(ms.next(0), None);
        assert_eq!(ms.prev(0), None);
        assert!(ms.up(0).is_none());
    }

    #[test]
    fn test_versions_sorted_regardless_of_append_order() {
        let mut ms = Migrations::new();
        for v in [40, 3, 17, 3, 1] {
            ms.append(Migration::new(v, "x", Direction::Up, format!("{v}_x.up.sql")));
            ms.append(Migration::new(v, "x", Direction::Down, format!("{v}_x.down.sql")));
        }
        assert_eq!(ms.versions(), &[1, 3, 17, 40]);
        assert_eq!(ms.first(), Some(1));
        assert_eq!(ms.len(), 4);
    }

    #[test]
    fn test_navigation_scenario() {
        let ms = index_of(&[1, 2, 5]);
        assert_eq!(ms.first(), Some(1));
        assert_eq!(ms.prev(5), Some(2));
        assert_eq!(ms.next(2), Some(5));
        assert_eq!(ms.next(5), None);
        assert_eq!(ms.prev(1), None);
        assert!(ms.up(3).is_none());
        assert_eq!(ms.up(5).map(Migration::raw), Some("5_step.up.sql"));
        assert_eq!(ms.down(1).map(Migration::direction), Some(Direction::Down));
    }

    #[test]
    fn test_navigation_requires_exact_membership() {
        let ms = index_of(&[1, 2, 5]);
        assert_eq!(ms.next(3), None);
        assert_eq!(ms.prev(3), None);
        assert_eq!(ms.next(4), None);
        assert_eq!(ms.prev(6), None);
        assert_eq!(ms.next(0), None);
    }

    #[test]
    fn test_duplicate_append_leaves_index_unchanged() {
        let mut ms = Migrations::new();
        assert!(ms.append(Migration::new(3, "first", Direction::Up, "3_first.up.sql")));
        assert!(!ms.append(Migration::new(3, "second", Direction::Up, "3_second.up.sql")));

        assert_eq!(ms.versions(), &[3]);
        assert_eq!(ms.up(3).map(Migration::identifier), Some("first"));
        assert!(ms.down(3).is_none());
        assert_eq!(ms.iter(Direction::Up).count(), 1);
    }

    #[test]
    fn test_up_and_down_are_independent_records() {
        let mut ms = Migrations::new();
        assert!(ms.append(Migration::new(7, "a", Direction::Down, "7_a.down.sql")));
        assert_eq!(ms.versions(), &[7]);
        assert!(ms.up(7).is_none());
        assert!(ms.append(Migration::new(7, "a", Direction::Up, "7_a.up.sql")));
        assert_eq!(ms.versions(), &[7]);
        assert!(ms.up(7).is_some());
    }

    #[test]
    fn test_mark_skip_up_covers_lower_versions() {
        let mut ms = index_of(&[1, 2, 5]);
        ms.mark_skip_migrations(2, Direction::Up);

        assert_eq!(ms.up(1).map(Migration::status), Some(Status::Skipped));
        assert_eq!(ms.up(2).map(Migration::status), Some(Status::Skipped));
        assert_eq!(ms.up(5).map(Migration::status), Some(Status::Pending));
        // down records are untouched
        assert_eq!(ms.down(1).map(Migration::status), Some(Status::Pending));

        // idempotent
        ms.mark_skip_migrations(2, Direction::Up);
        assert_eq!(ms.up(2).map(Migration::status), Some(Status::Skipped));
    }

    #[test]
    fn test_mark_skip_down_covers_higher_versions() {
        let mut ms = index_of(&[1, 2, 5]);
        ms.mark_skip_migrations(2, Direction::Down);

        assert_eq!(ms.down(1).map(Migration::status), Some(Status::Pending));
        assert_eq!(ms.down(2).map(Migration::status), Some(Status::Skipped));
        assert_eq!(ms.down(5).map(Migration::status), Some(Status::Skipped));
        assert_eq!(ms.up(5).map(Migration::status), Some(Status::Pending));
    }

    #[test]
    fn test_mark_skip_ignores_missing_direction() {
        let mut ms = Migrations::new();
        ms.append(Migration::new(1, "a", Direction::Up, "1_a.up.sql"));
        ms.append(Migration::new(2, "b", Direction::Down, "2_b.down.sql"));

        ms.mark_skip_migrations(10, Direction::Up);
        assert_eq!(ms.up(1).map(Migration::status), Some(Status::Skipped));
        assert!(ms.up(2).is_none());
        assert_eq!(ms.down(2).map(Migration::status), Some(Status::Pending));
    }

    #[test]
    fn test_update_status_writes_both_directions() {
        let mut ms = index_of(&[1, 2, 5]);
        ms.update_status(1, Status::Done, "");
        ms.update_status(2, Status::Failed, "boom");

        for m in [ms.up(2), ms.down(2)].into_iter().flatten() {
            assert_eq!(m.status(), Status::Failed);
            assert_eq!(m.error(), "boom");
        }
        assert_eq!(ms.up(1).map(Migration::status), Some(Status::Done));
        assert_eq!(ms.up(5).map(Migration::status), Some(Status::Pending));
        assert_eq!(ms.up(5).map(Migration::error), Some(""));
    }

    #[test]
    fn test_update_status_on_missing_version_is_noop() {
        let mut ms = index_of(&[1]);
        ms.update_status(9, Status::Done, "");
        assert_eq!(ms.versions(), &[1]);
        assert_eq!(ms.up(1).map(Migration::status), Some(Status::Pending));
    }

    #[test]
    fn test_terminal_status_survives_later_updates() {
        let mut ms = index_of(&[1, 2]);
        ms.mark_skip_migrations(1, Direction::Up);
        ms.update_status(1, Status::Done, "");
        assert_eq!(ms.up(1).map(Migration::status), Some(Status::Skipped));
        // the down record was still pending and takes the update
        assert_eq!(ms.down(1).map(Migration::status), Some(Status::Done));
    }

    #[test]
    fn test_refused_update_keeps_terminal_status() {
        let mut ms = index_of(&[4]);
        ms.update_status(4, Status::Done, "");
        ms.update_status(4, Status::Failed, "late failure");

        for m in [ms.up(4), ms.down(4)].into_iter().flatten() {
            assert_eq!(m.status(), Status::Done);
            assert_eq!(m.error(), "");
        }
    }

    #[test]
    fn test_repeated_terminal_status_refreshes_error() {
        let mut ms = index_of(&[4]);
        ms.update_status(4, Status::Failed, "first");
        ms.update_status(4, Status::Failed, "second");

        for m in [ms.up(4), ms.down(4)].into_iter().flatten() {
            assert_eq!(m.status(), Status::Failed);
            assert_eq!(m.error(), "second");
        }
    }

    #[test]
    fn test_summary_keeps_error_text_verbatim() {
        let mut ms = index_of(&[1, 2]);
        ms.update_status(1, Status::Failed, "trailing space  ");

        let summary = ms.summary(Direction::Up);
        let row = summary
            .lines()
            .find(|l| l.starts_with("1_step.up.sql"))
            .unwrap();
        assert!(row.contains(" failed "));
        assert!(row.ends_with("  trailing space  "));

        // rows without error text carry no padding
        let pending = summary
            .lines()
            .find(|l| l.starts_with("2_step.up.sql"))
            .unwrap();
        assert!(pending.ends_with("pending"));
    }

    #[test]
    fn test_summary_lists_rows_in_version_order() {
        let mut ms = index_of(&[5, 1, 2]);
        ms.update_status(1, Status::Done, "");
        ms.update_status(2, Status::Failed, "syntax error at line 3");

        let summary = ms.summary(Direction::Up);
        let lines: Vec<&str> = summary.lines().collect();

        assert!(summary.contains(SUMMARY_TITLE));
        let pos = |needle: &str| lines.iter().position(|l| l.starts_with(needle)).unwrap();
        assert!(pos("1_step.up.sql") < pos("2_step.up.sql"));
        assert!(pos("2_step.up.sql") < pos("5_step.up.sql"));
        let failed_row = lines[pos("2_step.up.sql")];
        assert!(failed_row.contains(" failed "));
        assert!(failed_row.ends_with("syntax error at line 3"));
        assert!(lines[pos("5_step.up.sql")].ends_with("pending"));
    }

    #[test]
    fn test_summary_tolerates_missing_direction() {
        let mut ms = Migrations::new();
        ms.append(Migration::new(1, "a", Direction::Up, "1_a.up.sql"));
        ms.append(Migration::new(2, "b", Direction::Down, "2_b.down.sql"));

        let summary = ms.summary(Direction::Down);
        assert!(summary.contains("2_b.down.sql"));
        assert!(summary.lines().any(|l| l.starts_with(MISSING_CELL) && !l.starts_with("--")));
    }
}
