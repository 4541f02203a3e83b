//! Tests for the embedded source
#![cfg(feature = "embedded")]

use include_dir::{include_dir, Dir};
use std::io::Read;
use tidemark::source::{EmbeddedDriver, EmbeddedMedium, MigrationBody};
use tidemark::{Direction, Driver, Status};

static MIGRATIONS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/tests/fixtures/migrations");

#[test]
fn test_embedded_root_indexes_whole_tree() {
    let driver = EmbeddedDriver::new(EmbeddedMedium::new(&MIGRATIONS, "").unwrap()).unwrap();
    let ms = driver.migrations();

    assert_eq!(ms.versions(), &[1, 2, 5]);
    assert_eq!(ms.up(5).unwrap().raw(), "archive/5_index_email.up.sql");
    assert_eq!(driver.prev(5).unwrap(), 2);
}

#[test]
fn test_embedded_subdirectory() {
    let driver =
        EmbeddedDriver::new(EmbeddedMedium::new(&MIGRATIONS, "archive").unwrap()).unwrap();

    assert_eq!(driver.migrations().versions(), &[5]);
    assert!(driver.prev(5).unwrap_err().is_not_found());

    let read = driver.read_down(5).unwrap();
    assert_eq!(read.location, "archive/5_index_email.down.sql");
    let MigrationBody::Stream(mut stream) = read.body else {
        panic!("expected file content");
    };
    let mut content = String::new();
    stream.read_to_string(&mut content).unwrap();
    assert_eq!(content, "DROP INDEX users_email;\n");
}

#[test]
fn test_embedded_missing_subdirectory() {
    let err = EmbeddedMedium::new(&MIGRATIONS, "nope").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_embedded_down_skip_marks_newer_versions() {
    let mut driver =
        EmbeddedDriver::new(EmbeddedMedium::new(&MIGRATIONS, "").unwrap()).unwrap();
    driver.mark_skip_migrations(2, Direction::Down);

    let ms = driver.migrations();
    assert_eq!(ms.down(1).unwrap().status(), Status::Pending);
    assert_eq!(ms.down(2).unwrap().status(), Status::Skipped);
    assert_eq!(ms.down(5).unwrap().status(), Status::Skipped);
}
