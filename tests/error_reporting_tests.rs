//! Integration tests for error reporting
//!
//! Tests the import failures a user can hit and the messages they see

use coachrs::error::{CoachError, ErrorSeverity, ImportError};
use coachrs::ImportManager;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_workout_file_is_a_warning() {
    let manager = ImportManager::new();
    let err: CoachError = manager
        .import_workout(Path::new("/no/such/dir/swim.csv"))
        .unwrap_err()
        .into();

    assert!(matches!(
        err,
        CoachError::Import(ImportError::FileNotFound { .. })
    ));
    assert_eq!(err.severity(), ErrorSeverity::Warning);
    assert!(err.user_message().contains("swim.csv"));
}

#[test]
fn test_unsupported_activity_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("activities.xml");
    fs::write(&path, "<activities/>").unwrap();

    let err = ImportManager::new().import_activities(&path).unwrap_err();
    match err {
        ImportError::UnsupportedFormat { format } => assert_eq!(format, "xml"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_json_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "[{\"start_date\": ").unwrap();

    let err = ImportManager::new().import_activities(&path).unwrap_err();
    assert!(matches!(err, ImportError::Json { .. }));
    assert!(err.to_string().contains("broken.json"));

    let err: CoachError = err.into();
    assert_eq!(err.severity(), ErrorSeverity::Error);
}

#[test]
fn test_batch_import_skips_bad_files() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("a_good.csv");
    fs::write(&good, "timestamp,speed\n0,1.0\n1,1.1\n").unwrap();
    // non-csv files in a directory are ignored, not reported
    fs::write(dir.path().join("notes.txt"), "not a workout").unwrap();

    let tables = ImportManager::new()
        .import_workouts(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].0, good);
    assert_eq!(tables[0].1.samples.len(), 2);
}

#[test]
fn test_batch_import_rejects_missing_paths() {
    let err = ImportManager::new()
        .import_workouts(&[PathBuf::from("/no/such/workout.csv")])
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound { .. }));
}
