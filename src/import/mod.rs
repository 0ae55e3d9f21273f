//! Reading workout tables and activity summaries from disk
//!
//! Workout tables come from the converter's CSV layout: one row per recorded
//! sample plus `session_*` columns repeated on every row. Activity summaries
//! are platform exports, either a CSV table or a JSON array.

use crate::error::ImportError;
use crate::models::{ActivitySummary, WorkoutTable};
use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod csv;
pub mod json;

/// One activity as exported by the platform, shared by the CSV and JSON readers
///
/// Unparseable numeric fields read as missing rather than failing the file.
#[derive(Debug, Deserialize)]
pub(crate) struct ActivityRecord {
    #[serde(default, deserialize_with = "::csv::invalid_option")]
    id: Option<i64>,

    #[serde(alias = "start_date_local", alias = "date")]
    start_date: String,

    #[serde(default)]
    sport_type: Option<String>,

    #[serde(rename = "type", default)]
    activity_type: Option<String>,

    #[serde(alias = "distance_m", default, deserialize_with = "::csv::invalid_option")]
    distance: Option<f64>,

    #[serde(alias = "moving_time_s", default, deserialize_with = "::csv::invalid_option")]
    moving_time: Option<f64>,

    #[serde(alias = "elapsed_time_s", default, deserialize_with = "::csv::invalid_option")]
    elapsed_time: Option<f64>,

    #[serde(default, deserialize_with = "::csv::invalid_option")]
    average_heartrate: Option<f64>,

    #[serde(default, deserialize_with = "::csv::invalid_option")]
    max_heartrate: Option<f64>,

    #[serde(default, deserialize_with = "::csv::invalid_option")]
    total_elevation_gain: Option<f64>,
}

fn whole_seconds(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round().min(f64::from(u32::MAX)) as u32)
}

impl ActivityRecord {
    /// Convert to a summary; records without a readable date are skipped
    pub(crate) fn into_summary(self) -> Option<ActivitySummary> {
        let start_date = self
            .start_date
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let Some(start_date) = start_date else {
            warn!(
                "Skipping activity {:?} with unreadable start date '{}'",
                self.id, self.start_date
            );
            return None;
        };

        let heart_rate = |v: Option<f64>| v.filter(|hr| hr.is_finite()).and_then(Decimal::from_f64);

        Some(ActivitySummary {
            id: self.id,
            start_date,
            sport_type: self.sport_type.filter(|s| !s.is_empty()),
            activity_type: self.activity_type.filter(|s| !s.is_empty()),
            distance_m: self.distance.filter(|d| d.is_finite()),
            moving_time_s: whole_seconds(self.moving_time),
            elapsed_time_s: whole_seconds(self.elapsed_time),
            average_heartrate: heart_rate(self.average_heartrate),
            max_heartrate: heart_rate(self.max_heartrate),
            total_elevation_gain: self.total_elevation_gain.filter(|e| e.is_finite()),
        })
    }
}

/// A reader for one activity summary file format
pub trait ActivityImporter: Send + Sync {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read every activity in the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<ActivitySummary>, ImportError>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

pub(crate) fn ensure_exists(path: &Path) -> Result<(), ImportError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Dispatches files to the matching reader
pub struct ImportManager {
    activity_importers: Vec<Box<dyn ActivityImporter>>,
}

impl ImportManager {
    pub fn new() -> Self {
        let activity_importers: Vec<Box<dyn ActivityImporter>> = vec![
            Box::new(csv::CsvActivityImporter),
            Box::new(json::JsonActivityImporter),
        ];
        Self { activity_importers }
    }

    /// Read an activity summary file, picking the reader by extension
    pub fn import_activities(&self, file_path: &Path) -> Result<Vec<ActivitySummary>, ImportError> {
        let importer = self
            .activity_importers
            .iter()
            .find(|i| i.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "(none)".to_string()),
            })?;

        debug!(
            "Importing {} using {} format",
            file_path.display(),
            importer.format_name()
        );
        let activities = importer.import_file(file_path)?;
        info!(
            "Imported {} activities from {}",
            activities.len(),
            file_path.display()
        );
        Ok(activities)
    }

    /// Read one workout table
    pub fn import_workout(&self, file_path: &Path) -> Result<WorkoutTable, ImportError> {
        if !has_extension(file_path, "csv") {
            return Err(ImportError::UnsupportedFormat {
                format: file_path.display().to_string(),
            });
        }
        csv::read_workout_table(file_path)
    }

    /// Read many workout tables in parallel, keeping input order
    ///
    /// Directories are expanded to their `.csv` files, sorted by name.
    /// Unreadable files are logged and skipped.
    pub fn import_workouts(&self, paths: &[PathBuf]) -> Result<Vec<(PathBuf, WorkoutTable)>, ImportError> {
        let files = collect_workout_files(paths)?;

        let results: Vec<(PathBuf, Result<WorkoutTable, ImportError>)> = files
            .into_par_iter()
            .map(|path| {
                let table = self.import_workout(&path);
                (path, table)
            })
            .collect();

        let mut tables = Vec::with_capacity(results.len());
        for (path, result) in results {
            match result {
                Ok(table) => tables.push((path, table)),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(tables)
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_workout_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_extension(p, "csv"))
                .collect();
            found.sort();
            debug!("Found {} CSV files in {}", found.len(), path.display());
            files.extend(found);
        } else {
            ensure_exists(path)?;
            files.push(path.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_unsupported_activity_format() {
        let manager = ImportManager::new();
        let result = manager.import_activities(Path::new("activities.xlsx"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_import_workouts_expands_directories_in_name_order() {
        let dir = tempdir().unwrap();
        for name in ["b.csv", "a.csv", "notes.txt"] {
            fs::write(
                dir.path().join(name),
                "speed,session_total_distance\n1.0,100\n",
            )
            .unwrap();
        }

        let manager = ImportManager::new();
        let tables = manager
            .import_workouts(&[dir.path().to_path_buf()])
            .unwrap();

        let names: Vec<String> = tables
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_missing_workout_file_is_reported() {
        let manager = ImportManager::new();
        let result = manager.import_workouts(&[PathBuf::from("/no/such/swim.csv")]);
        assert!(matches!(result, Err(ImportError::FileNotFound { .. })));
    }
}
