use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ImportError;
use crate::import::{ensure_exists, has_extension, ActivityImporter, ActivityRecord};
use crate::models::ActivitySummary;

/// Either a bare array or an object wrapping one under `activities`
#[derive(Deserialize)]
#[serde(untagged)]
enum ActivityDocument {
    List(Vec<ActivityRecord>),
    Wrapped { activities: Vec<ActivityRecord> },
}

/// Activity summaries exported as JSON, as returned by the platform API
pub struct JsonActivityImporter;

impl ActivityImporter for JsonActivityImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<ActivitySummary>, ImportError> {
        ensure_exists(file_path)?;
        let reader = BufReader::new(File::open(file_path)?);

        let document: ActivityDocument =
            serde_json::from_reader(reader).map_err(|source| ImportError::Json {
                path: file_path.to_path_buf(),
                source,
            })?;
        let records = match document {
            ActivityDocument::List(records) => records,
            ActivityDocument::Wrapped { activities } => activities,
        };

        Ok(records
            .into_iter()
            .filter_map(ActivityRecord::into_summary)
            .collect())
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_platform_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activities.json");
        fs::write(
            &path,
            r#"[
                {"id": 11, "start_date": "2024-05-01T06:00:00Z", "sport_type": "Run", "type": "Run",
                 "distance": 12000.5, "moving_time": 3600, "elapsed_time": 3700,
                 "average_heartrate": 148.5, "max_heartrate": 176.0, "total_elevation_gain": 80.0},
                {"id": 12, "start_date": "2024-05-02T06:00:00Z", "type": "Ride",
                 "moving_time": 5400, "average_heartrate": null}
            ]"#,
        )
        .unwrap();

        let activities = JsonActivityImporter.import_file(&path).unwrap();

        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].id, Some(11));
        assert_eq!(activities[0].start_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(activities[0].average_heartrate, Some(dec!(148.5)));
        assert_eq!(activities[1].sport_type, None);
        assert_eq!(activities[1].sport_label(), "Ride");
        assert_eq!(activities[1].average_heartrate, None);
        assert_eq!(activities[1].duration_seconds(), 5400);
    }

    #[test]
    fn test_wrapped_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sync.json");
        fs::write(
            &path,
            r#"{"activities": [{"start_date": "2024-05-03", "sport_type": "Swim", "moving_time": 1800}]}"#,
        )
        .unwrap();

        let activities = JsonActivityImporter.import_file(&path).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].id, None);
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{").unwrap();

        let result = JsonActivityImporter.import_file(&path);
        assert!(matches!(result, Err(ImportError::Json { .. })));
    }
}
