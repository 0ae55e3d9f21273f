use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::import::{ensure_exists, has_extension, ActivityImporter, ActivityRecord};
use crate::models::{ActivitySummary, RawSample, SessionSummary, WorkoutTable};

/// Header spellings accepted for each column, first match wins
mod aliases {
    pub const TIMESTAMP: &[&str] = &["timestamp", "time", "elapsed_time"];
    pub const DISTANCE: &[&str] = &["distance"];
    pub const SPEED: &[&str] = &["speed"];
    pub const ENHANCED_SPEED: &[&str] = &["enhanced_speed"];
    pub const HEART_RATE: &[&str] = &["heart_rate", "hr"];
    pub const CADENCE: &[&str] = &["cadence", "running_cadence"];
    pub const ALTITUDE: &[&str] = &["altitude", "enhanced_altitude"];
    pub const STEP_LENGTH: &[&str] = &["step_length"];

    pub const START_TIME: &[&str] = &["session_start_time"];
    pub const SPORT: &[&str] = &["session_sport"];
    pub const TOTAL_DISTANCE: &[&str] = &["session_total_distance"];
    pub const ELAPSED_TIME: &[&str] = &["session_total_elapsed_time", "session_total_timer_time"];
    pub const AVG_SPEED: &[&str] = &["session_avg_speed", "session_enhanced_avg_speed"];
    pub const AVG_CADENCE: &[&str] = &["session_avg_cadence", "session_avg_running_cadence"];
    pub const POOL_LENGTH: &[&str] = &["session_pool_length"];
    pub const AVG_HEART_RATE: &[&str] = &["session_avg_heart_rate"];
    pub const MAX_HEART_RATE: &[&str] = &["session_max_heart_rate"];
    pub const TOTAL_ASCENT: &[&str] = &["session_total_ascent"];
    pub const TOTAL_CALORIES: &[&str] = &["session_total_calories"];
}

/// Column positions resolved once from the header row
#[derive(Debug, Default)]
struct ColumnIndex {
    timestamp: Option<usize>,
    distance: Option<usize>,
    speed: Option<usize>,
    enhanced_speed: Option<usize>,
    heart_rate: Option<usize>,
    cadence: Option<usize>,
    altitude: Option<usize>,
    step_length: Option<usize>,
    start_time: Option<usize>,
    sport: Option<usize>,
    total_distance: Option<usize>,
    elapsed_time: Option<usize>,
    avg_speed: Option<usize>,
    avg_cadence: Option<usize>,
    pool_length: Option<usize>,
    avg_heart_rate: Option<usize>,
    max_heart_rate: Option<usize>,
    total_ascent: Option<usize>,
    total_calories: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |names: &[&str]| {
            names.iter().find_map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(name))
            })
        };

        ColumnIndex {
            timestamp: find(aliases::TIMESTAMP),
            distance: find(aliases::DISTANCE),
            speed: find(aliases::SPEED),
            enhanced_speed: find(aliases::ENHANCED_SPEED),
            heart_rate: find(aliases::HEART_RATE),
            cadence: find(aliases::CADENCE),
            altitude: find(aliases::ALTITUDE),
            step_length: find(aliases::STEP_LENGTH),
            start_time: find(aliases::START_TIME),
            sport: find(aliases::SPORT),
            total_distance: find(aliases::TOTAL_DISTANCE),
            elapsed_time: find(aliases::ELAPSED_TIME),
            avg_speed: find(aliases::AVG_SPEED),
            avg_cadence: find(aliases::AVG_CADENCE),
            pool_length: find(aliases::POOL_LENGTH),
            avg_heart_rate: find(aliases::AVG_HEART_RATE),
            max_heart_rate: find(aliases::MAX_HEART_RATE),
            total_ascent: find(aliases::TOTAL_ASCENT),
            total_calories: find(aliases::TOTAL_CALORIES),
        }
    }
}

fn cell<'r>(record: &'r StringRecord, column: Option<usize>) -> Option<&'r str> {
    column
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Finite number in a cell; anything else reads as missing
fn number(record: &StringRecord, column: Option<usize>) -> Option<f64> {
    cell(record, column)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse the datetime spellings the converter and spreadsheets produce
pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
    ];
    for format in naive_formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
        }
    }

    // seconds since epoch
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn session_from_row(record: &StringRecord, columns: &ColumnIndex) -> SessionSummary {
    SessionSummary {
        start_time: cell(record, columns.start_time).and_then(parse_datetime),
        sport: cell(record, columns.sport).map(str::to_string),
        total_distance_m: number(record, columns.total_distance),
        total_elapsed_time_s: number(record, columns.elapsed_time),
        avg_speed_ms: number(record, columns.avg_speed),
        avg_cadence: number(record, columns.avg_cadence),
        pool_length_m: number(record, columns.pool_length),
        avg_heart_rate: number(record, columns.avg_heart_rate),
        max_heart_rate: number(record, columns.max_heart_rate),
        total_ascent_m: number(record, columns.total_ascent),
        total_calories: number(record, columns.total_calories),
    }
}

/// Offsets in seconds for a timestamp column holding numbers or datetimes
struct TimestampReader {
    origin: Option<DateTime<Utc>>,
}

impl TimestampReader {
    fn read(&mut self, raw: Option<&str>) -> Option<f64> {
        let raw = raw?;
        if let Some(seconds) = raw.parse::<f64>().ok().filter(|v| v.is_finite()) {
            return Some(seconds);
        }
        let at = parse_datetime(raw)?;
        let origin = *self.origin.get_or_insert(at);
        Some((at - origin).num_milliseconds() as f64 / 1000.0)
    }
}

/// Read one workout recording in the converter's CSV layout
///
/// Session values are taken from the first data row. Without a timestamp
/// column each sample is stamped with its row index.
pub fn read_workout_table(path: &Path) -> Result<WorkoutTable, ImportError> {
    ensure_exists(path)?;
    let csv_error = |source: csv::Error| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::MissingData {
            field: "header row".to_string(),
        });
    }
    let columns = ColumnIndex::from_headers(&headers);

    let mut samples = Vec::new();
    let mut session = SessionSummary::default();
    let mut timestamps = TimestampReader { origin: None };

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if row == 0 {
            session = session_from_row(&record, &columns);
        }

        let timestamp = match columns.timestamp {
            Some(_) => timestamps.read(cell(&record, columns.timestamp)),
            None => Some(row as f64),
        };

        samples.push(RawSample {
            timestamp,
            distance: number(&record, columns.distance),
            speed: number(&record, columns.speed),
            enhanced_speed: number(&record, columns.enhanced_speed),
            heart_rate: number(&record, columns.heart_rate),
            cadence: number(&record, columns.cadence),
            altitude: number(&record, columns.altitude),
            step_length: number(&record, columns.step_length),
        });
    }

    if samples.is_empty() {
        warn!("{} contains no samples", path.display());
    }
    debug!(
        "Read {} samples from {} (sport: {:?})",
        samples.len(),
        path.display(),
        session.sport
    );

    Ok(WorkoutTable::new(samples, session))
}

/// Activity summaries exported as a CSV table
pub struct CsvActivityImporter;

impl ActivityImporter for CsvActivityImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<ActivitySummary>, ImportError> {
        ensure_exists(file_path)?;
        let csv_error = |source: csv::Error| ImportError::Csv {
            path: file_path.to_path_buf(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(file_path)
            .map_err(csv_error)?;

        let mut activities = Vec::new();
        for record in reader.deserialize::<ActivityRecord>() {
            let record = record.map_err(csv_error)?;
            if let Some(activity) = record.into_summary() {
                activities.push(activity);
            }
        }
        Ok(activities)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Signal;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_session_values_come_from_first_row() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "swim.csv",
            "timestamp,enhanced_speed,cadence,session_sport,session_total_distance,session_pool_length,session_start_time\n\
             2024-03-01 07:00:00,1.1,30,swimming,1500,25,2024-03-01 07:00:00\n\
             2024-03-01 07:00:05,1.2,31,running,9999,50,2024-03-02 07:00:00\n",
        );

        let table = read_workout_table(&path).unwrap();

        assert_eq!(table.samples.len(), 2);
        assert_eq!(table.session.sport.as_deref(), Some("swimming"));
        assert_eq!(table.session.total_distance_m, Some(1500.0));
        assert_eq!(table.session.pool_length_m, Some(25.0));
        assert_eq!(
            table.session.start_time,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap())
        );
        assert_eq!(table.samples[0].timestamp, Some(0.0));
        assert_eq!(table.samples[1].timestamp, Some(5.0));
        assert_eq!(table.speed_signal(), Some(Signal::EnhancedSpeed));
    }

    #[test]
    fn test_blank_and_invalid_cells_are_missing() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "run.csv",
            "speed,heart_rate,cadence\n3.0,,80\nabc,150,nan\n",
        );

        let table = read_workout_table(&path).unwrap();

        assert_eq!(table.samples[0].heart_rate, None);
        assert_eq!(table.samples[1].speed, None);
        assert_eq!(table.samples[1].cadence, None);
        assert_eq!(table.signal_values(Signal::HeartRate), vec![150.0]);
        // no timestamp column: row index
        assert_eq!(table.samples[1].timestamp, Some(1.0));
        assert!(!table.has_signal(Signal::Altitude));
        assert_eq!(table.session, SessionSummary::default());
    }

    #[test]
    fn test_header_only_file_has_no_samples() {
        let dir = tempdir().unwrap();
        let path = write(&dir, "empty.csv", "speed,cadence\n");
        let table = read_workout_table(&path).unwrap();
        assert!(table.samples.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = read_workout_table(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(parse_datetime("2024-05-06T07:08:09Z"), Some(expected));
        assert_eq!(parse_datetime("2024-05-06 07:08:09+00:00"), Some(expected));
        assert_eq!(parse_datetime("2024-05-06 07:08:09"), Some(expected));
        assert_eq!(parse_datetime("1714979289"), Some(expected));
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn test_activity_csv() {
        let dir = tempdir().unwrap();
        let path = write(
            &dir,
            "activities.csv",
            "id,start_date,sport_type,type,distance,moving_time,elapsed_time,average_heartrate,max_heartrate,total_elevation_gain\n\
             1,2024-04-01T06:30:00Z,Run,Run,10000,3000,3100,150,185,45\n\
             2,2024-04-02,,Swim,2000,,2700,,,\n\
             3,not-a-date,Run,Run,5000,1500,1500,,,\n",
        );

        let activities = CsvActivityImporter.import_file(&path).unwrap();

        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].start_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(activities[0].moving_time_s, Some(3000));
        assert_eq!(activities[0].average_heartrate, Some(dec!(150)));
        assert_eq!(activities[1].sport_type, None);
        assert_eq!(activities[1].sport_label(), "Swim");
        assert_eq!(activities[1].duration_seconds(), 2700);
    }
}
