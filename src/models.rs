use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sport types recognised by the analysis engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Running,
    Swimming,
    Walking,
    Cycling,
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::Running => write!(f, "running"),
            Sport::Swimming => write!(f, "swimming"),
            Sport::Walking => write!(f, "walking"),
            Sport::Cycling => write!(f, "cycling"),
        }
    }
}

/// Signal columns a raw sample may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Timestamp,
    Distance,
    Speed,
    EnhancedSpeed,
    HeartRate,
    Cadence,
    Altitude,
    StepLength,
}

/// One row of the ingested time series
///
/// Every field is optional. A missing value excludes the sample from that
/// signal's statistics; it is never treated as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Seconds from workout start (or row index when the device gives none)
    pub timestamp: Option<f64>,

    /// Cumulative distance in meters
    pub distance: Option<f64>,

    /// Raw speed in meters per second
    pub speed: Option<f64>,

    /// Device-smoothed speed in meters per second
    pub enhanced_speed: Option<f64>,

    /// Heart rate in beats per minute
    pub heart_rate: Option<f64>,

    /// Cadence (steps per minute running, strokes per minute swimming)
    pub cadence: Option<f64>,

    /// Altitude in meters
    pub altitude: Option<f64>,

    /// Step length in millimeters, as running dynamics pods record it
    pub step_length: Option<f64>,
}

impl RawSample {
    /// Value of a signal, with non-finite readings treated as missing
    pub fn get(&self, signal: Signal) -> Option<f64> {
        let value = match signal {
            Signal::Timestamp => self.timestamp,
            Signal::Distance => self.distance,
            Signal::Speed => self.speed,
            Signal::EnhancedSpeed => self.enhanced_speed,
            Signal::HeartRate => self.heart_rate,
            Signal::Cadence => self.cadence,
            Signal::Altitude => self.altitude,
            Signal::StepLength => self.step_length,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Session-level aggregates recorded once per workout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session start timestamp
    pub start_time: Option<DateTime<Utc>>,

    /// Sport string as written by the device or platform
    pub sport: Option<String>,

    /// Total distance in meters
    pub total_distance_m: Option<f64>,

    /// Total elapsed time in seconds
    pub total_elapsed_time_s: Option<f64>,

    /// Average speed in meters per second
    pub avg_speed_ms: Option<f64>,

    /// Average cadence (stroke rate for swims)
    pub avg_cadence: Option<f64>,

    /// Pool length in meters (pool swims only)
    pub pool_length_m: Option<f64>,

    /// Average heart rate in beats per minute
    pub avg_heart_rate: Option<f64>,

    /// Maximum heart rate in beats per minute
    pub max_heart_rate: Option<f64>,

    /// Total ascent in meters
    pub total_ascent_m: Option<f64>,

    /// Calories burned, as reported by the device
    pub total_calories: Option<f64>,
}

/// A complete recorded workout in tabular form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTable {
    pub samples: Vec<RawSample>,
    pub session: SessionSummary,
}

impl WorkoutTable {
    pub fn new(samples: Vec<RawSample>, session: SessionSummary) -> Self {
        WorkoutTable { samples, session }
    }

    /// A column is present when at least one sample carries a value for it
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.samples.iter().any(|s| s.get(signal).is_some())
    }

    /// All finite values of a signal, in recording order
    pub fn signal_values(&self, signal: Signal) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.get(signal)).collect()
    }

    /// Preferred speed column: device-smoothed first, then raw
    pub fn speed_signal(&self) -> Option<Signal> {
        [Signal::EnhancedSpeed, Signal::Speed]
            .into_iter()
            .find(|signal| self.has_signal(*signal))
    }
}

/// Activity summary as synced from a fitness platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Platform activity identifier
    pub id: Option<i64>,

    /// Activity start date
    pub start_date: NaiveDate,

    /// Preferred sport classification (e.g. "Swim", "Run", "VirtualRide")
    pub sport_type: Option<String>,

    /// Legacy activity type, used when sport_type is missing
    #[serde(rename = "type")]
    pub activity_type: Option<String>,

    /// Distance in meters
    pub distance_m: Option<f64>,

    /// Moving time in seconds
    pub moving_time_s: Option<u32>,

    /// Elapsed time in seconds
    pub elapsed_time_s: Option<u32>,

    /// Average heart rate in beats per minute
    pub average_heartrate: Option<Decimal>,

    /// Maximum heart rate in beats per minute
    pub max_heartrate: Option<Decimal>,

    /// Total elevation gain in meters
    pub total_elevation_gain: Option<f64>,
}

impl ActivitySummary {
    /// Sport label used for intensity defaults and filters
    pub fn sport_label(&self) -> &str {
        self.sport_type
            .as_deref()
            .or(self.activity_type.as_deref())
            .unwrap_or("Unknown")
    }

    /// Moving time when recorded, else elapsed time, else zero
    pub fn duration_seconds(&self) -> u32 {
        self.moving_time_s.or(self.elapsed_time_s).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(speed: Option<f64>, enhanced: Option<f64>) -> RawSample {
        RawSample {
            speed,
            enhanced_speed: enhanced,
            ..RawSample::default()
        }
    }

    #[test]
    fn test_sport_display() {
        assert_eq!(Sport::Swimming.to_string(), "swimming");
        assert_eq!(Sport::Running.to_string(), "running");
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let s = RawSample {
            heart_rate: Some(f64::NAN),
            cadence: Some(f64::INFINITY),
            speed: Some(1.2),
            ..RawSample::default()
        };

        assert_eq!(s.get(Signal::HeartRate), None);
        assert_eq!(s.get(Signal::Cadence), None);
        assert_eq!(s.get(Signal::Speed), Some(1.2));
    }

    #[test]
    fn test_speed_signal_priority() {
        let table = WorkoutTable::new(
            vec![sample(Some(1.0), Some(1.1)), sample(Some(1.0), None)],
            SessionSummary::default(),
        );
        assert_eq!(table.speed_signal(), Some(Signal::EnhancedSpeed));

        let raw_only = WorkoutTable::new(vec![sample(Some(1.0), None)], SessionSummary::default());
        assert_eq!(raw_only.speed_signal(), Some(Signal::Speed));

        let none = WorkoutTable::new(vec![RawSample::default()], SessionSummary::default());
        assert_eq!(none.speed_signal(), None);
    }

    #[test]
    fn test_activity_duration_fallback() {
        let mut activity = ActivitySummary {
            id: Some(1),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            sport_type: None,
            activity_type: Some("Run".to_string()),
            distance_m: Some(10000.0),
            moving_time_s: None,
            elapsed_time_s: Some(3000),
            average_heartrate: Some(dec!(150)),
            max_heartrate: Some(dec!(180)),
            total_elevation_gain: None,
        };

        assert_eq!(activity.duration_seconds(), 3000);
        assert_eq!(activity.sport_label(), "Run");

        activity.moving_time_s = Some(2800);
        activity.sport_type = Some("TrailRun".to_string());
        assert_eq!(activity.duration_seconds(), 2800);
        assert_eq!(activity.sport_label(), "TrailRun");
    }

    #[test]
    fn test_activity_summary_deserialization() {
        let json = r#"{
            "id": 42,
            "start_date": "2024-06-01",
            "sport_type": "Swim",
            "type": "Swim",
            "distance_m": 2000.0,
            "moving_time_s": 2400,
            "elapsed_time_s": 2700,
            "average_heartrate": null,
            "max_heartrate": null,
            "total_elevation_gain": null
        }"#;

        let activity: ActivitySummary = serde_json::from_str(json).unwrap();
        assert_eq!(activity.activity_type.as_deref(), Some("Swim"));
        assert_eq!(activity.duration_seconds(), 2400);
    }
}
