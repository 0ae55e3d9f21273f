//! Per-signal metric extraction from raw workout tables
//!
//! Every extractor here is a pure function of a [`WorkoutTable`]. A signal
//! column that is absent produces `None`; a column with too few usable samples
//! produces a degraded bundle flagged `insufficient_data` instead of an error.

use crate::models::{Signal, WorkoutTable};
use crate::stats;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Minimum cleaned samples before a signal's statistics are trusted
pub const MIN_SAMPLES: usize = 10;

/// Minimum cleaned speed samples for gear detection and classification
pub const MIN_PATTERN_SAMPLES: usize = 50;

/// A speed sample below this share of the mean counts as a stop
pub const STOP_THRESHOLD_RATIO: f64 = 0.10;

/// A speed sample at or above this share of the mean counts as fast
pub const GEAR_THRESHOLD_RATIO: f64 = 1.15;

/// Shortest contiguous fast run that counts as a gear
pub const MIN_GEAR_RUN: usize = 20;

/// Stroke rates at or above this are device artifacts
pub const MAX_STROKE_RATE: f64 = 100.0;

/// Paces at or above this (min/km) are treated as standing still
pub const MAX_RUN_PACE: f64 = 30.0;

/// Heart rates at or above this are sensor glitches
pub const MAX_HEART_RATE: f64 = 220.0;

/// Running cadences at or above this are sensor glitches
pub const MAX_RUN_CADENCE: f64 = 250.0;

/// Series length above which quarter/fifth drift windows are computed
pub const DRIFT_MIN_SAMPLES: usize = 20;

/// Speed statistics for a swim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedStats {
    /// Positive speed samples in m/s, recording order
    pub samples: Vec<f64>,
    pub avg: f64,
    pub std: f64,
    /// Coefficient of variation in percent
    pub cv: f64,
    pub num_stops: usize,
    pub stop_percentage: f64,
    pub insufficient_data: bool,
}

impl SpeedStats {
    fn from_samples(samples: Vec<f64>) -> Self {
        if samples.len() < MIN_SAMPLES {
            warn!(
                "Only {} valid speed samples, speed metrics degraded",
                samples.len()
            );
            return SpeedStats {
                samples,
                avg: 0.0,
                std: 0.0,
                cv: stats::UNSTABLE_CV,
                num_stops: 0,
                stop_percentage: 100.0,
                insufficient_data: true,
            };
        }

        let avg = stats::mean_or_zero(&samples);
        let std = stats::sample_std(&samples);
        let cv = stats::coefficient_of_variation(&samples);

        let stop_threshold = avg * STOP_THRESHOLD_RATIO;
        let num_stops = samples.iter().filter(|&&s| s < stop_threshold).count();
        let stop_percentage = num_stops as f64 / samples.len() as f64 * 100.0;

        SpeedStats {
            samples,
            avg,
            std,
            cv,
            num_stops,
            stop_percentage,
            insufficient_data: false,
        }
    }
}

/// Stroke rate statistics for a swim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeRateStats {
    /// Stroke rate samples in strokes per minute
    pub samples: Vec<f64>,
    pub avg: f64,
    pub std: f64,
    pub cv: f64,
    /// First-fifth mean minus last-fifth mean (positive means the rate fell)
    pub drop: Option<f64>,
    pub drop_pct: Option<f64>,
    pub insufficient_data: bool,
}

impl StrokeRateStats {
    fn from_samples(samples: Vec<f64>) -> Self {
        if samples.len() < MIN_SAMPLES {
            warn!(
                "Only {} valid stroke rate samples, stroke metrics degraded",
                samples.len()
            );
            return StrokeRateStats {
                avg: stats::mean_or_zero(&samples),
                samples,
                std: 0.0,
                cv: stats::UNSTABLE_CV,
                drop: None,
                drop_pct: None,
                insufficient_data: true,
            };
        }

        let (drop, drop_pct) = if samples.len() > DRIFT_MIN_SAMPLES {
            match stats::head_tail_means(&samples, 5) {
                Some((first, last)) => {
                    let drop = first - last;
                    let pct = if first > 0.0 { drop / first * 100.0 } else { 0.0 };
                    (Some(drop), Some(pct))
                }
                None => (None, None),
            }
        } else {
            (None, None)
        };

        StrokeRateStats {
            avg: stats::mean_or_zero(&samples),
            std: stats::sample_std(&samples),
            cv: stats::coefficient_of_variation(&samples),
            samples,
            drop,
            drop_pct,
            insufficient_data: false,
        }
    }
}

/// Sustained fast segments within a swim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearStats {
    pub gear_count: usize,
    pub has_speed_gears: bool,
}

impl GearStats {
    /// Count maximal runs of fast samples that last at least [`MIN_GEAR_RUN`]
    pub fn detect(samples: &[f64], avg: f64) -> Self {
        let fast_threshold = avg * GEAR_THRESHOLD_RATIO;
        let mut gear_count = 0;
        let mut run = 0;

        for &speed in samples {
            if speed >= fast_threshold {
                run += 1;
            } else {
                if run >= MIN_GEAR_RUN {
                    gear_count += 1;
                }
                run = 0;
            }
        }
        if run >= MIN_GEAR_RUN {
            gear_count += 1;
        }

        GearStats {
            gear_count,
            has_speed_gears: gear_count > 0,
        }
    }
}

/// Distance-per-stroke proxy (speed / stroke rate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyStats {
    pub ratios: Vec<f64>,
    pub speed: Vec<f64>,
    pub stroke_rate: Vec<f64>,
    pub avg: f64,
    /// Population standard deviation of the ratio series
    pub std: f64,
}

impl EfficiencyStats {
    fn from_series(speed: &[f64], stroke_rate: &[f64]) -> Option<Self> {
        let overlap = speed.len().min(stroke_rate.len());
        let (speed, stroke_rate): (Vec<f64>, Vec<f64>) = speed[..overlap]
            .iter()
            .zip(&stroke_rate[..overlap])
            .filter(|(s, r)| **s > 0.0 && **r > 0.0)
            .map(|(s, r)| (*s, *r))
            .unzip();

        if speed.is_empty() {
            return None;
        }

        let ratios: Vec<f64> = speed
            .iter()
            .zip(&stroke_rate)
            .map(|(s, r)| s / r)
            .collect();

        Some(EfficiencyStats {
            avg: stats::mean_or_zero(&ratios),
            std: stats::population_std(&ratios),
            ratios,
            speed,
            stroke_rate,
        })
    }
}

/// Everything the swim classifier and scorer need from a raw table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimMetrics {
    /// Session total distance, zero when the session does not record it
    pub distance_m: f64,
    pub speed: Option<SpeedStats>,
    pub stroke_rate: Option<StrokeRateStats>,
    pub gears: Option<GearStats>,
    pub efficiency: Option<EfficiencyStats>,
}

impl SwimMetrics {
    pub fn extract(table: &WorkoutTable) -> Self {
        let distance_m = table
            .session
            .total_distance_m
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);

        let speed = table.speed_signal().map(|signal| {
            let samples: Vec<f64> = table
                .signal_values(signal)
                .into_iter()
                .filter(|&v| v > 0.0)
                .collect();
            SpeedStats::from_samples(samples)
        });

        let stroke_rate = table.has_signal(Signal::Cadence).then(|| {
            let samples: Vec<f64> = table
                .signal_values(Signal::Cadence)
                .into_iter()
                .filter(|&v| v > 0.0 && v < MAX_STROKE_RATE)
                .collect();
            StrokeRateStats::from_samples(samples)
        });

        let gears = speed
            .as_ref()
            .filter(|s| !s.insufficient_data && s.samples.len() >= MIN_PATTERN_SAMPLES)
            .map(|s| GearStats::detect(&s.samples, s.avg));

        let efficiency = match (&speed, &stroke_rate) {
            (Some(speed), Some(stroke)) => {
                EfficiencyStats::from_series(&speed.samples, &stroke.samples)
            }
            _ => None,
        };

        SwimMetrics {
            distance_m,
            speed,
            stroke_rate,
            gears,
            efficiency,
        }
    }

    pub fn valid_speed_samples(&self) -> usize {
        self.speed.as_ref().map_or(0, |s| s.samples.len())
    }

    pub fn speed_avg(&self) -> Option<f64> {
        self.speed.as_ref().map(|s| s.avg)
    }

    pub fn speed_cv(&self) -> Option<f64> {
        self.speed.as_ref().map(|s| s.cv)
    }

    pub fn stop_percentage(&self) -> Option<f64> {
        self.speed.as_ref().map(|s| s.stop_percentage)
    }

    pub fn stroke_rate_cv(&self) -> Option<f64> {
        self.stroke_rate.as_ref().map(|s| s.cv)
    }

    pub fn stroke_rate_drop(&self) -> Option<f64> {
        self.stroke_rate.as_ref().and_then(|s| s.drop)
    }

    pub fn gear_count(&self) -> usize {
        self.gears.map_or(0, |g| g.gear_count)
    }

    pub fn has_speed_gears(&self) -> bool {
        self.gears.is_some_and(|g| g.has_speed_gears)
    }
}

/// Heart rate statistics for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateStats {
    pub samples: Vec<f64>,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    /// Last-quarter mean minus first-quarter mean (positive means HR rose)
    pub drift: Option<f64>,
    pub drift_pct: Option<f64>,
}

/// Cadence statistics for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceStats {
    pub samples: Vec<f64>,
    pub avg: f64,
    pub std: f64,
    pub cv: f64,
    /// First-quarter mean minus last-quarter mean (positive means cadence fell)
    pub drop: Option<f64>,
}

/// Pace series for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceStats {
    /// Pace samples in min/km
    pub samples: Vec<f64>,
    pub avg: f64,
}

/// Runner report metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub pace: Option<PaceStats>,
    pub heart_rate: Option<HeartRateStats>,
    pub cadence: Option<CadenceStats>,
    pub hr_pace_correlation: Option<f64>,
    /// Median heart rate divided by median pace
    pub efficiency_score: Option<f64>,
    /// Mean of the positive step-length readings
    pub avg_step_length: Option<f64>,
}

/// Convert a speed in m/s to a pace in min/km
pub fn speed_to_pace(speed_ms: f64) -> Option<f64> {
    (speed_ms > 0.0).then(|| 1000.0 / speed_ms / 60.0)
}

impl RunMetrics {
    pub fn extract(table: &WorkoutTable) -> Self {
        let pace = table.speed_signal().map(|signal| {
            let samples: Vec<f64> = table
                .signal_values(signal)
                .into_iter()
                .filter_map(speed_to_pace)
                .filter(|&p| p < MAX_RUN_PACE)
                .collect();
            PaceStats {
                avg: stats::mean_or_zero(&samples),
                samples,
            }
        });

        let heart_rate = table.has_signal(Signal::HeartRate).then(|| {
            let samples: Vec<f64> = table
                .signal_values(Signal::HeartRate)
                .into_iter()
                .filter(|&hr| hr > 0.0 && hr < MAX_HEART_RATE)
                .collect();
            Self::heart_rate_stats(samples)
        });

        let cadence = table.has_signal(Signal::Cadence).then(|| {
            let samples: Vec<f64> = table
                .signal_values(Signal::Cadence)
                .into_iter()
                .filter(|&c| c > 0.0 && c < MAX_RUN_CADENCE)
                .collect();
            let drop = if samples.len() > DRIFT_MIN_SAMPLES {
                stats::head_tail_means(&samples, 4).map(|(first, last)| first - last)
            } else {
                None
            };
            CadenceStats {
                avg: stats::mean_or_zero(&samples),
                std: stats::sample_std(&samples),
                cv: stats::coefficient_of_variation(&samples),
                samples,
                drop,
            }
        });

        let (hr_pace_correlation, efficiency_score) = match (&pace, &heart_rate) {
            (Some(pace), Some(hr)) => {
                let overlap = pace.samples.len().min(hr.samples.len());
                let correlation = if overlap > MIN_SAMPLES {
                    stats::correlation(&hr.samples[..overlap], &pace.samples[..overlap])
                } else {
                    None
                };
                let efficiency = match (
                    stats::median(&hr.samples),
                    stats::median(&pace.samples),
                ) {
                    (Some(hr), Some(pace)) if hr > 0.0 && pace > 0.0 => Some(hr / pace),
                    _ => None,
                };
                (correlation, efficiency)
            }
            _ => (None, None),
        };

        let step_lengths: Vec<f64> = table
            .signal_values(Signal::StepLength)
            .into_iter()
            .filter(|&s| s > 0.0)
            .collect();

        RunMetrics {
            pace,
            heart_rate,
            cadence,
            hr_pace_correlation,
            efficiency_score,
            avg_step_length: stats::mean(&step_lengths),
        }
    }

    fn heart_rate_stats(samples: Vec<f64>) -> HeartRateStats {
        let (drift, drift_pct) = if samples.len() > DRIFT_MIN_SAMPLES {
            match stats::head_tail_means(&samples, 4) {
                Some((first, last)) => {
                    let drift = last - first;
                    let pct = if first > 0.0 { drift / first * 100.0 } else { 0.0 };
                    (Some(drift), Some(pct))
                }
                None => (None, None),
            }
        } else {
            (None, None)
        };

        HeartRateStats {
            avg: stats::mean_or_zero(&samples),
            max: samples.iter().copied().fold(0.0, f64::max),
            min: samples.iter().copied().reduce(f64::min).unwrap_or(0.0),
            samples,
            drift,
            drift_pct,
        }
    }

    pub fn hr_drift_pct(&self) -> Option<f64> {
        self.heart_rate.as_ref().and_then(|hr| hr.drift_pct)
    }

    pub fn cadence_cv(&self) -> Option<f64> {
        self.cadence
            .as_ref()
            .filter(|c| !c.samples.is_empty())
            .map(|c| c.cv)
    }

    pub fn cadence_drop(&self) -> Option<f64> {
        self.cadence.as_ref().and_then(|c| c.drop)
    }
}

/// Heart rate stability over a long run (halves split)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrStability {
    pub stability_score: f64,
    pub cv: f64,
    /// Second-half mean minus first-half mean in bpm
    pub drift: f64,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub min_hr: Option<f64>,
    pub insufficient_data: bool,
}

impl HrStability {
    fn degraded() -> Self {
        HrStability {
            stability_score: 0.0,
            cv: stats::UNSTABLE_CV,
            drift: 0.0,
            avg_hr: None,
            max_hr: None,
            min_hr: None,
            insufficient_data: true,
        }
    }

    pub fn extract(table: &WorkoutTable) -> Self {
        let samples = table.signal_values(Signal::HeartRate);
        if samples.len() < MIN_SAMPLES {
            return Self::degraded();
        }

        let cv = stats::coefficient_of_variation(&samples);
        let (first, second) = stats::split_halves(&samples);
        let drift = stats::mean_or_zero(second) - stats::mean_or_zero(first);
        let stability_score = (100.0 - cv * 10.0 - drift.abs() * 2.0).max(0.0);

        HrStability {
            stability_score,
            cv,
            drift,
            avg_hr: stats::mean(&samples),
            max_hr: samples.iter().copied().reduce(f64::max),
            min_hr: samples.iter().copied().reduce(f64::min),
            insufficient_data: false,
        }
    }
}

/// Cadence stability over a long run (halves split)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceStability {
    pub stability_score: f64,
    pub cv: f64,
    /// First-half mean minus second-half mean (positive means cadence fell)
    pub degradation: f64,
    pub avg_cadence: Option<f64>,
    pub insufficient_data: bool,
}

impl CadenceStability {
    fn degraded() -> Self {
        CadenceStability {
            stability_score: 0.0,
            cv: stats::UNSTABLE_CV,
            degradation: 0.0,
            avg_cadence: None,
            insufficient_data: true,
        }
    }

    pub fn extract(table: &WorkoutTable) -> Self {
        let samples = table.signal_values(Signal::Cadence);
        if samples.len() < MIN_SAMPLES {
            return Self::degraded();
        }

        let cv = stats::coefficient_of_variation(&samples);
        let (first, second) = stats::split_halves(&samples);
        let degradation = stats::mean_or_zero(first) - stats::mean_or_zero(second);
        let stability_score = (100.0 - cv * 15.0 - degradation.abs() * 5.0).max(0.0);

        CadenceStability {
            stability_score,
            cv,
            degradation,
            avg_cadence: stats::mean(&samples),
            insufficient_data: false,
        }
    }
}

/// Pace stability over a long run (halves split)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaceStability {
    pub stability_score: f64,
    /// Second-half pace minus first-half pace in min/km (positive means slower)
    pub degradation: f64,
    pub avg_speed_ms: Option<f64>,
    pub insufficient_data: bool,
}

impl PaceStability {
    fn degraded() -> Self {
        PaceStability {
            stability_score: 0.0,
            degradation: 0.0,
            avg_speed_ms: None,
            insufficient_data: true,
        }
    }

    pub fn extract(table: &WorkoutTable) -> Self {
        let samples: Vec<f64> = match table.speed_signal() {
            Some(signal) => table
                .signal_values(signal)
                .into_iter()
                .filter(|&v| v > 0.0)
                .collect(),
            None => Vec::new(),
        };
        if samples.len() < MIN_SAMPLES {
            return Self::degraded();
        }

        let (first, second) = stats::split_halves(&samples);
        let degradation = match (
            speed_to_pace(stats::mean_or_zero(first)),
            speed_to_pace(stats::mean_or_zero(second)),
        ) {
            (Some(first_pace), Some(second_pace)) => second_pace - first_pace,
            _ => 0.0,
        };
        let stability_score = (100.0 - degradation.abs() * 40.0).max(0.0);

        PaceStability {
            stability_score,
            degradation,
            avg_speed_ms: stats::mean(&samples),
            insufficient_data: false,
        }
    }
}

/// Halves-based stability of all three long-run signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRunMetrics {
    pub heart_rate: HrStability,
    pub cadence: CadenceStability,
    pub pace: PaceStability,
}

impl LongRunMetrics {
    pub fn extract(table: &WorkoutTable) -> Self {
        LongRunMetrics {
            heart_rate: HrStability::extract(table),
            cadence: CadenceStability::extract(table),
            pace: PaceStability::extract(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawSample, SessionSummary};

    fn swim_table(speeds: &[f64], cadences: &[f64], distance: f64) -> WorkoutTable {
        let len = speeds.len().max(cadences.len());
        let samples = (0..len)
            .map(|i| RawSample {
                timestamp: Some(i as f64),
                enhanced_speed: speeds.get(i).copied(),
                cadence: cadences.get(i).copied(),
                ..RawSample::default()
            })
            .collect();
        let session = SessionSummary {
            total_distance_m: Some(distance),
            ..SessionSummary::default()
        };
        WorkoutTable::new(samples, session)
    }

    fn hr_table(hrs: &[f64]) -> WorkoutTable {
        let samples = hrs
            .iter()
            .map(|&hr| RawSample {
                heart_rate: Some(hr),
                ..RawSample::default()
            })
            .collect();
        WorkoutTable::new(samples, SessionSummary::default())
    }

    #[test]
    fn test_speed_drops_non_positive_samples() {
        let mut speeds = vec![1.0; 30];
        speeds.extend([0.0, -1.0, f64::NAN]);
        let metrics = SwimMetrics::extract(&swim_table(&speeds, &[], 1500.0));
        let speed = metrics.speed.unwrap();

        assert_eq!(speed.samples.len(), 30);
        assert_eq!(speed.avg, 1.0);
        assert_eq!(speed.cv, 0.0);
        assert_eq!(speed.num_stops, 0);
        assert!(!speed.insufficient_data);
    }

    #[test]
    fn test_speed_insufficient_data_is_degraded() {
        let metrics = SwimMetrics::extract(&swim_table(&[1.0; 5], &[], 200.0));
        let speed = metrics.speed.unwrap();

        assert!(speed.insufficient_data);
        assert_eq!(speed.avg, 0.0);
        assert_eq!(speed.cv, 100.0);
        assert_eq!(speed.stop_percentage, 100.0);
        assert!(metrics.gears.is_none());
    }

    #[test]
    fn test_missing_columns_are_absent() {
        let table = WorkoutTable::new(vec![RawSample::default(); 60], SessionSummary::default());
        let metrics = SwimMetrics::extract(&table);

        assert!(metrics.speed.is_none());
        assert!(metrics.stroke_rate.is_none());
        assert!(metrics.gears.is_none());
        assert!(metrics.efficiency.is_none());
        assert_eq!(metrics.distance_m, 0.0);
        assert_eq!(metrics.valid_speed_samples(), 0);
    }

    #[test]
    fn test_stop_detection() {
        let mut speeds = vec![1.0; 90];
        speeds.extend(vec![0.05; 10]);
        let speed = SwimMetrics::extract(&swim_table(&speeds, &[], 1000.0))
            .speed
            .unwrap();

        // mean 0.905, threshold 0.0905
        assert_eq!(speed.num_stops, 10);
        assert!((speed.stop_percentage - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_gear_detection_counts_long_runs_only() {
        let mut speeds = Vec::new();
        for _ in 0..3 {
            speeds.extend(vec![1.0; 30]);
            speeds.extend(vec![1.5; 25]);
        }
        // a short spike should not count
        speeds.extend(vec![1.0; 10]);
        speeds.extend(vec![1.5; 5]);
        speeds.extend(vec![1.0; 10]);

        let metrics = SwimMetrics::extract(&swim_table(&speeds, &[], 2000.0));
        let gears = metrics.gears.unwrap();
        assert_eq!(gears.gear_count, 3);
        assert!(gears.has_speed_gears);
    }

    #[test]
    fn test_gear_run_at_end_of_series() {
        let mut samples = vec![1.0; 40];
        samples.extend(vec![2.0; 20]);
        let avg = stats::mean_or_zero(&samples);
        assert_eq!(GearStats::detect(&samples, avg).gear_count, 1);
    }

    #[test]
    fn test_gears_need_fifty_samples() {
        let metrics = SwimMetrics::extract(&swim_table(&[1.0; 49], &[], 1000.0));
        assert!(metrics.gears.is_none());

        let metrics = SwimMetrics::extract(&swim_table(&[1.0; 50], &[], 1000.0));
        assert_eq!(metrics.gears.unwrap().gear_count, 0);
    }

    #[test]
    fn test_stroke_rate_filter_and_drop() {
        let mut cadences = vec![30.0; 25];
        cadences.extend(vec![26.0; 25]);
        cadences.extend([0.0, 120.0]);
        let stroke = SwimMetrics::extract(&swim_table(&[], &cadences, 0.0))
            .stroke_rate
            .unwrap();

        assert_eq!(stroke.samples.len(), 50);
        assert!((stroke.avg - 28.0).abs() < 1e-9);
        assert_eq!(stroke.drop, Some(4.0));
        let pct = stroke.drop_pct.unwrap();
        assert!((pct - 4.0 / 30.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_stroke_rate_short_series_has_no_drop() {
        let stroke = SwimMetrics::extract(&swim_table(&[], &[30.0; 15], 0.0))
            .stroke_rate
            .unwrap();
        assert_eq!(stroke.drop, None);
        assert!(!stroke.insufficient_data);
    }

    #[test]
    fn test_efficiency_over_overlap() {
        let speeds = vec![1.2; 20];
        let cadences = vec![30.0; 15];
        let efficiency = SwimMetrics::extract(&swim_table(&speeds, &cadences, 500.0))
            .efficiency
            .unwrap();

        assert_eq!(efficiency.ratios.len(), 15);
        assert!((efficiency.avg - 0.04).abs() < 1e-12);
        assert!(efficiency.std.abs() < 1e-12);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let speeds: Vec<f64> = (0..200).map(|i| 1.0 + (i % 7) as f64 * 0.05).collect();
        let cadences: Vec<f64> = (0..200).map(|i| 28.0 + (i % 5) as f64).collect();
        let table = swim_table(&speeds, &cadences, 1800.0);

        assert_eq!(SwimMetrics::extract(&table), SwimMetrics::extract(&table));
    }

    #[test]
    fn test_run_hr_quarter_drift() {
        let mut hrs = vec![140.0; 50];
        hrs.extend(vec![160.0; 50]);
        let metrics = RunMetrics::extract(&hr_table(&hrs));
        let hr = metrics.heart_rate.unwrap();

        assert_eq!(hr.drift, Some(20.0));
        assert!((hr.drift_pct.unwrap() - 14.285714285714286).abs() < 1e-9);
        assert_eq!(hr.max, 160.0);
        assert_eq!(hr.min, 140.0);
    }

    #[test]
    fn test_run_hr_filter() {
        let metrics = RunMetrics::extract(&hr_table(&[0.0, 150.0, 250.0, 155.0]));
        let hr = metrics.heart_rate.unwrap();
        assert_eq!(hr.samples, vec![150.0, 155.0]);
        assert_eq!(hr.drift, None);
    }

    #[test]
    fn test_run_pace_and_efficiency() {
        let samples = (0..40)
            .map(|i| RawSample {
                speed: Some(if i % 2 == 0 { 3.0 } else { 2.5 }),
                heart_rate: Some(if i % 2 == 0 { 160.0 } else { 150.0 }),
                cadence: Some(170.0),
                ..RawSample::default()
            })
            .collect();
        let metrics = RunMetrics::extract(&WorkoutTable::new(samples, SessionSummary::default()));

        let pace = metrics.pace.as_ref().unwrap();
        assert_eq!(pace.samples.len(), 40);
        // faster speed pairs with higher HR, so HR and pace move in opposite directions
        assert!(metrics.hr_pace_correlation.unwrap() < -0.99);
        assert!(metrics.efficiency_score.unwrap() > 0.0);
        assert_eq!(metrics.cadence_cv(), Some(0.0));
        assert_eq!(metrics.cadence_drop(), Some(0.0));
        assert_eq!(metrics.avg_step_length, None);
    }

    #[test]
    fn test_step_length_ignores_zero_readings() {
        let samples = [0.0, 1100.0, 1200.0, 1300.0]
            .iter()
            .map(|&step| RawSample {
                step_length: Some(step),
                ..RawSample::default()
            })
            .collect();
        let metrics = RunMetrics::extract(&WorkoutTable::new(samples, SessionSummary::default()));
        assert!((metrics.avg_step_length.unwrap() - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_to_pace() {
        assert_eq!(speed_to_pace(0.0), None);
        let pace = speed_to_pace(1000.0 / 300.0).unwrap();
        assert!((pace - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_long_run_hr_stability() {
        let mut hrs = vec![140.0; 30];
        hrs.extend(vec![150.0; 30]);
        let hr = HrStability::extract(&hr_table(&hrs));

        assert_eq!(hr.drift, 10.0);
        assert!(!hr.insufficient_data);
        let expected = (100.0 - hr.cv * 10.0 - 20.0).max(0.0);
        assert!((hr.stability_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_long_run_degraded_below_minimum() {
        let metrics = LongRunMetrics::extract(&hr_table(&[150.0; 5]));
        assert!(metrics.heart_rate.insufficient_data);
        assert_eq!(metrics.heart_rate.cv, 100.0);
        assert_eq!(metrics.cadence.stability_score, 0.0);
        assert!(metrics.pace.insufficient_data);
    }

    #[test]
    fn test_long_run_pace_degradation() {
        let samples = (0..20)
            .map(|i| RawSample {
                speed: Some(if i < 10 { 1000.0 / 300.0 } else { 1000.0 / 330.0 }),
                ..RawSample::default()
            })
            .collect();
        let pace = PaceStability::extract(&WorkoutTable::new(samples, SessionSummary::default()));

        // 5:00/km to 5:30/km
        assert!((pace.degradation - 0.5).abs() < 1e-9);
        assert!((pace.stability_score - 80.0).abs() < 1e-9);
    }
}
