//! Running economy from the heart-rate versus speed relationship
//!
//! A runner whose heart rate climbs slowly as speed rises is economical. The
//! slope of a least-squares line through (speed, HR) pairs measures that in
//! bpm per m/s.

use crate::metrics::{speed_to_pace, MAX_HEART_RATE, MAX_RUN_PACE, MIN_SAMPLES};
use crate::models::{Signal, WorkoutTable};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Speeds at or above this (m/s) are GPS glitches
pub const MAX_RUN_SPEED: f64 = 10.0;

/// Economy rating from the HR-per-speed slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyRating {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl EconomyRating {
    pub fn from_slope(bpm_per_ms: f64) -> Self {
        if bpm_per_ms < 8.0 {
            EconomyRating::Excellent
        } else if bpm_per_ms < 12.0 {
            EconomyRating::Good
        } else if bpm_per_ms < 18.0 {
            EconomyRating::Moderate
        } else {
            EconomyRating::Poor
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EconomyRating::Excellent => "Very economical",
            EconomyRating::Good => "Economical",
            EconomyRating::Moderate => "Room for improvement",
            EconomyRating::Poor => "Not economical",
        }
    }
}

impl fmt::Display for EconomyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EconomyRating::Excellent => "EXCELLENT",
            EconomyRating::Good => "GOOD",
            EconomyRating::Moderate => "MODERATE",
            EconomyRating::Poor => "POOR",
        };
        write!(f, "{} - {}", label, self.description())
    }
}

/// Mean heart rate in the slow, middle and fast parts of the pace range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HrAtPace {
    /// Paces at or above the 75th percentile
    pub easy: Option<f64>,
    /// Paces within 5% of the median
    pub moderate: Option<f64>,
    /// Paces at or below the 25th percentile
    pub hard: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningEconomy {
    /// HR increase per m/s of speed
    pub speed_slope: f64,
    pub intercept: f64,
    /// HR change per min/km of pace
    pub pace_slope: Option<f64>,
    pub correlation: Option<f64>,
    pub hr_at_pace: HrAtPace,
    pub avg_hr: f64,
    pub avg_pace: f64,
    pub rating: EconomyRating,
}

impl RunningEconomy {
    /// Fit HR against speed over the valid, position-aligned samples
    ///
    /// `None` without both signals, with `MIN_SAMPLES` or fewer valid points,
    /// or when the speed never varies.
    pub fn extract(table: &WorkoutTable) -> Option<Self> {
        let speed_signal = table.speed_signal()?;
        let hr = table.signal_values(Signal::HeartRate);
        let speed = table.signal_values(speed_signal);

        let mut hr_valid = Vec::new();
        let mut speed_valid = Vec::new();
        let mut pace_valid = Vec::new();
        for (&h, &s) in hr.iter().zip(speed.iter()) {
            let Some(p) = speed_to_pace(s) else { continue };
            if h > 0.0 && h < MAX_HEART_RATE && s < MAX_RUN_SPEED && p < MAX_RUN_PACE {
                hr_valid.push(h);
                speed_valid.push(s);
                pace_valid.push(p);
            }
        }

        if hr_valid.len() <= MIN_SAMPLES {
            debug!("Running economy skipped: {} valid points", hr_valid.len());
            return None;
        }

        let (speed_slope, intercept) = stats::linear_fit(&speed_valid, &hr_valid)?;
        let pace_slope = stats::linear_fit(&pace_valid, &hr_valid).map(|(slope, _)| slope);

        Some(RunningEconomy {
            speed_slope,
            intercept,
            pace_slope,
            correlation: stats::correlation(&speed_valid, &hr_valid),
            hr_at_pace: hr_at_pace(&pace_valid, &hr_valid),
            avg_hr: stats::mean_or_zero(&hr_valid),
            avg_pace: stats::mean_or_zero(&pace_valid),
            rating: EconomyRating::from_slope(speed_slope),
        })
    }
}

fn hr_at_pace(pace: &[f64], hr: &[f64]) -> HrAtPace {
    let slow = stats::quantile(pace, 0.75);
    let fast = stats::quantile(pace, 0.25);
    let middle = stats::median(pace);

    HrAtPace {
        easy: slow.and_then(|q| mean_hr_where(pace, hr, |p| p >= q)),
        moderate: middle.and_then(|m| mean_hr_where(pace, hr, |p| p >= m * 0.95 && p <= m * 1.05)),
        hard: fast.and_then(|q| mean_hr_where(pace, hr, |p| p <= q)),
    }
}

fn mean_hr_where(pace: &[f64], hr: &[f64], keep: impl Fn(f64) -> bool) -> Option<f64> {
    let selected: Vec<f64> = pace
        .iter()
        .zip(hr)
        .filter(|&(&p, _)| keep(p))
        .map(|(_, &h)| h)
        .collect();
    stats::mean(&selected)
}
