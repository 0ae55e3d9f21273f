//! Running analysis
//!
//! Three views of running data: a per-run execution score from quarter-based
//! drift, a long-run quality grade from halves-based stability, and a block
//! review of strengths and gaps over a window of synced activities.

use crate::classifier::ActivityKind;
use crate::economy::RunningEconomy;
use crate::metrics::{LongRunMetrics, RunMetrics};
use crate::models::{ActivitySummary, WorkoutTable};
use crate::stats;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Runs at or above this distance count as long runs in a block review
pub const LONG_RUN_KM: f64 = 15.0;

/// Runs below this distance count as short runs in a block review
pub const SHORT_RUN_KM: f64 = 5.0;

/// Default window for block reviews
pub const DEFAULT_BLOCK_DAYS: i64 = 90;

/// Pace samples needed before a run is split into segments
pub const MIN_INTERVAL_SAMPLES: usize = 50;

/// Equal-length segments a run is split into
pub const INTERVAL_SEGMENTS: usize = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RunningError {
    #[error("Invalid review window: {0}")]
    InvalidWindow(String),
}

/// Three-level grade used by both run scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RunGrade {
    A,
    B,
    C,
}

impl fmt::Display for RunGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            RunGrade::A => "A",
            RunGrade::B => "B",
            RunGrade::C => "C",
        };
        write!(f, "{}", letter)
    }
}

/// Single-run report: metrics, detected activity and execution score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerReport {
    pub start_time: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
    pub duration_s: Option<f64>,
    pub activity_kind: ActivityKind,
    pub metrics: RunMetrics,
    pub execution_score: RunGrade,
    pub intervals: Option<Vec<RunInterval>>,
    pub economy: Option<RunningEconomy>,
}

/// One equal-length segment of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInterval {
    /// 1-based segment number
    pub rep: usize,
    pub pace_avg: f64,
    pub pace_min: f64,
    pub pace_max: f64,
    pub hr_avg: Option<f64>,
    pub hr_max: Option<f64>,
    pub cadence_avg: Option<f64>,
}

/// Long-run quality grade with the stability flags behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRunAnalysis {
    pub start_time: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
    pub grade: RunGrade,
    pub recommendation: String,
    pub metrics: LongRunMetrics,
    pub hr_stable: bool,
    pub cadence_stable: bool,
    pub pace_stable: bool,
}

/// One run as seen by the block review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub duration_min: f64,
    pub pace_min_per_km: Option<f64>,
    pub avg_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub elevation_gain: f64,
}

/// Aggregates over a block of runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningBlockMetrics {
    pub total_runs: usize,
    pub total_distance_km: f64,
    pub avg_distance_km: f64,
    pub avg_pace_min_per_km: Option<f64>,
    pub pace_std: f64,
    pub runs_per_week: f64,
    pub short_runs_count: usize,
    pub medium_runs_count: usize,
    pub long_runs_count: usize,
    pub avg_hr: Option<f64>,
    pub elevation_percentage: f64,
    pub runs: Vec<RunEntry>,
}

/// Strengths, gaps and a recommendation for a block of running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningBlockAnalysis {
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub metrics: Option<RunningBlockMetrics>,
    pub total_runs: usize,
    pub period_days: i64,
}

/// Session distance in km, reading small values as already in km
pub(crate) fn session_distance_km(table: &WorkoutTable) -> Option<f64> {
    let distance = table.session.total_distance_m.filter(|d| d.is_finite())?;
    if distance > 100.0 {
        Some(distance / 1000.0)
    } else if distance < 0.1 {
        None
    } else {
        Some(distance)
    }
}

pub struct RunningAnalyzer;

impl RunningAnalyzer {
    /// Execution score from HR drift, cadence variation and cadence drop
    pub fn execution_score(metrics: &RunMetrics) -> RunGrade {
        let mut score = 0;

        if let Some(drift_pct) = metrics.hr_drift_pct() {
            if drift_pct.abs() < 5.0 {
                score += 2;
            } else if drift_pct.abs() < 10.0 {
                score += 1;
            }
        }

        if let Some(cv) = metrics.cadence_cv() {
            if cv < 5.0 {
                score += 2;
            } else if cv < 10.0 {
                score += 1;
            }
        }

        if let Some(drop) = metrics.cadence_drop() {
            if drop < 2.0 {
                score += 1;
            }
        }

        match score {
            4.. => RunGrade::A,
            2..=3 => RunGrade::B,
            _ => RunGrade::C,
        }
    }

    /// Metrics and execution score for one run
    pub fn runner_report(table: &WorkoutTable) -> RunnerReport {
        let metrics = RunMetrics::extract(table);
        let avg_pace = metrics
            .pace
            .as_ref()
            .filter(|p| !p.samples.is_empty())
            .map(|p| p.avg);
        let activity_kind = ActivityKind::detect(avg_pace, table.session.sport.as_deref());
        let execution_score = Self::execution_score(&metrics);
        let intervals = Self::detect_intervals(&metrics);
        let economy = RunningEconomy::extract(table);

        debug!(%activity_kind, %execution_score, "Runner report scored");

        RunnerReport {
            start_time: table.session.start_time,
            distance_km: session_distance_km(table),
            duration_s: table.session.total_elapsed_time_s,
            activity_kind,
            metrics,
            execution_score,
            intervals,
            economy,
        }
    }

    /// Split the pace series into [`INTERVAL_SEGMENTS`] equal segments
    ///
    /// A trailing remainder shorter than one segment is dropped. Heart rate
    /// and cadence are attached to a segment only when their series cover it.
    pub fn detect_intervals(metrics: &RunMetrics) -> Option<Vec<RunInterval>> {
        let pace = &metrics.pace.as_ref()?.samples;
        if pace.len() < MIN_INTERVAL_SAMPLES {
            return None;
        }
        let empty = Vec::new();
        let hr = metrics.heart_rate.as_ref().map_or(&empty, |h| &h.samples);
        let cadence = metrics.cadence.as_ref().map_or(&empty, |c| &c.samples);

        let segment_len = pace.len() / INTERVAL_SEGMENTS;
        let intervals: Vec<RunInterval> = pace
            .chunks_exact(segment_len)
            .enumerate()
            .map(|(i, segment)| {
                let range = i * segment_len..(i + 1) * segment_len;
                let seg_hr = hr.get(range.clone());
                RunInterval {
                    rep: i + 1,
                    pace_avg: stats::mean_or_zero(segment),
                    pace_min: segment.iter().copied().fold(f64::INFINITY, f64::min),
                    pace_max: segment.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    hr_avg: seg_hr.and_then(stats::mean),
                    hr_max: seg_hr.and_then(|s| s.iter().copied().reduce(f64::max)),
                    cadence_avg: cadence.get(range).and_then(stats::mean),
                }
            })
            .collect();

        (intervals.len() > 1).then_some(intervals)
    }

    /// Grade a long run on heart rate, cadence and pace stability
    pub fn score_long_run(table: &WorkoutTable) -> LongRunAnalysis {
        let metrics = LongRunMetrics::extract(table);
        let hr = &metrics.heart_rate;
        let cadence = &metrics.cadence;
        let pace = &metrics.pace;

        let hr_stable = hr.cv < 8.0 && hr.drift.abs() < 8.0;
        let cadence_stable = cadence.cv < 5.0 && cadence.degradation.abs() < 3.0;
        let pace_stable = pace.degradation.abs() < 0.5;

        let hr_degrading = hr.drift.abs() > 15.0 || hr.cv > 12.0;
        let cadence_degrading = cadence.degradation < -5.0 || cadence.cv > 8.0;
        let pace_degrading = pace.degradation > 1.0;

        let hr_controlled = hr.drift.abs() < 15.0 && hr.cv < 12.0;
        let minor_form_loss =
            (!cadence_stable || !pace_stable) && !(cadence_degrading && pace_degrading);

        let (grade, recommendation) = if hr_stable && cadence_stable && pace_stable {
            (RunGrade::A, "Progress volume or terrain")
        } else if hr_controlled
            && minor_form_loss
            && !(hr_degrading && cadence_degrading && pace_degrading)
        {
            (RunGrade::B, "Repeat similar load")
        } else {
            (RunGrade::C, "Reduce load next week")
        };

        debug!(
            hr_stable,
            cadence_stable,
            pace_stable,
            %grade,
            "Long run graded"
        );

        LongRunAnalysis {
            start_time: table.session.start_time,
            distance_km: session_distance_km(table),
            grade,
            recommendation: recommendation.to_string(),
            metrics,
            hr_stable,
            cadence_stable,
            pace_stable,
        }
    }

    /// Most recent tables of at least `min_distance_km`, newest first
    pub fn select_long_runs(
        tables: &[WorkoutTable],
        min_distance_km: f64,
        top_n: usize,
    ) -> Vec<&WorkoutTable> {
        let mut runs: Vec<&WorkoutTable> = tables
            .iter()
            .filter(|t| session_distance_km(t).is_some_and(|d| d >= min_distance_km))
            .collect();
        // Option orders None first, so reversing puts undated runs last
        runs.sort_by(|a, b| b.session.start_time.cmp(&a.session.start_time));
        runs.truncate(top_n);
        runs
    }

    /// Review running activities dated within `days` of `today`
    pub fn analyze_block(
        activities: &[ActivitySummary],
        days: i64,
        today: NaiveDate,
    ) -> Result<RunningBlockAnalysis, RunningError> {
        let start = u64::try_from(days)
            .ok()
            .and_then(|d| today.checked_sub_days(Days::new(d)))
            .ok_or_else(|| {
                RunningError::InvalidWindow(format!("{} days before {}", days, today))
            })?;
        let in_window: Vec<&ActivitySummary> = activities
            .iter()
            .filter(|a| a.start_date >= start && a.start_date <= today)
            .filter(|a| is_run(a))
            .collect();

        if in_window.is_empty() {
            return Ok(RunningBlockAnalysis {
                strengths: Vec::new(),
                gaps: vec!["No running activities found in the selected period".to_string()],
                recommendations: vec!["Start logging running activities to get insights".to_string()],
                metrics: None,
                total_runs: 0,
                period_days: days,
            });
        }

        let mut runs: Vec<RunEntry> = in_window.iter().filter_map(|a| run_entry(a)).collect();
        runs.sort_by_key(|r| r.date);

        if runs.is_empty() {
            return Ok(RunningBlockAnalysis {
                strengths: Vec::new(),
                gaps: vec!["Activities found but missing distance/time data".to_string()],
                recommendations: Vec::new(),
                metrics: None,
                total_runs: in_window.len(),
                period_days: days,
            });
        }

        let metrics = block_metrics(runs);
        let strengths = block_strengths(&metrics, days);
        let gaps = block_gaps(&metrics, days);
        let recommendations = gaps
            .first()
            .and_then(|gap| gap_recommendation(gap))
            .map(|r| vec![r.to_string()])
            .unwrap_or_default();

        info!(
            "Reviewed {} runs over {} days: {} strengths, {} gaps",
            metrics.total_runs,
            days,
            strengths.len(),
            gaps.len()
        );

        Ok(RunningBlockAnalysis {
            strengths,
            gaps,
            recommendations,
            total_runs: metrics.total_runs,
            metrics: Some(metrics),
            period_days: days,
        })
    }

    /// Block review ending today (UTC)
    pub fn analyze_recent_block(
        activities: &[ActivitySummary],
        days: i64,
    ) -> Result<RunningBlockAnalysis, RunningError> {
        Self::analyze_block(activities, days, Utc::now().date_naive())
    }
}

fn is_run(activity: &ActivitySummary) -> bool {
    let matches = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("run"))
    };
    matches(&activity.sport_type) || matches(&activity.activity_type)
}

fn run_entry(activity: &ActivitySummary) -> Option<RunEntry> {
    let distance_m = activity.distance_m.filter(|d| *d > 0.0)?;
    let distance_km = distance_m / 1000.0;
    let duration_min = f64::from(activity.duration_seconds()) / 60.0;
    let pace_min_per_km = (duration_min > 0.0).then(|| duration_min / distance_km);

    Some(RunEntry {
        date: activity.start_date,
        distance_km,
        duration_min,
        pace_min_per_km,
        avg_hr: activity.average_heartrate.and_then(|hr| hr.to_f64()),
        max_hr: activity.max_heartrate.and_then(|hr| hr.to_f64()),
        elevation_gain: activity.total_elevation_gain.unwrap_or(0.0),
    })
}

fn block_metrics(runs: Vec<RunEntry>) -> RunningBlockMetrics {
    let total_runs = runs.len();
    let total_distance_km: f64 = runs.iter().map(|r| r.distance_km).sum();
    let avg_distance_km = total_distance_km / total_runs as f64;

    let paces: Vec<f64> = runs.iter().filter_map(|r| r.pace_min_per_km).collect();
    let heart_rates: Vec<f64> = runs.iter().filter_map(|r| r.avg_hr).collect();
    let with_elevation = runs.iter().filter(|r| r.elevation_gain > 0.0).count();

    let runs_per_week = match (runs.first(), runs.last()) {
        (Some(first), Some(last)) if total_runs > 1 => {
            let span = (last.date - first.date).num_days();
            if span > 0 {
                total_runs as f64 / span as f64 * 7.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    RunningBlockMetrics {
        total_runs,
        total_distance_km,
        avg_distance_km,
        avg_pace_min_per_km: stats::mean(&paces),
        pace_std: stats::sample_std(&paces),
        runs_per_week,
        short_runs_count: runs.iter().filter(|r| r.distance_km < SHORT_RUN_KM).count(),
        medium_runs_count: runs
            .iter()
            .filter(|r| r.distance_km >= SHORT_RUN_KM && r.distance_km < LONG_RUN_KM)
            .count(),
        long_runs_count: runs.iter().filter(|r| r.distance_km >= LONG_RUN_KM).count(),
        avg_hr: stats::mean(&heart_rates),
        elevation_percentage: with_elevation as f64 / total_runs as f64 * 100.0,
        runs,
    }
}

fn block_strengths(m: &RunningBlockMetrics, days: i64) -> Vec<String> {
    let mut strengths = Vec::new();
    let has_pace = m.avg_pace_min_per_km.is_some_and(|p| p > 0.0);

    if m.total_runs >= 20 {
        strengths.push(format!(
            "High consistency: {} runs in {} days ({:.1} runs/week)",
            m.total_runs, days, m.runs_per_week
        ));
    } else if m.total_runs >= 12 {
        strengths.push(format!("Good consistency: {} runs in {} days", m.total_runs, days));
    }

    if m.avg_distance_km >= 8.0 {
        strengths.push(format!(
            "Strong endurance base: Average {:.1} km per run",
            m.avg_distance_km
        ));
    } else if m.avg_distance_km >= 5.0 {
        strengths.push(format!(
            "Building endurance: Average {:.1} km per run",
            m.avg_distance_km
        ));
    }

    if has_pace && m.pace_std < 0.5 {
        strengths.push(format!(
            "Excellent pace consistency: {:.2} min/km variation",
            m.pace_std
        ));
    } else if has_pace && m.pace_std < 1.0 {
        strengths.push(format!("Good pace control: {:.2} min/km variation", m.pace_std));
    }

    if m.long_runs_count >= 3 {
        strengths.push(format!("Long run discipline: {} runs ≥15km", m.long_runs_count));
    }

    if m.elevation_percentage > 30.0 {
        strengths.push(format!(
            "Strong hill training: {:.0}% of runs include elevation",
            m.elevation_percentage
        ));
    }

    strengths
}

fn block_gaps(m: &RunningBlockMetrics, days: i64) -> Vec<String> {
    let mut gaps = Vec::new();
    let has_pace = m.avg_pace_min_per_km.is_some_and(|p| p > 0.0);
    let runs_with_hr = m.runs.iter().filter(|r| r.avg_hr.is_some()).count();

    if m.total_runs < 12 {
        gaps.push(format!(
            "Low frequency: Only {} runs in {} days. Aim for 3-4 runs/week",
            m.total_runs, days
        ));
    }
    if m.avg_distance_km < 5.0 {
        gaps.push(format!(
            "Short distances: Average {:.1} km. Build to 5-8km base runs",
            m.avg_distance_km
        ));
    }
    if m.long_runs_count == 0 && m.total_runs >= 10 {
        gaps.push("Missing long runs: No runs ≥15km. Add weekly long run for endurance".to_string());
    }
    if m.short_runs_count as f64 / m.total_runs as f64 > 0.8 {
        gaps.push("Too many short runs: >80% are <5km. Add variety with longer base runs".to_string());
    }
    if has_pace && m.pace_std > 1.5 {
        gaps.push(format!(
            "Pace inconsistency: {:.2} min/km variation. Focus on even pacing",
            m.pace_std
        ));
    }
    if m.runs_per_week < 2.0 {
        gaps.push(format!(
            "Low frequency: {:.1} runs/week. Increase to 3-4 for better adaptation",
            m.runs_per_week
        ));
    }
    if m.elevation_percentage < 10.0 && m.total_runs >= 10 {
        gaps.push("Limited hill work: <10% of runs have elevation. Add hills for strength".to_string());
    }
    if (runs_with_hr as f64) < m.total_runs as f64 * 0.5 || runs_with_hr == 0 {
        gaps.push(
            "Missing HR data: <50% of runs have heart rate. Use HR monitor for better insights"
                .to_string(),
        );
    }

    gaps
}

/// Keyword lookup from the leading gap to a single recommendation
fn gap_recommendation(gap: &str) -> Option<&'static str> {
    let gap = gap.to_lowercase();
    let table: [(&str, &str); 6] = [
        (
            "frequency",
            "Increase running frequency to 3-4 times per week for better adaptation",
        ),
        (
            "long run",
            "Add one long run per week (15-20km) to build endurance",
        ),
        (
            "pace",
            "Focus on even pacing: Start slower, maintain consistent pace throughout",
        ),
        ("distance", "Gradually increase base run distance to 5-8km"),
        ("hill", "Include 1-2 hilly runs per week to build leg strength"),
        (
            "hr",
            "Use a heart rate monitor to track training intensity and recovery",
        ),
    ];
    table
        .iter()
        .find(|(keyword, _)| gap.contains(keyword))
        .map(|(_, recommendation)| *recommendation)
}
