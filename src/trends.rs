//! Multi-workout comparison
//!
//! Orders a set of swim analyses by date and compares the first half of the
//! block against the second: per-quantity trends, coach insights, strengths
//! and weaknesses across sub-score categories, and up to three prioritized
//! training recommendations.

use crate::models::WorkoutTable;
use crate::stats;
use crate::swimming::{analyze_workout, Grade, ScoreCategory, WorkoutAnalysis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Relative change below which a trend counts as stable
pub const STABLE_THRESHOLD: f64 = 0.05;

/// Category mean distance from the grand mean that marks a strength or weakness
pub const STRENGTH_MARGIN: f64 = 3.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrendError {
    #[error("No workouts provided")]
    NoWorkouts,
}

/// Quantities tracked across workouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedQuantity {
    Distance,
    Speed,
    Score,
    #[serde(rename = "sub_score_distance_endurance")]
    SubScoreDistanceEndurance,
    #[serde(rename = "sub_score_pace_consistency")]
    SubScorePaceConsistency,
    #[serde(rename = "sub_score_stroke_stability")]
    SubScoreStrokeStability,
    #[serde(rename = "sub_score_speed_gears")]
    SubScoreSpeedGears,
}

impl TrackedQuantity {
    pub fn sub_score(category: ScoreCategory) -> Self {
        match category {
            ScoreCategory::DistanceEndurance => TrackedQuantity::SubScoreDistanceEndurance,
            ScoreCategory::PaceConsistency => TrackedQuantity::SubScorePaceConsistency,
            ScoreCategory::StrokeStability => TrackedQuantity::SubScoreStrokeStability,
            ScoreCategory::SpeedGears => TrackedQuantity::SubScoreSpeedGears,
        }
    }

    pub fn category(&self) -> Option<ScoreCategory> {
        match self {
            TrackedQuantity::SubScoreDistanceEndurance => Some(ScoreCategory::DistanceEndurance),
            TrackedQuantity::SubScorePaceConsistency => Some(ScoreCategory::PaceConsistency),
            TrackedQuantity::SubScoreStrokeStability => Some(ScoreCategory::StrokeStability),
            TrackedQuantity::SubScoreSpeedGears => Some(ScoreCategory::SpeedGears),
            _ => None,
        }
    }
}

impl fmt::Display for TrackedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category() {
            Some(category) => write!(f, "sub_score_{}", category.key()),
            None => {
                let name = match self {
                    TrackedQuantity::Distance => "distance",
                    TrackedQuantity::Speed => "speed",
                    _ => "score",
                };
                write!(f, "{}", name)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Improving,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendBucket {
    Stable,
    Up,
    Down,
}

impl fmt::Display for TrendBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrendBucket::Stable => "stable",
            TrendBucket::Up => "up",
            TrendBucket::Down => "down",
        };
        write!(f, "{}", name)
    }
}

/// First-half versus second-half comparison of one quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    /// `Improving` whenever the second half is higher, for every quantity
    pub direction: Direction,
    pub change_pct: f64,
    #[serde(rename = "avg")]
    pub average: f64,
    pub trend: TrendBucket,
}

impl TrendRecord {
    /// Compare the halves of a series; `None` below two values
    pub fn from_series(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let (first, second) = stats::split_halves(values);
        let first = stats::mean_or_zero(first);
        let second = stats::mean_or_zero(second);
        let delta = second - first;

        let direction = if second > first {
            Direction::Improving
        } else {
            Direction::Declining
        };
        let change_pct = if first > 0.0 { delta / first * 100.0 } else { 0.0 };

        let is_stable = if first != 0.0 {
            (delta / first).abs() < STABLE_THRESHOLD
        } else {
            delta == 0.0
        };
        let trend = if is_stable {
            TrendBucket::Stable
        } else if second > first {
            TrendBucket::Up
        } else {
            TrendBucket::Down
        };

        Some(TrendRecord {
            direction,
            change_pct,
            average: stats::mean_or_zero(values),
            trend,
        })
    }
}

/// Per-workout series in date order, for charting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub dates: Vec<Option<String>>,
    pub distances: Vec<f64>,
    pub times: Vec<f64>,
    pub speeds: Vec<f64>,
    pub stroke_rates: Vec<f64>,
    pub scores: Vec<f64>,
    pub grades: Vec<Grade>,
    pub sub_scores: BTreeMap<ScoreCategory, Vec<f64>>,
}

impl TimeSeries {
    pub fn extract(workouts: &[WorkoutAnalysis]) -> Self {
        let mut series = TimeSeries::default();
        for category in ScoreCategory::ALL {
            series.sub_scores.insert(category, Vec::with_capacity(workouts.len()));
        }

        for w in workouts {
            series.dates.push(w.metadata.date.map(|d| d.to_rfc3339()));
            series.distances.push(w.metrics.distance_m);
            series.times.push(w.metrics.total_time_s);
            series.speeds.push(w.metrics.avg_speed_ms);
            series.stroke_rates.push(w.metrics.avg_stroke_rate);
            series.scores.push(f64::from(w.total_score));
            series.grades.push(w.grade);
            for (category, score) in w.sub_scores.iter() {
                series
                    .sub_scores
                    .entry(category)
                    .or_default()
                    .push(f64::from(score));
            }
        }
        series
    }

    fn series(&self, quantity: TrackedQuantity) -> &[f64] {
        match quantity {
            TrackedQuantity::Distance => &self.distances,
            TrackedQuantity::Speed => &self.speeds,
            TrackedQuantity::Score => &self.scores,
            other => other
                .category()
                .and_then(|c| self.sub_scores.get(&c))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub reasoning: String,
}

impl Insight {
    fn new(kind: InsightKind, title: impl Into<String>, message: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Insight {
            kind,
            title: title.into(),
            message: message.into(),
            reasoning: reasoning.into(),
        }
    }
}

/// A sub-score category that stands out from the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAssessment {
    pub category: ScoreCategory,
    pub area: String,
    pub score: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthsWeaknesses {
    pub strengths: Vec<AreaAssessment>,
    pub weaknesses: Vec<AreaAssessment>,
    pub average_scores: BTreeMap<ScoreCategory, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub focus: String,
    pub recommendation: String,
    pub reasoning: String,
    pub frequency: String,
}

impl Recommendation {
    fn new(priority: Priority, focus: &str, recommendation: &str, reasoning: &str, frequency: &str) -> Self {
        Recommendation {
            priority,
            focus: focus.to_string(),
            recommendation: recommendation.to_string(),
            reasoning: reasoning.to_string(),
            frequency: frequency.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_workouts: usize,
    pub total_distance: f64,
    pub average_score: f64,
    pub most_common_grade: Grade,
    pub grade_distribution: BTreeMap<Grade, usize>,
    pub overall_trend: TrendBucket,
}

/// Everything the comparison view needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub workouts: Vec<WorkoutAnalysis>,
    pub time_series: TimeSeries,
    pub trends: BTreeMap<TrackedQuantity, TrendRecord>,
    pub insights: Vec<Insight>,
    pub strengths_weaknesses: StrengthsWeaknesses,
    pub recommendations: Vec<Recommendation>,
    pub summary: ComparisonSummary,
}

/// Compare analyzed workouts, oldest first
pub fn compare(workouts: &[WorkoutAnalysis]) -> Result<ComparisonReport, TrendError> {
    if workouts.is_empty() {
        return Err(TrendError::NoWorkouts);
    }

    // stable sort keeps input order for equal (or missing) dates
    let mut workouts = workouts.to_vec();
    workouts.sort_by(|a, b| a.metadata.date.cmp(&b.metadata.date));

    let time_series = TimeSeries::extract(&workouts);
    let trends = calculate_trends(&time_series);
    let insights = generate_insights(&workouts, &trends);
    let strengths_weaknesses = identify_strengths_weaknesses(&workouts);
    let recommendations = generate_recommendations(&trends, &strengths_weaknesses);
    let summary = summarize(&workouts, &trends);

    info!(
        "Compared {} workouts: {} trends, {} insights, {} recommendations",
        workouts.len(),
        trends.len(),
        insights.len(),
        recommendations.len()
    );

    Ok(ComparisonReport {
        workouts,
        time_series,
        trends,
        insights,
        strengths_weaknesses,
        recommendations,
        summary,
    })
}

/// Analyze raw tables in parallel, then compare the results
///
/// Tables without any samples are skipped.
pub fn compare_tables(tables: &[WorkoutTable]) -> Result<ComparisonReport, TrendError> {
    let analyses: Vec<WorkoutAnalysis> = tables
        .par_iter()
        .filter(|table| {
            let usable = !table.samples.is_empty();
            if !usable {
                warn!("Skipping workout table with no samples");
            }
            usable
        })
        .map(analyze_workout)
        .collect();

    compare(&analyses)
}

fn calculate_trends(series: &TimeSeries) -> BTreeMap<TrackedQuantity, TrendRecord> {
    let mut quantities = vec![
        TrackedQuantity::Distance,
        TrackedQuantity::Speed,
        TrackedQuantity::Score,
    ];
    quantities.extend(ScoreCategory::ALL.into_iter().map(TrackedQuantity::sub_score));

    quantities
        .into_iter()
        .filter_map(|q| TrendRecord::from_series(series.series(q)).map(|record| (q, record)))
        .collect()
}

fn generate_insights(
    workouts: &[WorkoutAnalysis],
    trends: &BTreeMap<TrackedQuantity, TrendRecord>,
) -> Vec<Insight> {
    let mut insights = Vec::new();
    if workouts.len() < 2 {
        return insights;
    }

    if let Some(score) = trends.get(&TrackedQuantity::Score) {
        match score.trend {
            TrendBucket::Up => insights.push(Insight::new(
                InsightKind::Positive,
                "Performance Improving",
                format!(
                    "Your overall scores are trending upward ({:.1}% improvement). This indicates you're adapting well to training.",
                    score.change_pct
                ),
                "Consistent improvement across multiple workouts suggests effective training stimulus and good recovery. Keep the momentum going!",
            )),
            TrendBucket::Down => insights.push(Insight::new(
                InsightKind::Warning,
                "Performance Declining",
                format!(
                    "Your scores have declined by {:.1}%. This could indicate fatigue, overreaching, or need for recovery.",
                    score.change_pct.abs()
                ),
                "Declining performance over multiple sessions often signals accumulated fatigue. Consider a recovery week or deload.",
            )),
            TrendBucket::Stable => {}
        }
    }

    if let Some(distance) = trends.get(&TrackedQuantity::Distance) {
        if distance.trend == TrendBucket::Up && distance.change_pct > 10.0 {
            insights.push(Insight::new(
                InsightKind::Positive,
                "Volume Building",
                format!(
                    "You're increasing training volume significantly ({:.1}%). Great for aerobic base development.",
                    distance.change_pct
                ),
                "Progressive volume increase is key for endurance sports. Ensure you maintain form and allow adequate recovery between sessions.",
            ));
        }
    }

    if let Some(speed) = trends.get(&TrackedQuantity::Speed) {
        match speed.trend {
            TrendBucket::Stable => insights.push(Insight::new(
                InsightKind::Info,
                "Speed Consistency",
                "Your average speed is holding steady across workouts.",
                "Stable speed with increasing volume suggests good aerobic efficiency. Consider adding speed work to develop higher gears.",
            )),
            TrendBucket::Up => insights.push(Insight::new(
                InsightKind::Positive,
                "Speed Improving",
                format!(
                    "Your average speed is increasing ({:.1}%). This indicates fitness gains.",
                    speed.change_pct
                ),
                "Faster speeds at similar effort levels show improved fitness. This is a strong positive signal.",
            )),
            TrendBucket::Down => {}
        }
    }

    let sub_score_trends: Vec<(ScoreCategory, &TrendRecord)> = trends
        .iter()
        .filter_map(|(q, record)| q.category().map(|c| (c, record)))
        .collect();

    if let Some((category, _)) = sub_score_trends
        .iter()
        .find(|(_, record)| record.trend == TrendBucket::Up)
    {
        let area = category.label();
        insights.push(Insight::new(
            InsightKind::Positive,
            format!("Strongest Area: {}", area),
            format!(
                "Your {} is consistently improving across workouts.",
                area.to_lowercase()
            ),
            "This is your current strength. Use this as a foundation while working on other areas.",
        ));
    }

    if let Some((category, _)) = sub_score_trends
        .iter()
        .find(|(_, record)| record.trend == TrendBucket::Down)
    {
        let area = category.label();
        insights.push(Insight::new(
            InsightKind::Warning,
            format!("Area Needing Attention: {}", area),
            format!(
                "Your {} has been declining. Focus training here.",
                area.to_lowercase()
            ),
            "Addressing this limiter will have the biggest impact on overall performance.",
        ));
    }

    let scores: Vec<f64> = workouts.iter().map(|w| f64::from(w.total_score)).collect();
    if scores.len() >= 3 {
        let mean = stats::mean_or_zero(&scores);
        let score_cv = if mean > 0.0 {
            stats::population_std(&scores) / mean * 100.0
        } else {
            0.0
        };
        debug!(score_cv, "Score consistency across workouts");

        if score_cv < 10.0 {
            insights.push(Insight::new(
                InsightKind::Positive,
                "Excellent Consistency",
                "Your performance is very consistent across workouts.",
                "Low variability indicates good execution and appropriate training load. This is a sign of mature training.",
            ));
        } else if score_cv > 20.0 {
            insights.push(Insight::new(
                InsightKind::Warning,
                "High Variability",
                "Your performance varies significantly between workouts.",
                "High variability could indicate inconsistent effort, recovery issues, or training load fluctuations. Aim for more consistent execution.",
            ));
        }
    }

    insights
}

fn strength_reasoning(category: ScoreCategory, score: f64) -> String {
    match category {
        ScoreCategory::DistanceEndurance => format!(
            "Your ability to sustain volume (score: {:.1}/25) shows strong aerobic base. You can handle longer sessions without breakdown.",
            score
        ),
        ScoreCategory::PaceConsistency => format!(
            "Excellent pacing control (score: {:.1}/25) indicates good race execution skills. You maintain target speeds well.",
            score
        ),
        ScoreCategory::StrokeStability => format!(
            "Consistent stroke rate (score: {:.1}/25) shows good technique maintenance under fatigue. Your form holds up.",
            score
        ),
        ScoreCategory::SpeedGears => format!(
            "Good speed variation (score: {:.1}/25) means you're using multiple intensity zones effectively in training.",
            score
        ),
    }
}

fn weakness_reasoning(category: ScoreCategory, score: f64) -> String {
    match category {
        ScoreCategory::DistanceEndurance => format!(
            "Lower endurance scores (score: {:.1}/25) suggest you need to build volume gradually. Focus on continuous swimming.",
            score
        ),
        ScoreCategory::PaceConsistency => format!(
            "Pacing variability (score: {:.1}/25) indicates you need more structured sets. Practice even splits.",
            score
        ),
        ScoreCategory::StrokeStability => format!(
            "Stroke rate instability (score: {:.1}/25) suggests technique breaks down. Add form-focused drills.",
            score
        ),
        ScoreCategory::SpeedGears => format!(
            "Limited speed work (score: {:.1}/25) means you're missing high-intensity stimulus. Add fast intervals.",
            score
        ),
    }
}

fn identify_strengths_weaknesses(workouts: &[WorkoutAnalysis]) -> StrengthsWeaknesses {
    if workouts.len() < 2 {
        return StrengthsWeaknesses::default();
    }

    let average_scores: BTreeMap<ScoreCategory, f64> = ScoreCategory::ALL
        .into_iter()
        .map(|category| {
            let values: Vec<f64> = workouts
                .iter()
                .map(|w| f64::from(w.sub_scores.get(category)))
                .collect();
            (category, stats::mean_or_zero(&values))
        })
        .collect();

    let category_means: Vec<f64> = average_scores.values().copied().collect();
    let overall = stats::mean_or_zero(&category_means);

    let mut result = StrengthsWeaknesses::default();
    for (&category, &score) in &average_scores {
        if score >= overall + STRENGTH_MARGIN {
            result.strengths.push(AreaAssessment {
                category,
                area: category.label().to_string(),
                score,
                reasoning: strength_reasoning(category, score),
            });
        } else if score <= overall - STRENGTH_MARGIN {
            result.weaknesses.push(AreaAssessment {
                category,
                area: category.label().to_string(),
                score,
                reasoning: weakness_reasoning(category, score),
            });
        }
    }
    result.average_scores = average_scores;
    result
}

/// First entry with the lowest (or highest) score wins ties
fn extreme_area(areas: &[AreaAssessment], lowest: bool) -> Option<&AreaAssessment> {
    areas.iter().fold(None, |best: Option<&AreaAssessment>, area| match best {
        Some(b) if (lowest && area.score >= b.score) || (!lowest && area.score <= b.score) => {
            Some(b)
        }
        _ => Some(area),
    })
}

fn generate_recommendations(
    trends: &BTreeMap<TrackedQuantity, TrendRecord>,
    sw: &StrengthsWeaknesses,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(weakest) = extreme_area(&sw.weaknesses, true) {
        recommendations.push(match weakest.category {
            ScoreCategory::DistanceEndurance => Recommendation::new(
                Priority::High,
                "Build Aerobic Base",
                "3×500 continuous @ easy-moderate, 1 min rest. Build volume gradually.",
                "Your endurance is the limiter. Focus on continuous swimming to build aerobic capacity.",
                "2-3x per week",
            ),
            ScoreCategory::PaceConsistency => Recommendation::new(
                Priority::High,
                "Pacing Control",
                "6×200 @ controlled pace, 30s rest. Rep 1 must feel \"too easy\".",
                "Inconsistent pacing suggests you need more structured sets with specific pace targets.",
                "1-2x per week",
            ),
            ScoreCategory::StrokeStability => Recommendation::new(
                Priority::High,
                "Technique & Stroke Rate",
                "10×100 @ steady, 15s rest. Count strokes per length, maintain rhythm.",
                "Stroke rate instability indicates technique breakdown. Focus on form over speed.",
                "2x per week",
            ),
            ScoreCategory::SpeedGears => Recommendation::new(
                Priority::High,
                "Speed Development",
                "12×100 @ moderate-hard, 20s rest. Hold stroke rate 34-36 spm.",
                "You need more speed work to develop higher gears. Add controlled intensity.",
                "1-2x per week",
            ),
        });
    }

    if let Some(strongest) = extreme_area(&sw.strengths, false) {
        if strongest.category == ScoreCategory::DistanceEndurance {
            recommendations.push(Recommendation::new(
                Priority::Medium,
                "Leverage Endurance Strength",
                "Use your strong endurance base for longer threshold sets: 4×400 @ threshold, 45s rest.",
                "Your endurance is a strength. Use it to build threshold fitness with longer intervals.",
                "1x per week",
            ));
        }
    }

    match trends.get(&TrackedQuantity::Score).map(|t| t.trend) {
        Some(TrendBucket::Up) => recommendations.push(Recommendation::new(
            Priority::Low,
            "Maintain Momentum",
            "Continue current training approach. Consider adding 5-10% volume or intensity.",
            "You're improving consistently. Progressive overload will continue driving adaptation.",
            "Ongoing",
        )),
        Some(TrendBucket::Down) => recommendations.push(Recommendation::new(
            Priority::High,
            "Recovery & Deload",
            "Take a recovery week: reduce volume by 30-40%, focus on easy swimming.",
            "Declining performance suggests accumulated fatigue. Recovery is essential for adaptation.",
            "This week",
        )),
        _ => {}
    }

    recommendations
}

fn summarize(
    workouts: &[WorkoutAnalysis],
    trends: &BTreeMap<TrackedQuantity, TrendRecord>,
) -> ComparisonSummary {
    let scores: Vec<f64> = workouts.iter().map(|w| f64::from(w.total_score)).collect();

    let mut grade_distribution: BTreeMap<Grade, usize> = BTreeMap::new();
    let mut first_seen: Vec<Grade> = Vec::new();
    for w in workouts {
        *grade_distribution.entry(w.grade).or_insert(0) += 1;
        if !first_seen.contains(&w.grade) {
            first_seen.push(w.grade);
        }
    }

    // ties resolve to the grade that appeared first in date order
    let mut most_common_grade = first_seen.first().copied().unwrap_or(Grade::D);
    for grade in &first_seen {
        if grade_distribution[grade] > grade_distribution[&most_common_grade] {
            most_common_grade = *grade;
        }
    }

    ComparisonSummary {
        total_workouts: workouts.len(),
        total_distance: workouts.iter().map(|w| w.metrics.distance_m).sum(),
        average_score: stats::mean_or_zero(&scores),
        most_common_grade,
        grade_distribution,
        overall_trend: trends
            .get(&TrackedQuantity::Score)
            .map_or(TrendBucket::Stable, |t| t.trend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SwimWorkoutType;
    use crate::swimming::{MetricsSnapshot, Prescription, SubScores, WorkoutMetadata};
    use chrono::{TimeZone, Utc};

    fn workout(day: u32, distance: f64, speed: f64, scores: [u8; 4]) -> WorkoutAnalysis {
        let sub_scores = SubScores {
            distance_endurance: scores[0],
            pace_consistency: scores[1],
            stroke_stability: scores[2],
            speed_gears: scores[3],
        };
        let total_score = sub_scores.total();
        WorkoutAnalysis {
            metadata: WorkoutMetadata {
                date: Utc.with_ymd_and_hms(2024, 5, day, 7, 0, 0).single(),
                distance_m: Some(distance),
                ..WorkoutMetadata::default()
            },
            metrics: MetricsSnapshot {
                distance_m: distance,
                avg_speed_ms: speed,
                ..MetricsSnapshot::default()
            },
            workout_type: SwimWorkoutType::Endurance,
            sub_scores,
            total_score,
            grade: Grade::from_total(total_score),
            verdict: String::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            prescription: Prescription {
                main_set: String::new(),
                key_focus: String::new(),
                drill_set: String::new(),
            },
        }
    }

    #[test]
    fn test_zero_workouts_is_an_error() {
        assert_eq!(compare(&[]), Err(TrendError::NoWorkouts));
        assert_eq!(compare_tables(&[]), Err(TrendError::NoWorkouts));
    }

    #[test]
    fn test_single_workout_has_no_trends() {
        let report = compare(&[workout(1, 1500.0, 1.0, [20, 20, 20, 15])]).unwrap();

        assert!(report.trends.is_empty());
        assert!(report.insights.is_empty());
        assert!(report.strengths_weaknesses.strengths.is_empty());
        assert_eq!(report.time_series.scores, vec![75.0]);
        assert_eq!(report.summary.total_workouts, 1);
        assert_eq!(report.summary.overall_trend, TrendBucket::Stable);
    }

    #[test]
    fn test_trend_record_buckets() {
        let up = TrendRecord::from_series(&[60.0, 70.0, 80.0, 90.0]).unwrap();
        assert_eq!(up.trend, TrendBucket::Up);
        assert_eq!(up.direction, Direction::Improving);
        assert!((up.change_pct - 100.0 * 20.0 / 65.0).abs() < 1e-9);
        assert_eq!(up.average, 75.0);

        let stable = TrendRecord::from_series(&[100.0, 102.0]).unwrap();
        assert_eq!(stable.trend, TrendBucket::Stable);
        // direction ignores the stable bucket
        assert_eq!(stable.direction, Direction::Improving);

        let down = TrendRecord::from_series(&[10.0, 9.0, 5.0]).unwrap();
        // odd length: second half holds [9, 5]
        assert_eq!(down.trend, TrendBucket::Down);
        assert_eq!(down.direction, Direction::Declining);
        assert!((down.change_pct + 30.0).abs() < 1e-9);

        assert!(TrendRecord::from_series(&[1.0]).is_none());
    }

    #[test]
    fn test_trend_from_zero_baseline() {
        let flat = TrendRecord::from_series(&[0.0, 0.0]).unwrap();
        assert_eq!(flat.trend, TrendBucket::Stable);
        assert_eq!(flat.change_pct, 0.0);

        let rising = TrendRecord::from_series(&[0.0, 5.0]).unwrap();
        assert_eq!(rising.trend, TrendBucket::Up);
        assert_eq!(rising.change_pct, 0.0);
    }

    #[test]
    fn test_direction_label_ignores_metric_polarity() {
        // every tracked quantity is labelled improving when it goes up
        let workouts = vec![
            workout(1, 1000.0, 1.0, [15, 20, 20, 5]),
            workout(2, 2000.0, 1.3, [25, 20, 20, 5]),
        ];
        let report = compare(&workouts).unwrap();
        for record in report.trends.values() {
            if record.trend == TrendBucket::Up {
                assert_eq!(record.direction, Direction::Improving);
            }
        }
    }

    #[test]
    fn test_compare_sorts_by_date() {
        let workouts = vec![
            workout(3, 2000.0, 1.2, [25, 20, 25, 20]),
            workout(1, 1000.0, 1.0, [15, 10, 15, 5]),
            workout(2, 1500.0, 1.1, [20, 15, 20, 15]),
        ];
        let report = compare(&workouts).unwrap();

        assert_eq!(report.time_series.distances, vec![1000.0, 1500.0, 2000.0]);
        assert_eq!(report.trends[&TrackedQuantity::Score].trend, TrendBucket::Up);
        assert_eq!(report.summary.overall_trend, TrendBucket::Up);
        assert_eq!(report.summary.total_distance, 4500.0);
    }

    #[test]
    fn test_improving_block_insights_and_recommendations() {
        let workouts = vec![
            workout(1, 1000.0, 1.0, [15, 10, 15, 5]),
            workout(2, 1500.0, 1.1, [20, 15, 20, 15]),
            workout(3, 2000.0, 1.2, [25, 20, 25, 20]),
        ];
        let report = compare(&workouts).unwrap();
        let titles: Vec<&str> = report.insights.iter().map(|i| i.title.as_str()).collect();

        assert_eq!(
            titles,
            vec![
                "Performance Improving",
                "Volume Building",
                "Speed Improving",
                "Strongest Area: Distance Endurance",
                "High Variability",
            ]
        );

        // category means 20 / 15 / 20 / 13.33 around a grand mean of 17.08
        let sw = &report.strengths_weaknesses;
        let strengths: Vec<ScoreCategory> = sw.strengths.iter().map(|s| s.category).collect();
        let weaknesses: Vec<ScoreCategory> = sw.weaknesses.iter().map(|s| s.category).collect();
        assert!(strengths.is_empty());
        assert_eq!(weaknesses, vec![ScoreCategory::SpeedGears]);
        assert!(sw.weaknesses[0].reasoning.contains("(score: 13.3/25)"));

        let focuses: Vec<&str> = report
            .recommendations
            .iter()
            .map(|r| r.focus.as_str())
            .collect();
        assert_eq!(focuses, vec!["Speed Development", "Maintain Momentum"]);
    }

    #[test]
    fn test_declining_block_recommends_deload() {
        let workouts = vec![
            workout(1, 2500.0, 1.2, [25, 20, 25, 20]),
            workout(2, 2500.0, 1.2, [25, 20, 25, 15]),
            workout(3, 2000.0, 1.2, [25, 10, 15, 5]),
            workout(4, 2000.0, 1.2, [25, 5, 10, 5]),
        ];
        let report = compare(&workouts).unwrap();

        assert_eq!(report.trends[&TrackedQuantity::Score].trend, TrendBucket::Down);
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Performance Declining"));
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Speed Consistency"));
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Area Needing Attention: Pace Consistency"));

        let sw = &report.strengths_weaknesses;
        assert_eq!(sw.strengths[0].category, ScoreCategory::DistanceEndurance);

        let focuses: Vec<&str> = report
            .recommendations
            .iter()
            .map(|r| r.focus.as_str())
            .collect();
        assert_eq!(
            focuses,
            vec![
                "Speed Development",
                "Leverage Endurance Strength",
                "Recovery & Deload"
            ]
        );
        assert!(report.recommendations.len() <= 3);
    }

    #[test]
    fn test_consistent_scores_insight() {
        let workouts = vec![
            workout(1, 2000.0, 1.2, [25, 20, 25, 20]),
            workout(2, 2000.0, 1.2, [25, 20, 25, 20]),
            workout(3, 2000.0, 1.2, [25, 20, 25, 20]),
        ];
        let report = compare(&workouts).unwrap();
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Excellent Consistency" && i.kind == InsightKind::Positive));
    }

    #[test]
    fn test_most_common_grade_tie_goes_to_first_seen() {
        let workouts = vec![
            workout(1, 1000.0, 1.0, [10, 10, 10, 10]),
            workout(2, 2000.0, 1.2, [25, 20, 25, 20]),
            workout(3, 2000.0, 1.2, [25, 20, 25, 20]),
            workout(4, 1000.0, 1.0, [10, 10, 10, 10]),
        ];
        let report = compare(&workouts).unwrap();

        assert_eq!(report.summary.most_common_grade, Grade::D);
        assert_eq!(report.summary.grade_distribution[&Grade::D], 2);
        assert_eq!(report.summary.grade_distribution[&Grade::A], 2);
        assert_eq!(report.summary.average_score, 65.0);
    }

    #[test]
    fn test_trend_keys_serialize_with_prefix() {
        let workouts = vec![
            workout(1, 1000.0, 1.0, [15, 10, 15, 5]),
            workout(2, 2000.0, 1.2, [25, 20, 25, 20]),
        ];
        let report = compare(&workouts).unwrap();
        let json = serde_json::to_value(&report.trends).unwrap();

        assert!(json.get("sub_score_speed_gears").is_some());
        assert_eq!(json["score"]["trend"], "up");
        assert_eq!(json["distance"]["direction"], "improving");
        assert_eq!(
            TrackedQuantity::SubScoreStrokeStability.to_string(),
            "sub_score_stroke_stability"
        );
    }
}
