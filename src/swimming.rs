//! Swim workout scoring
//!
//! Turns a raw swim table into a graded [`WorkoutAnalysis`]: four sub-scores
//! of up to 25 points each, an A-D grade, a verdict line, exactly three pros
//! and cons, and a prescription for the next session.

use crate::classifier::{classify_swim, SwimWorkoutType};
use crate::metrics::SwimMetrics;
use crate::models::WorkoutTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Maximum points per sub-score category
pub const MAX_SUB_SCORE: u8 = 25;

/// Number of pros and cons every analysis carries
pub const FEEDBACK_ITEMS: usize = 3;

const PRO_FILLER: &str = "Good effort — keep building consistency";
const CON_FILLER: &str = "Room for improvement — focus on fundamentals";

/// Scoring categories in their fixed declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    DistanceEndurance,
    PaceConsistency,
    StrokeStability,
    SpeedGears,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 4] = [
        ScoreCategory::DistanceEndurance,
        ScoreCategory::PaceConsistency,
        ScoreCategory::StrokeStability,
        ScoreCategory::SpeedGears,
    ];

    /// Machine key, e.g. `pace_consistency`
    pub fn key(&self) -> &'static str {
        match self {
            ScoreCategory::DistanceEndurance => "distance_endurance",
            ScoreCategory::PaceConsistency => "pace_consistency",
            ScoreCategory::StrokeStability => "stroke_stability",
            ScoreCategory::SpeedGears => "speed_gears",
        }
    }

    /// Human label, e.g. `Pace Consistency`
    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::DistanceEndurance => "Distance Endurance",
            ScoreCategory::PaceConsistency => "Pace Consistency",
            ScoreCategory::StrokeStability => "Stroke Stability",
            ScoreCategory::SpeedGears => "Speed Gears",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The four swim sub-scores, each in `0..=25`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub distance_endurance: u8,
    pub pace_consistency: u8,
    pub stroke_stability: u8,
    pub speed_gears: u8,
}

impl SubScores {
    pub fn get(&self, category: ScoreCategory) -> u8 {
        match category {
            ScoreCategory::DistanceEndurance => self.distance_endurance,
            ScoreCategory::PaceConsistency => self.pace_consistency,
            ScoreCategory::StrokeStability => self.stroke_stability,
            ScoreCategory::SpeedGears => self.speed_gears,
        }
    }

    /// Categories paired with their score, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ScoreCategory, u8)> + '_ {
        ScoreCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn total(&self) -> u8 {
        self.iter().map(|(_, score)| score).sum()
    }

    /// Lowest-scoring category; ties go to the earliest declared category
    pub fn argmin(&self) -> ScoreCategory {
        let mut lowest = ScoreCategory::DistanceEndurance;
        for (category, score) in self.iter() {
            if score < self.get(lowest) {
                lowest = category;
            }
        }
        lowest
    }
}

/// Letter grade for a total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_total(total: u8) -> Self {
        match total {
            85.. => Grade::A,
            70..=84 => Grade::B,
            55..=69 => Grade::C,
            _ => Grade::D,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        write!(f, "{}", letter)
    }
}

/// Next-session prescription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub main_set: String,
    pub key_focus: String,
    pub drill_set: String,
}

impl Prescription {
    fn new(main_set: &str, key_focus: &str, drill_set: &str) -> Self {
        Prescription {
            main_set: main_set.to_string(),
            key_focus: key_focus.to_string(),
            drill_set: drill_set.to_string(),
        }
    }
}

/// Session facts carried alongside the scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutMetadata {
    pub date: Option<DateTime<Utc>>,
    pub sport: Option<String>,
    pub distance_m: Option<f64>,
    pub total_time_s: Option<f64>,
    pub pool_length_m: Option<f64>,
    pub avg_stroke_rate: Option<f64>,
    pub avg_speed_ms: Option<f64>,
}

/// Flat, JSON-friendly view of the extracted swim metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub distance_m: f64,
    pub total_time_s: f64,
    /// Session average speed, else the mean of the cleaned samples
    pub avg_speed_ms: f64,
    pub avg_stroke_rate: f64,
    pub speed_cv: Option<f64>,
    pub stop_percentage: Option<f64>,
    pub stroke_rate_cv: Option<f64>,
    pub stroke_rate_drop: Option<f64>,
    pub speed_gear_count: usize,
    pub has_speed_gears: bool,
    pub efficiency_avg: Option<f64>,
    pub speed_data: Vec<f64>,
    pub stroke_rate_data: Vec<f64>,
    pub efficiency_data: Vec<f64>,
    pub speed_for_efficiency: Vec<f64>,
    pub stroke_rate_for_efficiency: Vec<f64>,
}

impl MetricsSnapshot {
    fn project(metrics: &SwimMetrics, metadata: &WorkoutMetadata) -> Self {
        let efficiency = metrics.efficiency.as_ref();
        MetricsSnapshot {
            distance_m: metrics.distance_m,
            total_time_s: metadata.total_time_s.unwrap_or(0.0),
            avg_speed_ms: metadata
                .avg_speed_ms
                .or_else(|| metrics.speed_avg())
                .unwrap_or(0.0),
            avg_stroke_rate: metadata
                .avg_stroke_rate
                .or_else(|| metrics.stroke_rate.as_ref().map(|s| s.avg))
                .unwrap_or(0.0),
            speed_cv: metrics.speed_cv(),
            stop_percentage: metrics.stop_percentage(),
            stroke_rate_cv: metrics.stroke_rate_cv(),
            stroke_rate_drop: metrics.stroke_rate_drop(),
            speed_gear_count: metrics.gear_count(),
            has_speed_gears: metrics.has_speed_gears(),
            efficiency_avg: efficiency.map(|e| e.avg),
            speed_data: metrics
                .speed
                .as_ref()
                .map(|s| s.samples.clone())
                .unwrap_or_default(),
            stroke_rate_data: metrics
                .stroke_rate
                .as_ref()
                .map(|s| s.samples.clone())
                .unwrap_or_default(),
            efficiency_data: efficiency.map(|e| e.ratios.clone()).unwrap_or_default(),
            speed_for_efficiency: efficiency.map(|e| e.speed.clone()).unwrap_or_default(),
            stroke_rate_for_efficiency: efficiency
                .map(|e| e.stroke_rate.clone())
                .unwrap_or_default(),
        }
    }
}

/// Complete analysis of one swim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutAnalysis {
    pub metadata: WorkoutMetadata,
    pub metrics: MetricsSnapshot,
    pub workout_type: SwimWorkoutType,
    pub sub_scores: SubScores,
    pub total_score: u8,
    pub grade: Grade,
    pub verdict: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub prescription: Prescription,
}

/// Score a swim's metrics for a given workout type
pub fn score_swim(metrics: &SwimMetrics, workout_type: SwimWorkoutType) -> SubScores {
    let stop_pct = metrics.stop_percentage().unwrap_or(100.0);

    let distance_m = metrics.distance_m;
    let mut distance_endurance: u8 = if distance_m >= 2000.0 {
        25
    } else if distance_m >= 1500.0 {
        20
    } else if distance_m >= 1000.0 {
        15
    } else if distance_m >= 500.0 {
        10
    } else if distance_m > 0.0 {
        5
    } else {
        0
    };
    if stop_pct < 5.0 {
        distance_endurance += 3;
    } else if stop_pct < 10.0 {
        distance_endurance += 1;
    }
    let distance_endurance = distance_endurance.min(MAX_SUB_SCORE);

    let speed_cv = metrics.speed_cv().unwrap_or(100.0);
    let mut pace_consistency: u8 = match speed_cv {
        cv if cv < 3.0 => 25,
        cv if cv < 6.0 => 20,
        cv if cv < 10.0 => 15,
        cv if cv < 15.0 => 10,
        _ => 5,
    };
    if stop_pct > 20.0 {
        pace_consistency = pace_consistency.saturating_sub(5);
    }

    let stroke_cv = metrics.stroke_rate_cv().unwrap_or(100.0);
    let stroke_drop = metrics.stroke_rate_drop().unwrap_or(0.0).abs();
    let mut stroke_stability: u8 = match stroke_cv {
        cv if cv < 5.0 => 15,
        cv if cv < 10.0 => 12,
        cv if cv < 15.0 => 8,
        _ => 5,
    };
    if stroke_drop < 2.0 {
        stroke_stability += 10;
    } else if stroke_drop < 4.0 {
        stroke_stability += 5;
    } else if stroke_drop > 5.0 {
        stroke_stability = stroke_stability.saturating_sub(5);
    }
    let stroke_stability = stroke_stability.min(MAX_SUB_SCORE);

    let speed_gears: u8 = match metrics.gear_count() {
        n if n >= 5 => 25,
        n if n >= 3 => 20,
        n if n >= 1 => 15,
        _ if metrics.has_speed_gears() => 10,
        _ if workout_type == SwimWorkoutType::Endurance => 15,
        _ => 5,
    };

    SubScores {
        distance_endurance,
        pace_consistency,
        stroke_stability,
        speed_gears,
    }
}

/// One-line verdict for a graded swim
pub fn verdict(grade: Grade, sub_scores: &SubScores, metrics: &SwimMetrics) -> &'static str {
    match grade {
        Grade::A => "Strong execution across all metrics — excellent session",
        Grade::B => match sub_scores.argmin() {
            ScoreCategory::SpeedGears => "Strong aerobic base, speed gear missing",
            ScoreCategory::PaceConsistency => "Good effort, pacing needs more consistency",
            ScoreCategory::StrokeStability => "Solid swim, stroke rate stability needs work",
            ScoreCategory::DistanceEndurance => "Good session with clear improvement areas",
        },
        Grade::C => {
            if metrics.stop_percentage().unwrap_or(0.0) > 20.0 {
                "Too many interruptions — focus on continuous swimming"
            } else if metrics.speed_cv().unwrap_or(0.0) > 15.0 {
                "Pacing too chaotic — structure your sets better"
            } else {
                "Session completed but needs better structure"
            }
        }
        Grade::D => {
            if metrics.stop_percentage().unwrap_or(0.0) > 30.0 {
                "Major breakdown — too many stops, unreliable data"
            } else {
                "Poor execution — focus on fundamentals"
            }
        }
    }
}

/// Pad with the filler line until there are exactly [`FEEDBACK_ITEMS`] entries
fn exactly_three(mut items: Vec<&'static str>, filler: &'static str) -> Vec<String> {
    while items.len() < FEEDBACK_ITEMS {
        items.push(filler);
    }
    items.truncate(FEEDBACK_ITEMS);
    items.into_iter().map(String::from).collect()
}

/// Three strengths and three weaknesses of a swim
pub fn pros_and_cons(
    metrics: &SwimMetrics,
    sub_scores: &SubScores,
    workout_type: SwimWorkoutType,
) -> (Vec<String>, Vec<String>) {
    let mut pros = Vec::new();
    if sub_scores.pace_consistency >= 20 {
        pros.push("Excellent pacing control — consistent speed throughout");
    }
    if sub_scores.distance_endurance >= 20 {
        pros.push("Solid endurance base — you sustained volume well");
    }
    if sub_scores.stroke_stability >= 20 {
        pros.push("Stroke rhythm held up under fatigue — good form");
    }
    if metrics.stop_percentage().unwrap_or(100.0) < 5.0 {
        pros.push("Minimal interruptions — great continuous swimming");
    }
    if sub_scores.speed_gears >= 20 {
        pros.push("Good speed variation — multiple gears used effectively");
    }
    if pros.len() < FEEDBACK_ITEMS {
        if metrics.distance_m > 1500.0 {
            pros.push("Strong distance covered — building aerobic capacity");
        }
        if metrics.stroke_rate_cv().unwrap_or(100.0) < 10.0 {
            pros.push("Stable stroke rate — consistent technique");
        }
    }

    let mut cons = Vec::new();
    if sub_scores.speed_gears < 15 && workout_type != SwimWorkoutType::Recovery {
        cons.push("One-gear swim — add speed gears for better stimulus");
    }
    if metrics.stop_percentage().unwrap_or(0.0) > 15.0 {
        cons.push("Too many interruptions — shorten rest, keep momentum");
    }
    if sub_scores.pace_consistency < 15 {
        cons.push("Pacing too variable — aim for more consistent splits");
    }
    if metrics.stroke_rate_drop().unwrap_or(0.0) > 4.0 {
        cons.push("Technique breaks late — add short form-focused repeats");
    }
    if sub_scores.distance_endurance < 15 {
        cons.push("Distance too short — build volume gradually");
    }
    if cons.len() < FEEDBACK_ITEMS {
        if metrics.speed_cv().unwrap_or(0.0) > 12.0 {
            cons.push("Speed variability too high — structure your sets");
        }
        if metrics.stroke_rate_cv().unwrap_or(100.0) > 15.0 {
            cons.push("Stroke rate inconsistent — focus on rhythm");
        }
    }

    (exactly_three(pros, PRO_FILLER), exactly_three(cons, CON_FILLER))
}

/// Prescribe the next session from the lowest sub-score
///
/// Ties resolve in declaration order, so a flat score card asks for
/// aerobic base work.
pub fn prescribe(
    sub_scores: &SubScores,
    workout_type: SwimWorkoutType,
    metrics: &SwimMetrics,
) -> Prescription {
    let endurance_without_gears =
        workout_type == SwimWorkoutType::Endurance && !metrics.has_speed_gears();
    let limiting = if endurance_without_gears {
        ScoreCategory::SpeedGears
    } else {
        sub_scores.argmin()
    };

    match limiting {
        ScoreCategory::SpeedGears => Prescription::new(
            "12×100 @ moderate-hard, 20s rest\nCue: Hold stroke rate 34-36 spm, no over-glide",
            "Speed gear development",
            "8×25 fast (easy back) — focus on turnover",
        ),
        ScoreCategory::PaceConsistency => Prescription::new(
            "6×200 @ controlled pace, 30s rest\nRule: Rep 1 must feel 'too easy'\nCue: Even splits > fast rep 1",
            "Pacing control",
            "4×50 build (easy to fast) — feel the pace change",
        ),
        ScoreCategory::StrokeStability => Prescription::new(
            "10×100 @ steady, 15s rest\nCue: Count strokes per length, maintain rhythm",
            "Stroke rate consistency",
            "6×50 with stroke count focus — efficiency over speed",
        ),
        ScoreCategory::DistanceEndurance => Prescription::new(
            "3×500 continuous @ easy-moderate, 1 min rest\nCue: Build volume, maintain form",
            "Aerobic base building",
            "200 easy with focus on breathing rhythm",
        ),
    }
}

/// Full pipeline for a single swim: extract, classify, score, explain
pub fn analyze_workout(table: &WorkoutTable) -> WorkoutAnalysis {
    let session = &table.session;
    let metadata = WorkoutMetadata {
        date: session.start_time,
        sport: session.sport.clone(),
        distance_m: session.total_distance_m,
        total_time_s: session.total_elapsed_time_s,
        pool_length_m: session.pool_length_m,
        avg_stroke_rate: session.avg_cadence,
        avg_speed_ms: session.avg_speed_ms,
    };

    let metrics = SwimMetrics::extract(table);
    let workout_type = classify_swim(&metrics);
    let sub_scores = score_swim(&metrics, workout_type);
    let total_score = sub_scores.total();
    let grade = Grade::from_total(total_score);
    debug!(?sub_scores, total_score, %grade, "Scored swim");

    let verdict = verdict(grade, &sub_scores, &metrics).to_string();
    let (pros, cons) = pros_and_cons(&metrics, &sub_scores, workout_type);
    let prescription = prescribe(&sub_scores, workout_type, &metrics);

    info!(
        "Analyzed {} swim: {} points, grade {}",
        workout_type, total_score, grade
    );

    WorkoutAnalysis {
        metrics: MetricsSnapshot::project(&metrics, &metadata),
        metadata,
        workout_type,
        sub_scores,
        total_score,
        grade,
        verdict,
        pros,
        cons,
        prescription,
    }
}
