//! Workout type classification and sport detection

use crate::metrics::{SwimMetrics, MIN_PATTERN_SAMPLES};
use crate::models::Sport;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Swim workout categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwimWorkoutType {
    Endurance,
    Threshold,
    Speed,
    Recovery,
    Technique,
}

impl fmt::Display for SwimWorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwimWorkoutType::Endurance => "Endurance",
            SwimWorkoutType::Threshold => "Threshold",
            SwimWorkoutType::Speed => "Speed",
            SwimWorkoutType::Recovery => "Recovery",
            SwimWorkoutType::Technique => "Technique",
        };
        write!(f, "{}", name)
    }
}

/// Classifier inputs with missing metrics replaced by rule-specific defaults
#[derive(Debug, Clone, Copy)]
struct ClassifierInputs {
    valid_samples: usize,
    speed_cv: f64,
    avg_speed: f64,
    gear_count: usize,
    stop_percentage: Option<f64>,
}

fn too_few_samples(m: &ClassifierInputs) -> bool {
    m.valid_samples < MIN_PATTERN_SAMPLES
}

fn variable_with_gears(m: &ClassifierInputs) -> bool {
    m.speed_cv > 15.0 && m.gear_count > 3
}

fn fast_and_steady(m: &ClassifierInputs) -> bool {
    m.avg_speed > 0.8 && m.speed_cv < 10.0 && m.stop_percentage.unwrap_or(100.0) < 10.0
}

fn frequent_stops(m: &ClassifierInputs) -> bool {
    m.stop_percentage.unwrap_or(0.0) > 20.0
}

fn steady_and_continuous(m: &ClassifierInputs) -> bool {
    m.speed_cv < 8.0 && m.stop_percentage.unwrap_or(100.0) < 15.0
}

fn slow(m: &ClassifierInputs) -> bool {
    m.avg_speed < 0.6
}

type Rule = (fn(&ClassifierInputs) -> bool, SwimWorkoutType);

/// Evaluated top to bottom; the first matching rule decides.
const SWIM_RULES: &[Rule] = &[
    (too_few_samples, SwimWorkoutType::Recovery),
    (variable_with_gears, SwimWorkoutType::Speed),
    (fast_and_steady, SwimWorkoutType::Threshold),
    (frequent_stops, SwimWorkoutType::Technique),
    (steady_and_continuous, SwimWorkoutType::Endurance),
    (slow, SwimWorkoutType::Recovery),
];

/// Classify a swim from its extracted metrics
pub fn classify_swim(metrics: &SwimMetrics) -> SwimWorkoutType {
    let inputs = ClassifierInputs {
        valid_samples: metrics.valid_speed_samples(),
        speed_cv: metrics.speed_cv().unwrap_or(0.0),
        avg_speed: metrics.speed_avg().unwrap_or(0.0),
        gear_count: metrics.gear_count(),
        stop_percentage: metrics.stop_percentage(),
    };

    let workout_type = SWIM_RULES
        .iter()
        .find(|(rule, _)| rule(&inputs))
        .map(|(_, workout_type)| *workout_type)
        .unwrap_or(SwimWorkoutType::Endurance);

    debug!(?inputs, %workout_type, "Classified swim workout");
    workout_type
}

impl Sport {
    /// Map a device or platform sport string onto a known sport
    pub fn from_session_sport(sport: &str) -> Option<Sport> {
        let sport = sport.to_lowercase();
        if sport.contains("swim") {
            Some(Sport::Swimming)
        } else if sport.contains("run") {
            Some(Sport::Running)
        } else if sport.contains("walk") || sport.contains("hik") {
            Some(Sport::Walking)
        } else if sport.contains("bik") || sport.contains("cycl") || sport.contains("ride") {
            Some(Sport::Cycling)
        } else {
            None
        }
    }
}

/// Activity type of a recording whose sport label may be missing or vague
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Running,
    Walking,
    Cycling,
    Unknown,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityKind::Running => "running",
            ActivityKind::Walking => "walking",
            ActivityKind::Cycling => "cycling",
            ActivityKind::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl ActivityKind {
    /// Sport keywords win; otherwise the average pace (min/km) decides
    pub fn detect(avg_pace: Option<f64>, sport: Option<&str>) -> Self {
        if let Some(sport) = sport {
            let sport = sport.to_lowercase();
            if sport.contains("run") {
                return ActivityKind::Running;
            }
            if sport.contains("walk") || sport.contains("hike") {
                return ActivityKind::Walking;
            }
            if sport.contains("bike") || sport.contains("cycling") {
                return ActivityKind::Cycling;
            }
        }

        match avg_pace {
            Some(pace) if pace < 8.0 => ActivityKind::Running,
            Some(pace) if pace > 12.0 => ActivityKind::Walking,
            Some(_) => ActivityKind::Running,
            None => ActivityKind::Unknown,
        }
    }
}
