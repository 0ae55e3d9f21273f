//! Workout reviews: a one-line summary, highlights and next-workout suggestions
//!
//! Works from session-level facts only, so both synced activity summaries and
//! recorded workout tables can be reviewed. Intensity is judged against an
//! estimated maximum heart rate rather than the workout's own maximum.

use crate::classifier::ActivityKind;
use crate::export::format_run_pace;
use crate::models::{ActivitySummary, Signal, WorkoutTable};
use crate::running::session_distance_km;
use crate::stats;
use crate::zones::{ZoneCalculator, ZoneError};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Suggestions shown in a workout comment
pub const MAX_COMMENT_SUGGESTIONS: usize = 3;

/// Session-level facts a review is built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutFacts {
    pub date: Option<NaiveDate>,
    pub sport: Option<String>,
    pub distance_km: f64,
    pub duration_min: f64,
    /// Average pace in min/km, from total time over total distance
    pub avg_pace: Option<f64>,
    pub avg_hr: Option<f64>,
    pub elevation_m: f64,
    pub calories: Option<f64>,
}

impl WorkoutFacts {
    fn with_pace(mut self) -> Self {
        self.avg_pace = (self.distance_km > 0.0 && self.duration_min > 0.0)
            .then(|| self.duration_min / self.distance_km);
        self
    }

    pub fn from_activity(activity: &ActivitySummary) -> Self {
        WorkoutFacts {
            date: Some(activity.start_date),
            sport: Some(activity.sport_label().to_string()),
            distance_km: activity.distance_m.filter(|d| *d > 0.0).unwrap_or(0.0) / 1000.0,
            duration_min: f64::from(activity.duration_seconds()) / 60.0,
            avg_pace: None,
            avg_hr: activity.average_heartrate.and_then(|hr| hr.to_f64()),
            elevation_m: activity.total_elevation_gain.unwrap_or(0.0),
            calories: None,
        }
        .with_pace()
    }

    /// Session values first; heart rate falls back to the sample mean
    pub fn from_table(table: &WorkoutTable) -> Self {
        let session = &table.session;
        let avg_hr = session.avg_heart_rate.filter(|hr| *hr > 0.0).or_else(|| {
            let samples: Vec<f64> = table
                .signal_values(Signal::HeartRate)
                .into_iter()
                .filter(|hr| *hr > 0.0)
                .collect();
            stats::mean(&samples)
        });

        WorkoutFacts {
            date: session.start_time.map(|t| t.date_naive()),
            sport: session.sport.clone(),
            distance_km: session_distance_km(table).unwrap_or(0.0),
            duration_min: session.total_elapsed_time_s.filter(|t| *t > 0.0).unwrap_or(0.0) / 60.0,
            avg_pace: None,
            avg_hr,
            elevation_m: session.total_ascent_m.unwrap_or(0.0),
            calories: session.total_calories,
        }
        .with_pace()
    }
}

/// Review of one workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutReview {
    pub date: Option<NaiveDate>,
    pub activity_kind: ActivityKind,
    pub summary: String,
    pub highlights: Vec<String>,
    pub suggestions: Vec<String>,
}

impl WorkoutReview {
    /// Shareable comment: summary, highlights and the first few suggestions
    pub fn comment(&self) -> String {
        let mut lines = vec![self.summary.clone(), String::new()];
        if !self.highlights.is_empty() {
            lines.push("Highlights:".to_string());
            lines.extend(self.highlights.iter().map(|h| format!("  - {}", h)));
            lines.push(String::new());
        }
        if !self.suggestions.is_empty() {
            lines.push("Suggestions for next workouts:".to_string());
            lines.extend(
                self.suggestions
                    .iter()
                    .take(MAX_COMMENT_SUGGESTIONS)
                    .map(|s| format!("  - {}", s)),
            );
        }
        lines.join("\n")
    }
}

/// Volume, intensity and a weekly plan across reviewed workouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOverview {
    pub workouts: usize,
    pub total_distance_km: f64,
    pub total_time_hours: f64,
    pub avg_hr: Option<f64>,
    /// Average heart rate as a percentage of estimated max
    pub avg_hr_pct: Option<f64>,
    pub avg_pace: Option<f64>,
    pub suggestions: Vec<String>,
    pub weekly_plan: Vec<String>,
}

/// Reviews for a batch of workouts plus the overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReview {
    pub max_heart_rate: u16,
    pub reviews: Vec<WorkoutReview>,
    pub overview: TrainingOverview,
}

const WEEKLY_PLAN: [&str; 4] = [
    "Monday: Easy run (60-70% max HR)",
    "Wednesday: Interval or tempo run",
    "Friday: Easy run or rest",
    "Sunday: Long run (70-80% max HR)",
];

pub struct WorkoutReviewer {
    max_hr: u16,
}

impl WorkoutReviewer {
    pub fn new(athlete_age: Option<u8>) -> Result<Self, ZoneError> {
        Ok(WorkoutReviewer {
            max_hr: ZoneCalculator::estimate_max_heart_rate(athlete_age)?,
        })
    }

    pub fn max_heart_rate(&self) -> u16 {
        self.max_hr
    }

    fn hr_percentage(&self, hr: f64) -> f64 {
        ZoneCalculator::hr_percentage(hr, f64::from(self.max_hr))
    }

    pub fn review(&self, facts: &WorkoutFacts) -> WorkoutReview {
        let kind = ActivityKind::detect(facts.avg_pace, facts.sport.as_deref());
        let review = WorkoutReview {
            date: facts.date,
            activity_kind: kind,
            summary: summary(kind, facts),
            highlights: self.highlights(kind, facts),
            suggestions: self.suggestions(kind, facts),
        };
        debug!(
            summary = %review.summary,
            highlights = review.highlights.len(),
            suggestions = review.suggestions.len(),
            "Workout reviewed"
        );
        review
    }

    fn highlights(&self, kind: ActivityKind, facts: &WorkoutFacts) -> Vec<String> {
        let mut highlights = Vec::new();

        if facts.elevation_m > 100.0 {
            highlights.push(format!(
                "{:.0}m elevation gain - great hill work!",
                facts.elevation_m
            ));
        }

        if let Some(hr) = facts.avg_hr {
            let zone = ZoneCalculator::heart_rate_zone(hr, f64::from(self.max_hr));
            let pct = self.hr_percentage(hr);
            let effort = if pct >= 80.0 {
                "High intensity effort"
            } else if pct >= 70.0 {
                "Moderate intensity"
            } else if pct >= 60.0 {
                "Steady aerobic effort"
            } else {
                "Easy recovery pace"
            };
            highlights.push(format!("{} - {} (avg HR: {:.0} bpm)", effort, zone, hr));
        }

        if let Some(calories) = facts.calories.filter(|c| *c > 500.0) {
            highlights.push(format!("{:.0} calories burned", calories));
        }

        if kind == ActivityKind::Running {
            if facts.distance_km > 10.0 {
                highlights.push("Long distance run - well done!".to_string());
            } else if facts.distance_km > 5.0 {
                highlights.push("Solid distance run".to_string());
            }
        }

        highlights
    }

    fn suggestions(&self, kind: ActivityKind, facts: &WorkoutFacts) -> Vec<String> {
        let mut suggestions: Vec<&str> = Vec::new();

        match kind {
            ActivityKind::Running => {
                if let Some(pace) = facts.avg_pace {
                    if pace < 4.5 {
                        suggestions.push("Consider adding recovery days after this intense effort");
                        suggestions.push("Mix in some easy runs to build aerobic base");
                    } else if pace < 6.0 {
                        suggestions.push("Great tempo effort! Consider adding intervals for speed work");
                    } else if pace > 7.0 {
                        suggestions.push("Good base building - try adding tempo runs (comfortably hard pace)");
                    }
                }

                if facts.elevation_m > 200.0 {
                    suggestions.push("Include flat runs to work on speed and efficiency");
                }

                if let Some(hr) = facts.avg_hr {
                    let pct = self.hr_percentage(hr);
                    if pct >= 80.0 {
                        suggestions.push("Next workout: Easy recovery run at 60-70% max HR");
                    } else if pct < 70.0 {
                        suggestions.push("Next workout: Tempo run or intervals to build speed");
                    }
                }

                if facts.distance_km > 15.0 {
                    suggestions.push("Consider shorter, faster runs to improve VO2 max");
                } else if facts.distance_km < 3.0 && facts.avg_pace.is_some_and(|p| p > 6.0) {
                    suggestions.push("Try extending your distance gradually for better endurance");
                }
            }
            ActivityKind::Walking => {
                suggestions.push("Great for active recovery and building base fitness");
                if facts.distance_km > 5.0 {
                    suggestions.push("Consider mixing in some running intervals to increase intensity");
                }
            }
            ActivityKind::Cycling | ActivityKind::Unknown => {}
        }

        if suggestions.is_empty() {
            suggestions.push("Keep up the consistent training!");
            if kind == ActivityKind::Running {
                suggestions.push("Mix in variety: intervals, tempo, and easy runs");
            }
        }

        suggestions.into_iter().map(String::from).collect()
    }

    pub fn overview(&self, workouts: &[WorkoutFacts]) -> TrainingOverview {
        let hrs: Vec<f64> = workouts.iter().filter_map(|w| w.avg_hr).collect();
        let paces: Vec<f64> = workouts.iter().filter_map(|w| w.avg_pace).collect();
        let avg_hr = stats::mean(&hrs);
        let avg_pace = stats::mean(&paces);

        let suggestions = match avg_pace {
            Some(pace) if pace < 5.0 => vec![
                "Your recent workouts have been very intense!",
                "Add more easy/recovery runs (60-70% max HR)",
                "Follow the 80/20 rule: 80% easy, 20% hard",
            ],
            Some(pace) if pace > 6.0 => vec![
                "Great base building! Time to add some intensity:",
                "Include 1-2 interval sessions per week",
                "Add tempo runs (comfortably hard pace)",
            ],
            _ => Vec::new(),
        };

        TrainingOverview {
            workouts: workouts.len(),
            total_distance_km: workouts.iter().map(|w| w.distance_km).sum(),
            total_time_hours: workouts.iter().map(|w| w.duration_min).sum::<f64>() / 60.0,
            avg_hr,
            avg_hr_pct: avg_hr.map(|hr| self.hr_percentage(hr)),
            avg_pace,
            suggestions: suggestions.into_iter().map(String::from).collect(),
            weekly_plan: if workouts.is_empty() {
                Vec::new()
            } else {
                WEEKLY_PLAN.iter().map(|s| s.to_string()).collect()
            },
        }
    }

    pub fn review_all(&self, workouts: &[WorkoutFacts]) -> TrainingReview {
        TrainingReview {
            max_heart_rate: self.max_hr,
            reviews: workouts.iter().map(|w| self.review(w)).collect(),
            overview: self.overview(workouts),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn summary(kind: ActivityKind, facts: &WorkoutFacts) -> String {
    let mut parts = Vec::new();

    if kind != ActivityKind::Unknown {
        parts.push(capitalize(&kind.to_string()));
    } else if let Some(sport) = facts.sport.as_deref().filter(|s| !s.eq_ignore_ascii_case("unknown")) {
        parts.push(capitalize(sport));
    }

    if facts.distance_km > 0.0 {
        if facts.distance_km < 1.0 {
            parts.push(format!("{:.0}m", facts.distance_km * 1000.0));
        } else {
            parts.push(format!("{:.2}km", facts.distance_km));
        }
    }

    if facts.duration_min > 0.0 {
        let hours = (facts.duration_min / 60.0).floor();
        let minutes = (facts.duration_min % 60.0).floor();
        if hours > 0.0 {
            parts.push(format!("{}h {}m", hours, minutes));
        } else {
            parts.push(format!("{}m", minutes));
        }
    }

    if let Some(pace) = facts.avg_pace {
        parts.push(format!("avg pace {}/km", format_run_pace(pace)));
    }

    parts.join(" • ")
}
