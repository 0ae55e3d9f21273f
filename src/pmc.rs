use crate::models::ActivitySummary;
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// PMC calculation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PmcError {
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Daily TSS record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTss {
    /// Date of the training day
    pub date: NaiveDate,

    /// Total TSS for the day (sum of all activities)
    pub total_tss: Decimal,

    /// Number of activities completed on this day
    pub workout_count: u16,
}

/// One calendar day of the Performance Management Chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmcPoint {
    pub date: NaiveDate,

    /// Daily TSS, zero on rest days
    pub tss: Decimal,

    /// Activities that contributed to `tss`
    pub workout_count: u16,

    /// Chronic Training Load (42-day exponentially weighted average)
    pub ctl: Decimal,

    /// Acute Training Load (7-day exponentially weighted average)
    pub atl: Decimal,

    /// Training Stress Balance (CTL - ATL)
    pub tsb: Decimal,
}

/// Which activities feed the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SportFilter {
    #[default]
    All,
    Swim,
    Run,
    Ride,
}

impl SportFilter {
    pub fn matches(&self, activity: &ActivitySummary) -> bool {
        let sport_type = activity.sport_type.as_deref().map(str::to_lowercase);
        let activity_type = activity.activity_type.as_deref().map(str::to_lowercase);
        let sport_in = |options: &[&str]| {
            sport_type
                .as_deref()
                .is_some_and(|s| options.contains(&s))
        };
        let type_in = |options: &[&str]| {
            activity_type
                .as_deref()
                .is_some_and(|t| options.contains(&t))
        };

        match self {
            SportFilter::All => true,
            SportFilter::Swim => sport_in(&["swim", "openwaterswim"]) || type_in(&["swim"]),
            SportFilter::Run => sport_in(&["run"]) || type_in(&["run"]),
            SportFilter::Ride => {
                sport_in(&["ride", "virtualride"]) || type_in(&["ride", "bike", "cycle"])
            }
        }
    }
}

impl FromStr for SportFilter {
    type Err = PmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SportFilter::All),
            "swim" => Ok(SportFilter::Swim),
            "run" => Ok(SportFilter::Run),
            "ride" | "bike" => Ok(SportFilter::Ride),
            other => Err(PmcError::ConfigurationError(format!(
                "Unknown sport filter '{}' (expected all, swim, run or ride)",
                other
            ))),
        }
    }
}

impl fmt::Display for SportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SportFilter::All => "all",
            SportFilter::Swim => "swim",
            SportFilter::Run => "run",
            SportFilter::Ride => "ride",
        };
        write!(f, "{}", name)
    }
}

/// PMC configuration with customizable time constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmcConfig {
    /// CTL time constant in days (default: 42)
    pub ctl_time_constant: u16,

    /// ATL time constant in days (default: 7)
    pub atl_time_constant: u16,

    /// Days of history shown when no window is given (default: 180)
    pub default_window_days: u32,

    /// Sport filter applied when none is given
    pub sport_filter: SportFilter,
}

impl Default for PmcConfig {
    fn default() -> Self {
        PmcConfig {
            ctl_time_constant: 42,
            atl_time_constant: 7,
            default_window_days: 180,
            sport_filter: SportFilter::All,
        }
    }
}

/// Training Stress Balance interpretation ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsbInterpretation {
    VeryFresh,    // +25 and above
    Fresh,        // +5 to +25
    Neutral,      // -10 to +5
    Fatigued,     // -30 to -10
    VeryFatigued, // Below -30
}

impl TsbInterpretation {
    /// Get TSB interpretation from numeric value
    pub fn from_tsb(tsb: Decimal) -> Self {
        if tsb >= dec!(25) {
            TsbInterpretation::VeryFresh
        } else if tsb >= dec!(5) {
            TsbInterpretation::Fresh
        } else if tsb >= dec!(-10) {
            TsbInterpretation::Neutral
        } else if tsb >= dec!(-30) {
            TsbInterpretation::Fatigued
        } else {
            TsbInterpretation::VeryFatigued
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryFresh => "Very fresh (may be losing fitness)",
            TsbInterpretation::Fresh => "Fresh and ready for hard training/racing",
            TsbInterpretation::Neutral => "Neutral (normal training)",
            TsbInterpretation::Fatigued => "Fatigued (monitor closely)",
            TsbInterpretation::VeryFatigued => "Very fatigued (rest needed)",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            TsbInterpretation::VeryFresh => {
                "Consider increasing training load or plan peak performance"
            }
            TsbInterpretation::Fresh => "Good time for high-intensity sessions or racing",
            TsbInterpretation::Neutral => "Continue normal training progression",
            TsbInterpretation::Fatigued => "Reduce intensity, focus on recovery sessions",
            TsbInterpretation::VeryFatigued => {
                "Prioritize rest and recovery before resuming training"
            }
        }
    }
}

/// Core PMC calculation engine
pub struct PmcCalculator {
    config: PmcConfig,
}

impl Default for PmcCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PmcCalculator {
    /// Create new PMC calculator with default configuration
    pub fn new() -> Self {
        PmcCalculator {
            config: PmcConfig::default(),
        }
    }

    /// Create new PMC calculator with custom configuration
    pub fn with_config(config: PmcConfig) -> Result<Self, PmcError> {
        if config.ctl_time_constant == 0 || config.atl_time_constant == 0 {
            return Err(PmcError::ConfigurationError(
                "Time constants must be at least one day".to_string(),
            ));
        }
        Ok(PmcCalculator { config })
    }

    pub fn config(&self) -> &PmcConfig {
        &self.config
    }

    /// Intensity factor from the heart rate ratio, else a per-sport default
    pub fn intensity_factor(activity: &ActivitySummary) -> Decimal {
        let from_hr = match (activity.average_heartrate, activity.max_heartrate) {
            (Some(avg), Some(max)) if avg > Decimal::ZERO && max > Decimal::ZERO => {
                avg.checked_div(max)
            }
            _ => None,
        };

        match from_hr {
            Some(ratio) => (ratio * dec!(0.9) + dec!(0.1)).clamp(dec!(0.3), dec!(1.0)),
            None => {
                let sport = activity.sport_label().to_lowercase();
                if sport.contains("swim") {
                    dec!(0.75)
                } else if sport.contains("run") {
                    dec!(0.78)
                } else if sport.contains("ride") || sport.contains("bike") || sport.contains("cycle")
                {
                    dec!(0.70)
                } else {
                    dec!(0.75)
                }
            }
        }
    }

    /// TSS = hours × IF² × 100
    pub fn activity_tss(activity: &ActivitySummary) -> Decimal {
        let seconds = activity.duration_seconds();
        if seconds == 0 {
            return Decimal::ZERO;
        }
        let intensity = Self::intensity_factor(activity);
        // seconds / 3600 × 100 folds into seconds / 36
        Decimal::from(seconds) * intensity * intensity / dec!(36)
    }

    /// Aggregate daily TSS from a collection of activities
    pub fn aggregate_daily_tss(
        &self,
        activities: &[ActivitySummary],
    ) -> BTreeMap<NaiveDate, DailyTss> {
        let mut daily_tss: BTreeMap<NaiveDate, DailyTss> = BTreeMap::new();

        for activity in activities {
            let tss = Self::activity_tss(activity);

            daily_tss
                .entry(activity.start_date)
                .and_modify(|day| {
                    day.total_tss += tss;
                    day.workout_count = day.workout_count.saturating_add(1);
                })
                .or_insert(DailyTss {
                    date: activity.start_date,
                    total_tss: tss,
                    workout_count: 1,
                });
        }

        daily_tss
    }

    /// Dormant-start EMA step: stays at zero until the first loaded day
    fn ema_step(current: Decimal, tss: Decimal, period: u16) -> Decimal {
        if current.is_zero() && tss > Decimal::ZERO {
            tss
        } else if current > Decimal::ZERO {
            current + (tss - current) / Decimal::from(period)
        } else {
            current
        }
    }

    /// One point per calendar day of `[start_date, end_date]`
    pub fn calculate_pmc_series(
        &self,
        daily_tss: &BTreeMap<NaiveDate, DailyTss>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PmcPoint>, PmcError> {
        if start_date > end_date {
            return Err(PmcError::InvalidDateRange(
                "Start date must be before end date".to_string(),
            ));
        }

        let mut series = Vec::new();
        let mut ctl = Decimal::ZERO;
        let mut atl = Decimal::ZERO;

        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            let (tss, workout_count) = daily_tss
                .get(&date)
                .map(|d| (d.total_tss, d.workout_count))
                .unwrap_or((Decimal::ZERO, 0));

            ctl = Self::ema_step(ctl, tss, self.config.ctl_time_constant);
            atl = Self::ema_step(atl, tss, self.config.atl_time_constant);

            series.push(PmcPoint {
                date,
                tss,
                workout_count,
                ctl,
                atl,
                tsb: ctl - atl,
            });
        }

        Ok(series)
    }

    /// Chart for activities in `[today - window_days, today]`, after the sport filter
    pub fn calculate_pmc(
        &self,
        activities: &[ActivitySummary],
        window_days: u32,
        today: NaiveDate,
        filter: SportFilter,
    ) -> Result<Vec<PmcPoint>, PmcError> {
        let start_date = today
            .checked_sub_days(Days::new(u64::from(window_days)))
            .ok_or_else(|| {
                PmcError::InvalidDateRange(format!("Window of {} days is too long", window_days))
            })?;

        let selected: Vec<ActivitySummary> = activities
            .iter()
            .filter(|a| a.start_date >= start_date && a.start_date <= today)
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        debug!(
            "{} of {} activities selected for PMC ({})",
            selected.len(),
            activities.len(),
            filter
        );

        let daily_tss = self.aggregate_daily_tss(&selected);
        let series = self.calculate_pmc_series(&daily_tss, start_date, today)?;

        if let Some(last) = series.last() {
            info!(
                "PMC through {}: CTL {:.1}, ATL {:.1}, TSB {:.1}",
                last.date, last.ctl, last.atl, last.tsb
            );
        }
        Ok(series)
    }

    /// Chart ending today (UTC) with the configured window and filter
    pub fn calculate_recent_pmc(
        &self,
        activities: &[ActivitySummary],
    ) -> Result<Vec<PmcPoint>, PmcError> {
        self.calculate_pmc(
            activities,
            self.config.default_window_days,
            Utc::now().date_naive(),
            self.config.sport_filter,
        )
    }
}
