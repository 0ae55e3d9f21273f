// Library interface for CoachRS modules
// This allows integration tests to access the core functionality

pub mod classifier;
pub mod config;
pub mod economy;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pmc;
pub mod review;
pub mod running;
pub mod stats;
pub mod swimming;
pub mod trends;
pub mod zones;

// Re-export commonly used types for convenience
pub use classifier::{classify_swim, ActivityKind, SwimWorkoutType};
pub use config::AppConfig;
pub use economy::{EconomyRating, RunningEconomy};
pub use error::{CoachError, ErrorSeverity, ExportError, ImportError, Result};
pub use import::ImportManager;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{LongRunMetrics, RunMetrics, SwimMetrics};
pub use models::*;
pub use pmc::{PmcCalculator, PmcConfig, PmcPoint, SportFilter, TsbInterpretation};
pub use review::{TrainingReview, WorkoutFacts, WorkoutReview, WorkoutReviewer};
pub use running::{RunGrade, RunInterval, RunningAnalyzer, RunningError};
pub use swimming::{analyze_workout, Grade, SubScores, WorkoutAnalysis};
pub use trends::{compare, compare_tables, ComparisonReport, TrendError};
pub use zones::{HeartRateZone, ZoneCalculator};
