//! Unified error hierarchy for CoachRS
//!
//! Module-level errors (trend comparison, PMC, run reviews, heart rate zones)
//! live next to their code and are
//! folded into [`CoachError`] here, together with the file import and export
//! errors shared by the CLI.

use crate::pmc::PmcError;
use crate::running::RunningError;
use crate::trends::TrendError;
use crate::zones::ZoneError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all CoachRS operations
#[derive(Debug, Error)]
pub enum CoachError {
    /// Workout and activity file import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Multi-workout comparison errors
    #[error("Trend error: {0}")]
    Trend(#[from] TrendError),

    /// Performance Management Chart errors
    #[error("PMC error: {0}")]
    Pmc(#[from] PmcError),

    /// Running block review errors
    #[error("Running error: {0}")]
    Running(#[from] RunningError),

    /// Heart rate zone errors
    #[error("Zone error: {0}")]
    Zone(#[from] ZoneError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading workout tables and activity summaries
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Extension not recognised by any reader
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Malformed CSV
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed JSON
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Required column or field absent
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// Field present but unparseable
    #[error("Invalid field value in {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while writing reports
#[derive(Debug, Error)]
pub enum ExportError {
    /// Report serialization failed
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing to the destination failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoachRS operations
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoachError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            CoachError::Trend(TrendError::NoWorkouts) => ErrorSeverity::Warning,
            CoachError::Validation(_) => ErrorSeverity::Warning,
            CoachError::Running(_) | CoachError::Zone(_) => ErrorSeverity::Warning,
            CoachError::Configuration(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CoachError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find workout file: {}", path.display())
            }
            CoachError::Import(ImportError::MissingData { field }) => {
                format!(
                    "Workout file is missing '{}'. Please export it with complete data.",
                    field
                )
            }
            CoachError::Trend(TrendError::NoWorkouts) => {
                "No workouts to compare. Provide at least one workout file.".to_string()
            }
            CoachError::Running(RunningError::InvalidWindow(window)) => {
                format!("Cannot review a window of {}. Use a smaller --days value.", window)
            }
            CoachError::Zone(ZoneError::InvalidAge(age)) => {
                format!("Athlete age {} is out of range. Set analysis.athlete_age between 1 and 119.", age)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = CoachError::Import(ImportError::FileNotFound {
            path: PathBuf::from("/test/swim.csv"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = CoachError::Configuration("bad toml".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_user_messages() {
        let err = CoachError::Import(ImportError::FileNotFound {
            path: PathBuf::from("swim.csv"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err: CoachError = TrendError::NoWorkouts.into();
        assert!(err.user_message().contains("No workouts"));
    }

    #[test]
    fn test_module_errors_convert() {
        let err: CoachError = PmcError::InvalidDateRange("backwards".to_string()).into();
        assert!(matches!(err, CoachError::Pmc(_)));

        let err: CoachError = RunningError::InvalidWindow("-1 days before 2024-03-31".to_string()).into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().contains("--days"));

        let err: CoachError = ZoneError::InvalidAge(0).into();
        assert!(err.user_message().contains("analysis.athlete_age"));
        assert!(err.to_string().contains("backwards"));
    }
}
