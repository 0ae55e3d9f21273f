//! Log setup for the coachrs binary
//!
//! Reports own stdout, so every log line goes to stderr. Scoring decisions are
//! logged at `debug`, degraded inputs (short signals, skipped rows) at `warn`.
//! A `[logging]` file path adds a JSON-lines log next to the console output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Target shared by the library and the binary; dependencies stay silent
const LOG_TARGET: &str = "coachrs";

const DEFAULT_LOG_FILE: &str = "coachrs.log";

/// `[logging]` section of the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,

    /// Console layout
    pub format: LogFormat,

    /// JSON-lines log file; console only when unset
    pub file_path: Option<PathBuf>,

    /// How often the log file starts over under a dated name
    pub rotation: LogRotation,

    /// Log span enter/close events (pretty) or span context (json)
    pub include_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            file_path: None,
            rotation: LogRotation::Daily,
            include_spans: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Quietest first
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// One step more verbose per `-v`, capped at trace
    pub fn raised_by(self, verbosity: u8) -> LogLevel {
        let current = self as usize;
        let raised = (current + usize::from(verbosity)).min(Self::ALL.len() - 1);
        Self::ALL[raised]
    }

    fn directive(&self) -> String {
        format!("{}={}", LOG_TARGET, self.as_str())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        if wanted == "warning" {
            return Ok(LogLevel::Warn);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| format!("Invalid log level: {}", s))
    }
}

/// Console layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line with targets and line numbers
    Pretty,
    Json,
    /// One line per event, no target
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Append to the configured file forever
    Never,
    Hourly,
    Daily,
}

impl LogConfig {
    /// Appender for `file_path`, creating its directory first
    fn file_appender(&self, file_path: &Path) -> anyhow::Result<RollingFileAppender> {
        let dir = file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);

        Ok(match self.rotation {
            LogRotation::Never => rolling::never(dir, name),
            LogRotation::Hourly => rolling::hourly(dir, name),
            LogRotation::Daily => rolling::daily(dir, name),
        })
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG overrides the configured level
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.directive()))
    }
}

/// Install the global subscriber; fails if one is already set
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let spans = config.include_spans;
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let console = match config.format {
        LogFormat::Pretty => console
            .pretty()
            .with_line_number(true)
            .with_span_events(if spans {
                FmtSpan::ENTER | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Json => console
            .json()
            .with_current_span(spans)
            .with_span_list(spans)
            .boxed(),
        LogFormat::Compact => console.compact().with_target(false).boxed(),
    };

    let file = match &config.file_path {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(config.file_appender(path)?)
                .with_current_span(spans)
                .with_span_list(spans),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(console)
        .with(file)
        .try_init()?;

    tracing::debug!(
        level = %config.level,
        format = ?config.format,
        file = ?config.file_path,
        rotation = ?config.rotation,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("Trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    }

    #[test]
    fn test_verbosity_raises_level() {
        assert_eq!(LogLevel::Warn.raised_by(0), LogLevel::Warn);
        assert_eq!(LogLevel::Warn.raised_by(1), LogLevel::Info);
        assert_eq!(LogLevel::Warn.raised_by(2), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.raised_by(9), LogLevel::Trace);
    }

    #[test]
    fn test_directive_targets_the_crate() {
        assert_eq!(LogLevel::Debug.directive(), "coachrs=debug");
    }

    #[test]
    fn test_logging_section_from_toml() {
        let config: LogConfig = toml::from_str(
            r#"
            level = "info"
            file_path = "/tmp/coachrs/coachrs.log"
            rotation = "never"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.rotation, LogRotation::Never);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/coachrs/coachrs.log")));
    }

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            file_path: Some(dir.path().join("logs").join("coachrs.log")),
            rotation: LogRotation::Never,
            ..LogConfig::default()
        };
        let path = config.file_path.clone().unwrap();

        config.file_appender(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
