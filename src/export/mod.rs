//! Report output: pretty JSON for tooling, plain text for people

use crate::error::ExportError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub mod json;
pub mod text;

pub use text::TextReport;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

/// Write a report in the requested format to a file, or stdout when `output` is None
pub fn write_report<T>(report: &T, format: OutputFormat, output: Option<&Path>) -> Result<(), ExportError>
where
    T: Serialize + TextReport + ?Sized,
{
    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| ExportError::ExportFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            let mut writer = BufWriter::new(file);
            render(report, format, &mut writer)?;
            writer.flush()?;
            info!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            render(report, format, &mut writer)?;
        }
    }
    Ok(())
}

fn render<T, W>(report: &T, format: OutputFormat, writer: &mut W) -> Result<(), ExportError>
where
    T: Serialize + TextReport + ?Sized,
    W: Write,
{
    match format {
        OutputFormat::Json => json::write_json(report, writer),
        OutputFormat::Text => Ok(report.write_text(writer)?),
    }
}

/// Format a duration as `H:MM:SS`, or `M:SS` under an hour
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a swim speed as pace per 100 m, `N/A` for non-positive speeds
pub fn format_swim_pace(speed_ms: f64) -> String {
    if !(speed_ms.is_finite() && speed_ms > 0.0) {
        return "N/A".to_string();
    }
    let pace_per_100m = 100.0 / speed_ms;
    let minutes = (pace_per_100m / 60.0).floor() as u64;
    let seconds = (pace_per_100m % 60.0).floor() as u64;
    format!("{}:{:02}/100m", minutes, seconds)
}

/// Format a running pace in min/km as `M:SS`
pub fn format_run_pace(pace_min_per_km: f64) -> String {
    if !(pace_min_per_km.is_finite() && pace_min_per_km > 0.0) {
        return "N/A".to_string();
    }
    let minutes = pace_min_per_km.trunc();
    let seconds = ((pace_min_per_km - minutes) * 60.0).trunc();
    format!("{}:{:02}", minutes as u64, seconds as u64)
}
