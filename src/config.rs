use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::OutputFormat;
use crate::logging::LogConfig;
use crate::models::Sport;
use crate::pmc::PmcConfig;
use crate::running::{DEFAULT_BLOCK_DAYS, LONG_RUN_KM};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Performance Management Chart settings
    pub pmc: PmcConfig,

    /// Workout analysis defaults
    pub analysis: AnalysisSettings,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Workout analysis defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Sport assumed when a recording carries no session sport
    pub default_sport: Option<Sport>,

    /// Report format when none is given on the command line
    pub output_format: OutputFormat,

    /// Minimum distance for a run to count as a long run, in km
    pub long_run_min_km: f64,

    /// Number of long runs graded by `long-run`
    pub long_run_count: usize,

    /// Running block window in days
    pub block_days: i64,

    /// Age used to estimate maximum heart rate for zones
    pub athlete_age: Option<u8>,

    /// Activities reviewed by `review`, newest first
    pub review_count: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            default_sport: None,
            output_format: OutputFormat::Text,
            long_run_min_km: LONG_RUN_KM,
            long_run_count: 3,
            block_days: DEFAULT_BLOCK_DAYS,
            athlete_age: None,
            review_count: 20,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            pmc: PmcConfig::default(),
            analysis: AnalysisSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coachrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    ///
    /// A missing file is silent; an unreadable one is reported on stderr since
    /// logging is configured from this file and is not running yet.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring config file {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::default_config_path())
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Read a dotted key such as `pmc.ctl_time_constant`
    pub fn get_value(&self, key: &str) -> Result<toml::Value> {
        let root = toml::Value::try_from(self)?;
        key.split('.')
            .try_fold(&root, |value, part| value.get(part))
            .cloned()
            .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))
    }

    /// Set a dotted key; the value is parsed as TOML, falling back to a string
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut root = toml::Value::try_from(&*self)?;
        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = parts.split_last() else {
            bail!("Empty configuration key");
        };

        let mut table = root
            .as_table_mut()
            .ok_or_else(|| anyhow!("Configuration is not a table"))?;
        for part in parents {
            table = table
                .get_mut(*part)
                .and_then(toml::Value::as_table_mut)
                .ok_or_else(|| anyhow!("Unknown configuration key: {}", key))?;
        }
        if !table.contains_key(*last) && !is_optional_key(key) {
            bail!("Unknown configuration key: {}", key);
        }

        let value = parse_toml_scalar(raw);
        table.insert((*last).to_string(), value);

        let updated: AppConfig = root
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
        *self = updated;
        Ok(())
    }
}

/// Optional settings are omitted from the serialized form while unset
fn is_optional_key(key: &str) -> bool {
    matches!(
        key,
        "analysis.default_sport" | "analysis.athlete_age" | "logging.file_path"
    )
}

fn parse_toml_scalar(raw: &str) -> toml::Value {
    format!("value = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
