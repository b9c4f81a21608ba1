//! Run configuration, read from environment variables with defaults.
//!
//! | Variable           | Meaning                                  | Default                      |
//! |--------------------|------------------------------------------|------------------------------|
//! | `MOER_DATASET_URL` | dataset download location                | WattTime sample on GitHub    |
//! | `MOER_DATA_DIR`    | cache directory                          | `data`                       |
//! | `MOER_START`       | first sample kept (ISO-8601, inclusive)  | `2019-03-01T00:00:00Z`       |
//! | `MOER_END`         | last sample kept (ISO-8601, inclusive)   | `2019-04-01T00:00:00Z`       |
//! | `MOER_HEADER_ROWS` | leading rows to skip                     | `1`                          |
//! | `MOER_CHART_CSV`   | optional path for the chart series CSV   | unset                        |

use crate::dataset::DatasetConfig;
use crate::moer::{parse_timestamp, TimeRange};
use crate::refrigerator::RefrigeratorConfig;
use crate::windows::WindowConfig;
use chrono::{TimeZone, Utc};
use std::path::PathBuf;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed
    InvalidValue { key: String, value: String },
    /// Start of the time range is after its end
    InvalidTimeRange,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => write!(f, "Invalid value for {}: '{}'", key, value),
            ConfigError::InvalidTimeRange => write!(f, "MOER_START must not be after MOER_END"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything the `fridge-sim` binary needs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub dataset: DatasetConfig,
    pub window: WindowConfig,
    pub refrigerator: RefrigeratorConfig,
    /// Where to write the chart series, if anywhere
    pub chart_output: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let start = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).single();
        let end = Utc.with_ymd_and_hms(2019, 4, 1, 0, 0, 0).single();
        let time_range = start.zip(end).map(|(start, end)| TimeRange::new(start, end));

        SimulationConfig {
            dataset: DatasetConfig::default(),
            window: WindowConfig::new(1, time_range),
            refrigerator: RefrigeratorConfig::default(),
            chart_output: None,
        }
    }
}

impl SimulationConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset or empty variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = SimulationConfig::default();

        if let Some(url) = get("MOER_DATASET_URL") {
            config.dataset.url = url;
        }
        if let Some(dir) = get("MOER_DATA_DIR") {
            config.dataset.data_dir = PathBuf::from(dir);
        }
        if let Some(rows) = get("MOER_HEADER_ROWS") {
            config.window.header_rows = rows
                .trim()
                .parse()
                .map_err(|_| invalid("MOER_HEADER_ROWS", &rows))?;
        }

        let start = get("MOER_START")
            .map(|value| parse_timestamp(&value).map_err(|_| invalid("MOER_START", &value)))
            .transpose()?;
        let end = get("MOER_END")
            .map(|value| parse_timestamp(&value).map_err(|_| invalid("MOER_END", &value)))
            .transpose()?;
        if let Some(range) = config.window.time_range.as_mut() {
            if let Some(start) = start {
                range.start = start;
            }
            if let Some(end) = end {
                range.end = end;
            }
            if !range.is_valid() {
                return Err(ConfigError::InvalidTimeRange);
            }
        }

        config.chart_output = get("MOER_CHART_CSV").map(PathBuf::from);

        Ok(config)
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
