pub mod moer;
pub mod error;
pub mod windows;
pub mod refrigerator;
pub mod environment;
pub mod simulation;
pub mod report;
pub mod dataset;
pub mod config;

pub use moer::{parse_moer_record, parse_timestamp, MoerParseError, MoerRecord, RawMoerRow, TimeRange};
pub use error::SimulationError;
pub use windows::{csv_windows, MoerWindows, WindowConfig};
pub use refrigerator::{
    Refrigerator,
    RefrigeratorConfig,
    RefrigeratorSnapshot,
    RefrigeratorStatus,
    EVENTS_PER_HOUR,
    MAX_TEMP,
    MIN_TEMP,
    POWER_USAGE_W,
};
pub use environment::{average_moer, decide_status, Environment, EnvironmentSnapshot};
pub use simulation::{Simulation, SimulationRun};
pub use report::{chart_series, write_chart_csv, write_history_json, ChartPoint, ReportError, SimulationSummary};
pub use dataset::{DatasetConfig, DatasetError, DatasetFetcher, DEFAULT_DATASET_URL};
pub use config::{ConfigError, SimulationConfig};
