//! Reporting over a simulation history: totals and chart-ready series.
//!
//! Plot rendering is left to external tools; this module only shapes the data
//! and writes it as CSV or JSON.

use crate::environment::EnvironmentSnapshot;
use crate::refrigerator::RefrigeratorStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Cumulative results of a (possibly partial) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Samples processed
    pub ticks: usize,
    /// Samples during which the appliance was on
    pub on_ticks: usize,
    pub total_lb_co2: f64,
    /// Runtime in minutes
    pub total_run_time: f64,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
}

impl SimulationSummary {
    /// Builds a summary from the final snapshot. Returns `None` for an empty
    /// history.
    pub fn from_history(history: &[EnvironmentSnapshot]) -> Option<Self> {
        let first = history.first()?;
        let last = history.last()?;
        let on_ticks = history
            .iter()
            .filter(|snapshot| snapshot.refrigerator.status == RefrigeratorStatus::On)
            .count();

        Some(SimulationSummary {
            ticks: history.len(),
            on_ticks,
            total_lb_co2: last.refrigerator.total_lb_co2,
            total_run_time: last.refrigerator.total_run_time,
            first_timestamp: first.moer.timestamp,
            last_timestamp: last.moer.timestamp,
        })
    }

    pub fn run_time_hours(&self) -> f64 {
        self.total_run_time / 60.0
    }
}

impl std::fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Simulated: {} to {} ({} ticks, {} on)",
            self.first_timestamp.format("%Y-%m-%d %H:%M"),
            self.last_timestamp.format("%Y-%m-%d %H:%M"),
            self.ticks,
            self.on_ticks
        )?;
        writeln!(f, "Total lb CO2: {}", self.total_lb_co2)?;
        write!(f, "Total Runtime Hours: {}", self.run_time_hours())
    }
}

/// One row of the chart series, keyed by sample time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub moer: i64,
    /// 0 = off, 1 = on
    pub status: u8,
    pub total_lb_co2: f64,
}

impl From<&EnvironmentSnapshot> for ChartPoint {
    fn from(snapshot: &EnvironmentSnapshot) -> Self {
        ChartPoint {
            timestamp: snapshot.moer.timestamp,
            temperature: snapshot.refrigerator.temperature,
            moer: snapshot.moer.moer,
            status: snapshot.refrigerator.status.as_value(),
            total_lb_co2: snapshot.refrigerator.total_lb_co2,
        }
    }
}

pub fn chart_series(history: &[EnvironmentSnapshot]) -> Vec<ChartPoint> {
    history.iter().map(ChartPoint::from).collect()
}

/// Errors raised while writing reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    Csv(String),
    Json(String),
    Io(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Csv(msg) => write!(f, "CSV write error: {}", msg),
            ReportError::Json(msg) => write!(f, "JSON write error: {}", msg),
            ReportError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Json(err.to_string())
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

/// Writes the chart series as CSV with a header row.
pub fn write_chart_csv<W: Write>(history: &[EnvironmentSnapshot], writer: W) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(writer);
    for point in chart_series(history) {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the full history as a JSON array.
pub fn write_history_json<W: Write>(history: &[EnvironmentSnapshot], writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, history)?;
    Ok(())
}
