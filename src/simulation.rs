//! Run driver
//!
//! Pulls windows from a generator, feeds them to the control loop and keeps
//! the resulting history. A fatal error stops the run but the history
//! recorded up to that point is returned with it.

use crate::environment::{Environment, EnvironmentSnapshot};
use crate::error::SimulationError;
use crate::moer::MoerRecord;
use crate::refrigerator::{Refrigerator, RefrigeratorConfig};
use crate::report::SimulationSummary;
use crate::windows::{csv_windows, WindowConfig};
use chrono::{DateTime, Utc};
use std::io::Read;
use std::time::Duration;

/// Outcome of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// One snapshot per processed sample, in order
    pub history: Vec<EnvironmentSnapshot>,
    /// Windows pulled from the generator (including empty ones)
    pub windows: usize,
    /// Fatal error that ended the run early, if any
    pub error: Option<SimulationError>,
    /// When the run started (wall-clock time)
    pub start_time: DateTime<Utc>,
    /// Wall-clock elapsed time
    pub elapsed: Duration,
}

impl SimulationRun {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Totals over the recorded history, partial or not.
    pub fn summary(&self) -> Option<SimulationSummary> {
        SimulationSummary::from_history(&self.history)
    }

    /// Converts into the history, or the error that ended the run.
    pub fn into_result(self) -> Result<Vec<EnvironmentSnapshot>, SimulationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.history),
        }
    }
}

impl std::fmt::Display for SimulationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            None => writeln!(
                f,
                "Simulation complete: {} ticks over {} windows",
                self.history.len(),
                self.windows
            )?,
            Some(err) => writeln!(
                f,
                "Simulation aborted after {} ticks over {} windows: {}",
                self.history.len(),
                self.windows,
                err
            )?,
        }
        write!(f, "Elapsed: {:.2}s", self.elapsed.as_secs_f64())
    }
}

/// Drives one refrigerator through a sequence of MOER windows.
///
/// # Example
///
/// ```rust
/// use fridge_sim::{RefrigeratorConfig, Simulation, WindowConfig};
///
/// let csv = "timestamp,MOER\n2019-03-01 00:00:00+00:00,900\n2019-03-01 00:05:00+00:00,950\n";
/// let mut simulation = Simulation::new(RefrigeratorConfig::default()).unwrap();
/// let run = simulation.run_csv(csv.as_bytes(), WindowConfig::new(1, None));
///
/// assert!(run.is_complete());
/// assert_eq!(run.history.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    config: RefrigeratorConfig,
    environment: Environment,
}

impl Simulation {
    /// Creates a simulation for refrigerators built from `config`.
    ///
    /// # Arguments
    /// * `config` - Appliance parameters used for every run
    ///
    /// # Returns
    /// Returns `Ok(Simulation)` if the configuration is accepted.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the refrigerator configuration is rejected.
    pub fn new(config: RefrigeratorConfig) -> Result<Self, SimulationError> {
        let environment = Environment::new(Refrigerator::new(config.clone())?);
        Ok(Simulation { config, environment })
    }

    /// Environment of the most recent run (fresh before the first one).
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Consumes windows until the source is exhausted or a fatal error occurs.
    ///
    /// Every call starts from a new refrigerator and an empty history, so
    /// state left behind by an earlier run (including an aborted one) never
    /// leaks into this one.
    ///
    /// # Arguments
    /// * `windows` - Windows of MOER records in chronological order
    ///
    /// # Returns
    /// A `SimulationRun` holding the history. When a window fails, the run
    /// stops there and carries the error next to the history recorded so far.
    pub fn run<I>(&mut self, windows: I) -> SimulationRun
    where
        I: IntoIterator<Item = Result<Vec<MoerRecord>, SimulationError>>,
    {
        let start_time = Utc::now();
        let mut history = Vec::new();
        let mut window_count = 0;
        let mut error = None;

        let refrigerator = match Refrigerator::new(self.config.clone()) {
            Ok(refrigerator) => refrigerator,
            Err(err) => {
                return SimulationRun {
                    history,
                    windows: window_count,
                    error: Some(err),
                    start_time,
                    elapsed: Duration::from_secs(0),
                }
            }
        };
        self.environment = Environment::new(refrigerator);

        for window in windows {
            window_count += 1;
            let outcome = window.and_then(|window| self.environment.run_window(&window, &mut history));
            if let Err(err) = outcome {
                log::error!(
                    "Simulation aborted in window {} after {} ticks: {}",
                    window_count,
                    history.len(),
                    err
                );
                error = Some(err);
                break;
            }
        }

        let elapsed = Utc::now()
            .signed_duration_since(start_time)
            .to_std()
            .unwrap_or(Duration::from_secs(0));

        if error.is_none() {
            log::info!(
                "Simulation complete: {} ticks over {} windows",
                history.len(),
                window_count
            );
        }

        SimulationRun {
            history,
            windows: window_count,
            error,
            start_time,
            elapsed,
        }
    }

    /// Runs over CSV text with `timestamp,moer` rows.
    ///
    /// # Arguments
    /// * `reader` - CSV byte stream
    /// * `config` - Header rows, window size and optional time filter
    ///
    /// # Returns
    /// A `SimulationRun` as for [`Simulation::run`]. An invalid window
    /// configuration ends the run before any row is read.
    pub fn run_csv<R: Read>(&mut self, reader: R, config: WindowConfig) -> SimulationRun {
        match &config.time_range {
            Some(range) => log::info!(
                "Starting simulation: {} to {}, skipping {} header rows",
                range.start,
                range.end,
                config.header_rows
            ),
            None => log::info!(
                "Starting simulation over full dataset, skipping {} header rows",
                config.header_rows
            ),
        }

        if let Err(err) = config.validate() {
            return self.run(std::iter::once(Err(err)));
        }
        self.run(csv_windows(reader, config))
    }
}
