//! Carbon-aware control loop.
//!
//! For every window the loop fixes a baseline (the window's mean MOER) before
//! making any decision, then steps the refrigerator once per sample and
//! records a snapshot after each step.

use crate::error::SimulationError;
use crate::moer::MoerRecord;
use crate::refrigerator::{Refrigerator, RefrigeratorConfig, RefrigeratorSnapshot, RefrigeratorStatus};
use serde::{Deserialize, Serialize};

/// Immutable record of the simulation state after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Sample that drove the tick
    pub moer: MoerRecord,
    /// Appliance state after the tick
    pub refrigerator: RefrigeratorSnapshot,
    /// Window baseline the decision was compared against
    pub average_moer: f64,
}

/// Arithmetic mean of the window's MOER values.
///
/// # Errors
/// Returns `EmptyWindow` when the window has no samples.
pub fn average_moer(window: &[MoerRecord]) -> Result<f64, SimulationError> {
    if window.is_empty() {
        return Err(SimulationError::EmptyWindow);
    }
    let sum: f64 = window.iter().map(|record| record.moer as f64).sum();
    Ok(sum / window.len() as f64)
}

/// Chooses the next status. Rules are checked in order and the first match
/// wins: near the top of the band run, near the bottom rest, otherwise run
/// only while the grid is cleaner than the window average.
pub fn decide_status(
    temperature: f64,
    moer: i64,
    average_moer: f64,
    config: &RefrigeratorConfig,
) -> RefrigeratorStatus {
    if temperature >= config.max_temp - 1.0 {
        RefrigeratorStatus::On
    } else if temperature <= config.min_temp + 1.0 {
        RefrigeratorStatus::Off
    } else if (moer as f64) < average_moer {
        RefrigeratorStatus::On
    } else {
        RefrigeratorStatus::Off
    }
}

/// Owns the single refrigerator for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct Environment {
    moer: Option<MoerRecord>,
    refrigerator: Refrigerator,
}

impl Environment {
    pub fn new(refrigerator: Refrigerator) -> Self {
        Environment {
            moer: None,
            refrigerator,
        }
    }

    /// The sample processed by the most recent tick.
    pub fn current_moer(&self) -> Option<&MoerRecord> {
        self.moer.as_ref()
    }

    pub fn refrigerator(&self) -> &Refrigerator {
        &self.refrigerator
    }

    /// Runs every sample of `window` through the refrigerator, appending one
    /// snapshot per tick to `history`.
    ///
    /// # Arguments
    /// * `window` - Samples in chronological order; the baseline is their mean
    /// * `history` - Log that receives one snapshot per completed tick
    ///
    /// # Errors
    /// An empty window is a no-op. A temperature excursion aborts the window
    /// immediately with `TemperatureExcursion`; snapshots from earlier ticks
    /// stay in `history`.
    pub fn run_window(
        &mut self,
        window: &[MoerRecord],
        history: &mut Vec<EnvironmentSnapshot>,
    ) -> Result<(), SimulationError> {
        if window.is_empty() {
            return Ok(());
        }

        let baseline = average_moer(window)?;
        log::trace!("Window baseline {:.2} over {} MOERs", baseline, window.len());

        for record in window {
            self.moer = Some(record.clone());

            let status = decide_status(
                self.refrigerator.temperature(),
                record.moer,
                baseline,
                self.refrigerator.config(),
            );
            self.refrigerator.set_state(status);
            self.refrigerator.tick(record.moer)?;

            history.push(EnvironmentSnapshot {
                moer: record.clone(),
                refrigerator: self.refrigerator.snapshot(),
                average_moer: baseline,
            });
        }

        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new(Refrigerator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn window(moers: &[i64]) -> Vec<MoerRecord> {
        let base = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        moers
            .iter()
            .enumerate()
            .map(|(i, moer)| MoerRecord::new(base + Duration::minutes(5 * i as i64), *moer))
            .collect()
    }

    fn environment_at(temperature: f64) -> Environment {
        let fridge = Refrigerator::with_state(
            RefrigeratorConfig::default(),
            temperature,
            RefrigeratorStatus::Off,
        )
        .unwrap();
        Environment::new(fridge)
    }

    #[test]
    fn test_average_moer() {
        assert_eq!(average_moer(&window(&[100, 50, 90])).unwrap(), 80.0);
        assert_eq!(average_moer(&[]), Err(SimulationError::EmptyWindow));
    }

    #[test]
    fn test_thermal_safety_overrides_emissions() {
        let config = RefrigeratorConfig::default();
        // Dirty grid but too warm: must run.
        assert_eq!(decide_status(42.0, 1000, 10.0, &config), RefrigeratorStatus::On);
        assert_eq!(decide_status(43.0, 1000, 10.0, &config), RefrigeratorStatus::On);
        // Clean grid but too cold: must rest.
        assert_eq!(decide_status(34.0, 1, 500.0, &config), RefrigeratorStatus::Off);
        assert_eq!(decide_status(33.0, 1, 500.0, &config), RefrigeratorStatus::Off);
    }

    #[test]
    fn test_emissions_preference_inside_band() {
        let config = RefrigeratorConfig::default();
        assert_eq!(decide_status(38.0, 74, 75.0, &config), RefrigeratorStatus::On);
        assert_eq!(decide_status(38.0, 75, 75.0, &config), RefrigeratorStatus::Off);
        assert_eq!(decide_status(38.0, 76, 75.0, &config), RefrigeratorStatus::Off);
    }

    #[test]
    fn test_empty_window_is_noop() {
        let mut env = Environment::default();
        let mut history = Vec::new();
        env.run_window(&[], &mut history).unwrap();
        assert!(history.is_empty());
        assert!(env.current_moer().is_none());
    }

    #[test]
    fn test_alternating_window_scenario() {
        let moers = [100, 50, 100, 50, 100, 50, 100, 50, 100, 50, 100, 50];
        let mut env = environment_at(38.0);
        let mut history = Vec::new();
        env.run_window(&window(&moers), &mut history).unwrap();

        assert_eq!(history.len(), 12);

        let temps: Vec<f64> = history.iter().map(|s| s.refrigerator.temperature).collect();
        assert_eq!(
            temps,
            vec![39.0, 37.0, 38.0, 36.0, 37.0, 35.0, 36.0, 34.0, 35.0, 33.0, 34.0, 35.0]
        );

        let mut previous = 38.0;
        let mut on_ticks = 0;
        for snapshot in &history {
            let delta = snapshot.refrigerator.temperature - previous;
            match snapshot.refrigerator.status {
                RefrigeratorStatus::On => {
                    on_ticks += 1;
                    assert_eq!(delta, -2.0);
                    assert!(snapshot.moer.moer < 75);
                }
                RefrigeratorStatus::Off => assert_eq!(delta, 1.0),
            }
            previous = snapshot.refrigerator.temperature;
        }

        // The final clean sample arrives at 34 degrees and is forced off.
        assert_eq!(on_ticks, 5);
        let last = history.last().unwrap().refrigerator;
        assert_eq!(last.total_run_time, 5.0 * on_ticks as f64);
        assert!((last.total_lb_co2 - 5.0 * 50.0 * 0.0002 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_baseline_fixed_within_window_and_refreshed_per_window() {
        let mut env = environment_at(38.0);
        let mut history = Vec::new();
        env.run_window(&window(&[10, 20, 30, 40]), &mut history).unwrap();
        env.run_window(&window(&[100, 200]), &mut history).unwrap();

        assert!(history[..4].iter().all(|s| s.average_moer == 25.0));
        assert!(history[4..].iter().all(|s| s.average_moer == 150.0));
    }

    #[test]
    fn test_accumulators_only_move_while_on() {
        let mut env = Environment::default();
        let mut history = Vec::new();
        let moers: Vec<i64> = (0..48).map(|i| 200 + (i * 37) % 300).collect();
        for chunk in moers.chunks(12) {
            env.run_window(&window(chunk), &mut history).unwrap();
        }

        let mut previous = RefrigeratorSnapshot {
            temperature: 33.0,
            status: RefrigeratorStatus::Off,
            total_lb_co2: 0.0,
            total_run_time: 0.0,
        };
        for snapshot in &history {
            let current = snapshot.refrigerator;
            assert!((33.0..=43.0).contains(&current.temperature));
            match current.status {
                RefrigeratorStatus::On => {
                    assert!(current.total_lb_co2 > previous.total_lb_co2);
                    assert!(current.total_run_time > previous.total_run_time);
                }
                RefrigeratorStatus::Off => {
                    assert_eq!(current.total_lb_co2, previous.total_lb_co2);
                    assert_eq!(current.total_run_time, previous.total_run_time);
                }
            }
            previous = current;
        }
    }

    #[test]
    fn test_snapshots_are_independent_of_later_ticks() {
        let mut env = environment_at(38.0);
        let mut history = Vec::new();
        env.run_window(&window(&[100, 50]), &mut history).unwrap();
        let recorded = history[0].clone();

        env.run_window(&window(&[10, 900, 10]), &mut history).unwrap();

        assert_eq!(history[0], recorded);
        assert_eq!(history[0].refrigerator.temperature, 39.0);
        assert_eq!(env.current_moer().map(|m| m.moer), Some(10));
    }

    #[test]
    fn test_excursion_aborts_window_and_keeps_prior_history() {
        // A configuration whose cooling step overshoots the band on the first
        // clean sample, exercising the failure path through the loop.
        let config = RefrigeratorConfig {
            cooling_degrees: 40.0,
            ..Default::default()
        };
        let fridge = Refrigerator::with_state(config, 38.0, RefrigeratorStatus::Off).unwrap();
        let mut env = Environment::new(fridge);
        let mut history = Vec::new();

        let err = env.run_window(&window(&[100, 50, 100]), &mut history).unwrap_err();
        assert!(matches!(err, SimulationError::TemperatureExcursion { .. }));
        assert_eq!(history.len(), 1);
    }
}
