use crate::error::SimulationError;
use serde::{Deserialize, Serialize};

/// MOER samples per hour (one every 5 minutes).
pub const EVENTS_PER_HOUR: u32 = 12;
/// Lowest safe temperature.
pub const MIN_TEMP: f64 = 33.0;
/// Highest safe temperature.
pub const MAX_TEMP: f64 = 43.0;
/// Constant draw while running, in watts.
pub const POWER_USAGE_W: f64 = 200.0;

/// On/off status of the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefrigeratorStatus {
    Off,
    On,
}

impl RefrigeratorStatus {
    /// Numeric value used when charting (off = 0, on = 1).
    pub fn as_value(&self) -> u8 {
        match self {
            RefrigeratorStatus::Off => 0,
            RefrigeratorStatus::On => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefrigeratorStatus::Off => "off",
            RefrigeratorStatus::On => "on",
        }
    }
}

impl std::fmt::Display for RefrigeratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical and safety parameters of the appliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefrigeratorConfig {
    /// Lower bound of the safe band (inclusive)
    pub min_temp: f64,
    /// Upper bound of the safe band (inclusive)
    pub max_temp: f64,
    /// Temperature at the start of a run
    pub initial_temp: f64,
    /// Power draw while on, in watts
    pub power_w: f64,
    /// Ticks per hour; one tick lasts `60 / events_per_hour` minutes
    pub events_per_hour: u32,
    /// Warming per tick while off is `warming_degrees / timescale`
    pub warming_degrees: f64,
    /// Cooling per tick while on is `cooling_degrees / timescale`
    pub cooling_degrees: f64,
}

impl Default for RefrigeratorConfig {
    fn default() -> Self {
        RefrigeratorConfig {
            min_temp: MIN_TEMP,
            max_temp: MAX_TEMP,
            initial_temp: MIN_TEMP,
            power_w: POWER_USAGE_W,
            events_per_hour: EVENTS_PER_HOUR,
            warming_degrees: 5.0,
            cooling_degrees: 10.0,
        }
    }
}

impl RefrigeratorConfig {
    /// Minutes covered by a single tick.
    pub fn timescale(&self) -> f64 {
        60.0 / self.events_per_hour as f64
    }

    /// Power draw in megawatts, matching the lb/MWh emissions unit.
    pub fn power_mw(&self) -> f64 {
        self.power_w / 1000.0 / 1000.0
    }

    pub fn in_band(&self, temperature: f64) -> bool {
        self.min_temp <= temperature && temperature <= self.max_temp
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.events_per_hour == 0 {
            return Err(SimulationError::InvalidConfig(
                "events_per_hour must be positive".to_string(),
            ));
        }
        if !(self.min_temp < self.max_temp) {
            return Err(SimulationError::InvalidConfig(format!(
                "min_temp {} must be below max_temp {}",
                self.min_temp, self.max_temp
            )));
        }
        if !self.in_band(self.initial_temp) {
            return Err(SimulationError::InvalidConfig(format!(
                "initial_temp {} outside [{}, {}]",
                self.initial_temp, self.min_temp, self.max_temp
            )));
        }
        if !(self.power_w >= 0.0) {
            return Err(SimulationError::InvalidConfig(
                "power_w must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time copy of the appliance state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefrigeratorSnapshot {
    pub temperature: f64,
    pub status: RefrigeratorStatus,
    pub total_lb_co2: f64,
    /// Minutes
    pub total_run_time: f64,
}

/// Thermostatic appliance with cumulative emissions and runtime counters.
#[derive(Debug, Clone)]
pub struct Refrigerator {
    config: RefrigeratorConfig,
    temperature: f64,
    status: RefrigeratorStatus,
    total_lb_co2: f64,
    total_run_time: f64,
}

impl Refrigerator {
    /// Creates an appliance at `config.initial_temp`, switched off.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration is inconsistent.
    pub fn new(config: RefrigeratorConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Refrigerator {
            temperature: config.initial_temp,
            config,
            status: RefrigeratorStatus::Off,
            total_lb_co2: 0.0,
            total_run_time: 0.0,
        })
    }

    /// Creates an appliance in an arbitrary in-band state with zeroed counters.
    pub fn with_state(
        config: RefrigeratorConfig,
        temperature: f64,
        status: RefrigeratorStatus,
    ) -> Result<Self, SimulationError> {
        let mut refrigerator = Refrigerator::new(config)?;
        if !refrigerator.config.in_band(temperature) {
            return Err(refrigerator.excursion(temperature));
        }
        refrigerator.temperature = temperature;
        refrigerator.status = status;
        Ok(refrigerator)
    }

    pub fn config(&self) -> &RefrigeratorConfig {
        &self.config
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn status(&self) -> RefrigeratorStatus {
        self.status
    }

    pub fn total_lb_co2(&self) -> f64 {
        self.total_lb_co2
    }

    /// Total minutes spent switched on.
    pub fn total_run_time(&self) -> f64 {
        self.total_run_time
    }

    /// Switches the appliance on or off. Any transition is allowed.
    pub fn set_state(&mut self, status: RefrigeratorStatus) {
        self.status = status;
    }

    /// Advances the appliance by one tick at the given emissions rate.
    ///
    /// The temperature is integrated and bound-checked first, so an excursion
    /// aborts the tick before any emissions or runtime are added.
    pub fn tick(&mut self, moer: i64) -> Result<(), SimulationError> {
        self.update_temperature()?;
        self.update_total_lb_co2(moer);
        self.update_total_run_time();
        Ok(())
    }

    /// Warms while off, cools while on.
    pub fn update_temperature(&mut self) -> Result<(), SimulationError> {
        let timescale = self.config.timescale();
        match self.status {
            RefrigeratorStatus::Off => self.temperature += self.config.warming_degrees / timescale,
            RefrigeratorStatus::On => self.temperature -= self.config.cooling_degrees / timescale,
        }

        if !self.config.in_band(self.temperature) {
            let err = self.excursion(self.temperature);
            log::error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    /// lb = lb/MWh * MW * (tick hours), with the tick a fraction of an hour.
    pub fn update_total_lb_co2(&mut self, moer: i64) {
        if self.status == RefrigeratorStatus::On {
            self.total_lb_co2 += (moer as f64 * self.config.power_mw()) / self.config.timescale();
        }
    }

    pub fn update_total_run_time(&mut self) {
        if self.status == RefrigeratorStatus::On {
            self.total_run_time += self.config.timescale();
        }
    }

    pub fn snapshot(&self) -> RefrigeratorSnapshot {
        RefrigeratorSnapshot {
            temperature: self.temperature,
            status: self.status,
            total_lb_co2: self.total_lb_co2,
            total_run_time: self.total_run_time,
        }
    }

    fn excursion(&self, temperature: f64) -> SimulationError {
        SimulationError::TemperatureExcursion {
            temperature,
            min: self.config.min_temp,
            max: self.config.max_temp,
        }
    }
}

impl Default for Refrigerator {
    fn default() -> Self {
        let config = RefrigeratorConfig::default();
        Refrigerator {
            temperature: config.initial_temp,
            config,
            status: RefrigeratorStatus::Off,
            total_lb_co2: 0.0,
            total_run_time: 0.0,
        }
    }
}
