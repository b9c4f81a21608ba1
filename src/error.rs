use crate::moer::MoerParseError;

/// Fatal conditions raised by the simulation core.
///
/// Nothing in the core recovers from these. They propagate to the run driver,
/// which keeps whatever history was recorded before the fault.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// An input row could not be parsed (1-based row number in the stream)
    Parse { row: usize, source: MoerParseError },
    /// The underlying CSV stream failed
    Csv(String),
    /// An average was requested for a window with no samples
    EmptyWindow,
    /// The appliance left its safe temperature band
    TemperatureExcursion { temperature: f64, min: f64, max: f64 },
    /// Filter range with start after end
    InvalidTimeRange,
    /// Rejected appliance or window configuration
    InvalidConfig(String),
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::Parse { row, source } => write!(f, "Malformed row {}: {}", row, source),
            SimulationError::Csv(msg) => write!(f, "CSV error: {}", msg),
            SimulationError::EmptyWindow => write!(f, "Window has no MOERs"),
            SimulationError::TemperatureExcursion { temperature, min, max } => write!(
                f,
                "Fridge exceeded min/max temp: {} outside [{}, {}]",
                temperature, min, max
            ),
            SimulationError::InvalidTimeRange => write!(f, "Invalid time range"),
            SimulationError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<csv::Error> for SimulationError {
    fn from(err: csv::Error) -> Self {
        SimulationError::Csv(err.to_string())
    }
}
