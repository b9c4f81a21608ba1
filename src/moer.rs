use crate::error::SimulationError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Offset-aware layouts accepted besides RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Layouts without an offset. These are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A single grid emissions sample (Marginal Operating Emissions Rate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoerRecord {
    /// Sample time, normalized to UTC
    pub timestamp: DateTime<Utc>,
    /// Emissions rate in lb CO2 per MWh
    pub moer: i64,
}

impl MoerRecord {
    /// Creates a new MoerRecord.
    pub fn new(timestamp: DateTime<Utc>, moer: i64) -> Self {
        MoerRecord { timestamp, moer }
    }
}

/// Errors produced while turning a raw row into a [`MoerRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoerParseError {
    /// A required field was absent or blank
    MissingField(&'static str),
    /// The timestamp is not ISO-8601
    InvalidTimestamp(String),
    /// The emissions value is not an integer
    InvalidMoer(String),
}

impl std::fmt::Display for MoerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoerParseError::MissingField(field) => write!(f, "Missing field: {}", field),
            MoerParseError::InvalidTimestamp(value) => write!(f, "Invalid timestamp: '{}'", value),
            MoerParseError::InvalidMoer(value) => write!(f, "Invalid MOER value: '{}'", value),
        }
    }
}

impl std::error::Error for MoerParseError {}

/// Parses an ISO-8601 timestamp with any UTC offset and normalizes it to UTC.
///
/// Both `T` and a space are accepted as the date/time separator. A timestamp
/// without an offset is interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MoerParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MoerParseError::MissingField("timestamp"));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(MoerParseError::InvalidTimestamp(value.to_string()))
}

/// Factory for [`MoerRecord`]: validates both fields of a raw row.
///
/// # Errors
/// Returns `MoerParseError` when either field is missing or malformed. Callers
/// treat this as fatal for the run.
pub fn parse_moer_record(timestamp: &str, moer: &str) -> Result<MoerRecord, MoerParseError> {
    let timestamp = parse_timestamp(timestamp)?;

    let moer = moer.trim();
    if moer.is_empty() {
        return Err(MoerParseError::MissingField("moer"));
    }
    let moer = moer
        .parse::<i64>()
        .map_err(|_| MoerParseError::InvalidMoer(moer.to_string()))?;

    Ok(MoerRecord::new(timestamp, moer))
}

/// An unparsed input row as delivered by the acquisition layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMoerRow {
    pub timestamp: String,
    pub moer: String,
}

impl RawMoerRow {
    pub fn new(timestamp: impl Into<String>, moer: impl Into<String>) -> Self {
        RawMoerRow {
            timestamp: timestamp.into(),
            moer: moer.into(),
        }
    }

    /// Takes the first two fields of a CSV record. Missing fields become empty
    /// strings and are rejected later by [`RawMoerRow::parse`].
    pub fn from_record(record: &csv::StringRecord) -> Self {
        RawMoerRow {
            timestamp: record.get(0).unwrap_or_default().to_string(),
            moer: record.get(1).unwrap_or_default().to_string(),
        }
    }

    pub fn parse(&self) -> Result<MoerRecord, MoerParseError> {
        parse_moer_record(&self.timestamp, &self.moer)
    }
}

/// Time range used to filter samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: DateTime<Utc>,
    /// End time (inclusive)
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a new TimeRange.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeRange { start, end }
    }

    /// Returns true when `timestamp` lies within the range, bounds included.
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.start <= *timestamp && *timestamp <= self.end
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// # Errors
    /// Returns `InvalidTimeRange` when `start` is after `end`.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SimulationError::InvalidTimeRange)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_separated_utc_offset() {
        let record = parse_moer_record("2019-03-01 08:00:00+00:00", "1021").unwrap();
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2019, 3, 1, 8, 0, 0).unwrap());
        assert_eq!(record.moer, 1021);
    }

    #[test]
    fn test_parse_normalizes_foreign_offset_to_utc() {
        let record = parse_moer_record("2019-03-01T03:00:00-05:00", "950").unwrap();
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2019, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_zulu_and_naive_timestamps() {
        let expected = Utc.with_ymd_and_hms(2019, 3, 1, 8, 5, 0).unwrap();
        assert_eq!(parse_timestamp("2019-03-01T08:05:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2019-03-01 08:05:00").unwrap(), expected);
        assert_eq!(parse_timestamp("  2019-03-01T08:05:00  ").unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_malformed_timestamp() {
        let err = parse_moer_record("yesterday", "100").unwrap_err();
        assert_eq!(err, MoerParseError::InvalidTimestamp("yesterday".to_string()));
    }

    #[test]
    fn test_parse_rejects_non_integer_moer() {
        let err = parse_moer_record("2019-03-01 08:00:00+00:00", "12.5").unwrap_err();
        assert_eq!(err, MoerParseError::InvalidMoer("12.5".to_string()));
    }

    #[test]
    fn test_parse_reports_missing_fields() {
        let row = RawMoerRow::from_record(&csv::StringRecord::from(vec!["2019-03-01 08:00:00+00:00"]));
        assert_eq!(row.parse().unwrap_err(), MoerParseError::MissingField("moer"));
        assert_eq!(
            parse_moer_record("", "10").unwrap_err(),
            MoerParseError::MissingField("timestamp")
        );
    }

    #[test]
    fn test_time_range_is_inclusive_on_both_ends() {
        let start = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2019, 3, 1, 1, 0, 0).unwrap();
        let range = TimeRange::new(start, end);

        assert!(range.contains(&start));
        assert!(range.contains(&end));
        assert!(!range.contains(&(start - chrono::Duration::seconds(1))));
        assert!(!range.contains(&(end + chrono::Duration::seconds(1))));
        assert!(range.is_valid());
        assert!(!TimeRange::new(end, start).is_valid());
    }

    #[test]
    fn test_time_range_validate() {
        let start = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2019, 4, 1, 0, 0, 0).unwrap();

        assert_eq!(TimeRange::new(start, end).validate(), Ok(()));
        assert_eq!(TimeRange::new(start, start).validate(), Ok(()));
        assert_eq!(
            TimeRange::new(end, start).validate(),
            Err(SimulationError::InvalidTimeRange)
        );
    }

    #[test]
    fn test_moer_parse_error_display() {
        let err = MoerParseError::InvalidMoer("abc".to_string());
        assert_eq!(err.to_string(), "Invalid MOER value: 'abc'");
    }
}
