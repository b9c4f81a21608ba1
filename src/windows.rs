//! Hour-sized windows over a MOER sample stream.
//!
//! `MoerWindows` pulls raw rows on demand and groups the parsed records into
//! fixed-size windows that the control loop consumes one at a time. The
//! iterator is single-pass: re-reading the source requires building a new one.

use crate::error::SimulationError;
use crate::moer::{MoerRecord, RawMoerRow, TimeRange};
use crate::refrigerator::EVENTS_PER_HOUR;
use std::io::Read;

/// Settings for window generation.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Records per complete window (default: 12, one hour of 5-minute samples)
    pub window_size: usize,
    /// Leading rows skipped without parsing
    pub header_rows: usize,
    /// Optional inclusive filter on record timestamps
    pub time_range: Option<TimeRange>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            window_size: EVENTS_PER_HOUR as usize,
            header_rows: 0,
            time_range: None,
        }
    }
}

impl WindowConfig {
    pub fn new(header_rows: usize, time_range: Option<TimeRange>) -> Self {
        WindowConfig {
            header_rows,
            time_range,
            ..Default::default()
        }
    }

    /// Overrides the window size. Sizes below one are raised to one.
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.window_size == 0 {
            return Err(SimulationError::InvalidConfig(
                "window size must be at least 1".to_string(),
            ));
        }
        match &self.time_range {
            Some(range) => range.validate(),
            None => Ok(()),
        }
    }

    fn accepts(&self, record: &MoerRecord) -> bool {
        match &self.time_range {
            None => true,
            Some(range) => range.contains(&record.timestamp),
        }
    }
}

/// Lazy window generator over a stream of raw rows.
///
/// A full window is only emitted when the next row arrives (or the stream
/// ends). That row starts the new window if it passes the time filter and is
/// dropped otherwise. After the stream is exhausted the remaining buffer is
/// emitted once, even when empty.
///
/// The first error (malformed row or failing source) is yielded once and the
/// iterator is finished afterwards.
pub struct MoerWindows<I> {
    rows: I,
    config: WindowConfig,
    buffer: Vec<MoerRecord>,
    rows_read: usize,
    headers_skipped: bool,
    finished: bool,
}

impl<I> MoerWindows<I>
where
    I: Iterator<Item = Result<RawMoerRow, SimulationError>>,
{
    pub fn new(rows: I, config: WindowConfig) -> Self {
        let capacity = config.window_size;
        MoerWindows {
            rows,
            config,
            buffer: Vec::with_capacity(capacity),
            rows_read: 0,
            headers_skipped: false,
            finished: false,
        }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    fn skip_headers(&mut self) {
        self.headers_skipped = true;
        for _ in 0..self.config.header_rows {
            if self.rows.next().is_none() {
                break;
            }
            self.rows_read += 1;
        }
    }

    fn take_buffer(&mut self) -> Vec<MoerRecord> {
        let window = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.config.window_size));
        if let Some(first) = window.first() {
            log::debug!("Emitting window of {} MOERs starting {}", window.len(), first.timestamp);
        } else {
            log::debug!("Emitting empty window");
        }
        window
    }

    fn fail(&mut self, err: SimulationError) -> Option<Result<Vec<MoerRecord>, SimulationError>> {
        log::error!("Window generation stopped: {}", err);
        self.finished = true;
        Some(Err(err))
    }
}

impl<I> Iterator for MoerWindows<I>
where
    I: Iterator<Item = Result<RawMoerRow, SimulationError>>,
{
    type Item = Result<Vec<MoerRecord>, SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.headers_skipped {
            self.skip_headers();
        }

        while let Some(row) = self.rows.next() {
            self.rows_read += 1;
            let record = match row {
                Ok(raw) => match raw.parse() {
                    Ok(record) => record,
                    Err(source) => {
                        let row = self.rows_read;
                        return self.fail(SimulationError::Parse { row, source });
                    }
                },
                Err(err) => return self.fail(err),
            };

            if self.buffer.len() >= self.config.window_size {
                let window = self.take_buffer();
                if self.config.accepts(&record) {
                    self.buffer.push(record);
                }
                return Some(Ok(window));
            }

            if self.config.accepts(&record) {
                self.buffer.push(record);
            }
        }

        self.finished = true;
        Some(Ok(self.take_buffer()))
    }
}

/// Builds a window generator over CSV text with `timestamp,moer` rows.
///
/// The CSV layer does no header handling; `config.header_rows` decides how
/// many leading rows are skipped.
pub fn csv_windows<R: Read>(
    reader: R,
    config: WindowConfig,
) -> MoerWindows<impl Iterator<Item = Result<RawMoerRow, SimulationError>>> {
    let rows = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .into_records()
        .map(|record| {
            record
                .map(|record| RawMoerRow::from_record(&record))
                .map_err(SimulationError::from)
        });

    MoerWindows::new(rows, config)
}
