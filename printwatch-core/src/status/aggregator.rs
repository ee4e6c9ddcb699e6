//! Latest polled status
//!
//! Holds the most recent weather and per-printer results. A failed poll
//! marks the record invalid but keeps the last payload, so renderers can
//! tell "stale" from "never received".

use heapless::{String, Vec};

use super::flags::{print_title, PrinterFlags, MAX_TITLE_LEN};
use crate::config::MAX_PRINTERS;
use crate::traits::SourceError;

/// Latest result from one data source
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusRecord<T> {
    /// Last payload received, kept across failures
    pub payload: Option<T>,
    /// The most recent poll succeeded
    pub valid: bool,
}

impl<T> Default for StatusRecord<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StatusRecord<T> {
    /// Record with no data
    pub const fn new() -> Self {
        Self {
            payload: None,
            valid: false,
        }
    }

    /// Fold in a poll result
    pub fn update(&mut self, result: Result<T, SourceError>) {
        match result {
            Ok(payload) => {
                self.payload = Some(payload);
                self.valid = true;
            }
            Err(_) => self.valid = false,
        }
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.payload = None;
        self.valid = false;
    }

    /// Payload only if the last poll succeeded
    pub fn current(&self) -> Option<&T> {
        if self.valid {
            self.payload.as_ref()
        } else {
            None
        }
    }

    /// Nothing was ever received
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

/// Current conditions from the weather API
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WeatherData {
    /// City name
    pub location: String<32>,
    /// Condition group ("Rain", "Clouds")
    pub main: String<16>,
    /// Human readable condition
    pub description: String<32>,
    /// Icon code
    pub icon: String<8>,
    pub temperature: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    /// hPa
    pub pressure: u16,
    /// Percent
    pub humidity: u8,
    pub wind_speed: f32,
    /// Degrees
    pub wind_direction: f32,
    /// Cloud cover percent, if reported
    pub clouds: Option<u8>,
    /// Rain volume over the last hour (mm), if reported
    pub rain_1h: Option<f32>,
    /// Rain volume over the last three hours (mm), if reported
    pub rain_3h: Option<f32>,
    /// Observation time (epoch seconds)
    pub observation_time: u32,
    pub sunrise: u32,
    pub sunset: u32,
    /// Location offset from UTC (seconds)
    pub timezone: i32,
}

impl WeatherData {
    /// Value reported for an absent optional reading
    pub const ABSENT: i16 = -1;

    /// Cloud cover with the absent sentinel applied
    pub fn clouds_reading(&self) -> i16 {
        self.clouds.map_or(Self::ABSENT, i16::from)
    }

    /// Rain volumes (1h, 3h) with the absent sentinel applied
    pub fn rain_readings(&self) -> (f32, f32) {
        let absent = f32::from(Self::ABSENT);
        (
            self.rain_1h.unwrap_or(absent),
            self.rain_3h.unwrap_or(absent),
        )
    }
}

/// Current job on a printer
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JobStatus {
    pub file_name: String<64>,
    pub estimated_print_time_s: u32,
    pub filament_length_mm: f32,
    pub percent_complete: f32,
    pub print_time_elapsed_s: u32,
    pub print_time_remaining_s: u32,
    /// A file is selected
    pub job_loaded: bool,
}

/// Printer hardware state
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterState {
    pub tool_temperature: f32,
    pub tool_target: f32,
    pub bed_temperature: f32,
    pub bed_target: f32,
    /// State text reported by the host ("Printing", "Operational")
    pub state_text: String<32>,
    pub flags: PrinterFlags,
}

/// One printer poll: job and state are fetched and validated separately
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterPoll {
    pub job: Result<JobStatus, SourceError>,
    pub state: Result<PrinterState, SourceError>,
}

/// Latest status of one printer
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterRecord {
    pub job: StatusRecord<JobStatus>,
    pub state: StatusRecord<PrinterState>,
}

impl PrinterRecord {
    pub const fn new() -> Self {
        Self {
            job: StatusRecord::new(),
            state: StatusRecord::new(),
        }
    }

    /// Printer job data is currently valid
    pub fn valid_job_data(&self) -> bool {
        self.job.valid
    }

    /// Printer state data is currently valid
    pub fn valid_print_data(&self) -> bool {
        self.state.valid
    }

    /// Flags from the last valid state poll
    pub fn flags(&self) -> PrinterFlags {
        self.state
            .current()
            .map(|s| s.flags)
            .unwrap_or_default()
    }

    /// State text from the last valid state poll
    pub fn state_text(&self) -> &str {
        self.state.current().map_or("", |s| s.state_text.as_str())
    }

    /// Title bar text
    pub fn title(&self, name: &str) -> String<MAX_TITLE_LEN> {
        print_title(name, self.flags())
    }
}

/// Latest status of every data source
#[derive(Debug, Clone, Default)]
pub struct StatusAggregator {
    weather: StatusRecord<WeatherData>,
    printers: Vec<PrinterRecord, MAX_PRINTERS>,
    empty: PrinterRecord,
}

impl StatusAggregator {
    pub const fn new() -> Self {
        Self {
            weather: StatusRecord::new(),
            printers: Vec::new(),
            empty: PrinterRecord::new(),
        }
    }

    /// Fold in a weather poll
    pub fn record_weather(&mut self, result: Result<WeatherData, SourceError>) {
        if let Err(e) = &result {
            debug!("Weather poll failed: {:?}", e);
        }
        self.weather.update(result);
    }

    /// Fold in a poll of the printer at `index`
    pub fn record_printer(&mut self, index: usize, poll: PrinterPoll) {
        if index >= MAX_PRINTERS {
            warn!("Ignoring status for printer {} beyond roster capacity", index);
            return;
        }

        while self.printers.len() <= index {
            // Bounded by the capacity check above
            let _ = self.printers.push(PrinterRecord::new());
        }

        if let Some(record) = self.printers.get_mut(index) {
            record.job.update(poll.job);
            record.state.update(poll.state);
        }
    }

    pub fn current_weather(&self) -> &StatusRecord<WeatherData> {
        &self.weather
    }

    /// Record for the printer at `index` (empty if never polled)
    pub fn printer(&self, index: usize) -> &PrinterRecord {
        self.printers.get(index).unwrap_or(&self.empty)
    }

    /// Drop the record of a deleted printer; later records move down
    pub fn on_printer_deleted(&mut self, index: usize) {
        if index < self.printers.len() {
            self.printers.remove(index);
        }
    }

    /// Forget the status of a printer whose settings changed
    pub fn reset_printer(&mut self, index: usize) {
        if let Some(record) = self.printers.get_mut(index) {
            *record = PrinterRecord::new();
        }
    }

    /// Forget every printer status
    pub fn clear_printers(&mut self) {
        self.printers.clear();
    }

    /// Forget the weather status
    pub fn reset_weather(&mut self) {
        self.weather.reset();
    }
}
