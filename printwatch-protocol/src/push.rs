//! Web UI push events.
//!
//! Every successful weather or printer poll is broadcast to the browsers
//! connected to the station's websocket as a small JSON document:
//!
//! ```text
//! {"type":"currentWeather","currentReadings":{"temp":..,"humidity":..,...}}
//! {"type":"monitorInfo","enabled":..,"validJobData":..,"validPrintData":..,"printState":".."}
//! ```

use alloc::string::String;
use serde::Serialize;

/// Push encoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushError {
    /// Serializer rejected the event
    Encode,
}

/// Weather readings carried by a `currentWeather` event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReadings<'a> {
    pub temp: f32,
    pub humidity: u8,
    pub wind_speed: f32,
    pub wind_direction: f32,
    pub description: &'a str,
    /// Observation time (epoch seconds)
    pub time: u32,
    pub metric: bool,
}

/// Printer summary carried by a `monitorInfo` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorInfo<'a> {
    pub enabled: bool,
    pub valid_job_data: bool,
    pub valid_print_data: bool,
    pub print_state: &'a str,
}

/// Event pushed to connected web clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PushEvent<'a> {
    #[serde(rename = "currentWeather")]
    CurrentWeather {
        #[serde(rename = "currentReadings")]
        current_readings: WeatherReadings<'a>,
    },
    #[serde(rename = "monitorInfo")]
    MonitorInfo(MonitorInfo<'a>),
}

impl PushEvent<'_> {
    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, PushError> {
        serde_json::to_string(self).map_err(|_| PushError::Encode)
    }
}
