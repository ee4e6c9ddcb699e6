//! Configuration type definitions
//!
//! These types represent the station configuration edited from the web UI.
//! The whole snapshot (settings plus printer roster) is stored as
//! postcard-serialized binary data under a single storage key.

use heapless::String;
use serde::{Deserialize, Serialize};

use super::roster::PrinterRoster;
use crate::display::DisplaySelector;

/// Current on-flash format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum number of configured printers
pub const MAX_PRINTERS: usize = 10;

/// Maximum API key length (weather and printer hosts)
pub const MAX_API_KEY_LEN: usize = 64;

/// Maximum weather location id length
pub const MAX_LOCATION_LEN: usize = 16;

/// Maximum printer host name / address length
pub const MAX_HOST_LEN: usize = 64;

/// Maximum username / password length
pub const MAX_CREDENTIAL_LEN: usize = 32;

/// Maximum printer display name length
pub const MAX_NAME_LEN: usize = 32;

/// Milliseconds per second
pub const SECONDS_MULT: u32 = 1000;

/// Milliseconds per minute
pub const MINUTES_MULT: u32 = 60 * SECONDS_MULT;

pub const DEFAULT_WEATHER_INTERVAL_MS: u32 = 10 * MINUTES_MULT;
pub const DEFAULT_PRINT_MONITOR_INTERVAL_MS: u32 = 30 * SECONDS_MULT;
pub const DEFAULT_DISPLAY_CYCLE_INTERVAL_MS: u32 = 30 * SECONDS_MULT;
pub const DEFAULT_CYCLE_WEATHER_DWELL_MS: u32 = 30 * SECONDS_MULT;
pub const DEFAULT_PRINTER_PORT: u16 = 80;

/// Selector value for the weather display
pub const WEATHER_DISPLAY_SETTING: i32 = 0;

/// Selector value for cycling through printers
pub const CYCLE_DISPLAY_SETTING: i32 = -1;

/// A text value did not fit its fixed-capacity field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldTooLong;

/// Copy a `&str` into a fixed-capacity string
pub fn text<const N: usize>(value: &str) -> Result<String<N>, FieldTooLong> {
    let mut out = String::new();
    out.push_str(value).map_err(|_| FieldTooLong)?;
    Ok(out)
}

/// Clock face format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockFormat {
    #[default]
    TwentyFourHour,
    AmPm,
}

/// Date ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateFormat {
    #[default]
    DayMonthYear,
    MonthDayYear,
}

/// One monitored printer host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterConfig {
    /// Host name or IP address
    pub address: String<MAX_HOST_LEN>,
    /// HTTP port
    pub port: u16,
    /// Basic-auth user (empty = no auth)
    pub username: String<MAX_CREDENTIAL_LEN>,
    /// Basic-auth password
    pub password: String<MAX_CREDENTIAL_LEN>,
    /// Printer host API key
    pub api_key: String<MAX_API_KEY_LEN>,
    /// Name shown in the title bar (empty = "Printer")
    pub display_name: String<MAX_NAME_LEN>,
    /// Polled and shown in rotation
    pub enabled: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: DEFAULT_PRINTER_PORT,
            username: String::new(),
            password: String::new(),
            api_key: String::new(),
            display_name: String::new(),
            enabled: true,
        }
    }
}

impl PrinterConfig {
    /// Build a printer entry from form values
    pub fn new(
        address: &str,
        port: u16,
        api_key: &str,
        display_name: &str,
    ) -> Result<Self, FieldTooLong> {
        Ok(Self {
            address: text(address)?,
            port,
            api_key: text(api_key)?,
            display_name: text(display_name)?,
            ..Default::default()
        })
    }

    /// Attach basic-auth credentials
    pub fn with_credentials(mut self, username: &str, password: &str) -> Result<Self, FieldTooLong> {
        self.username = text(username)?;
        self.password = text(password)?;
        Ok(self)
    }

    /// Name for title bars
    pub fn title_name(&self) -> &str {
        if self.display_name.is_empty() {
            "Printer"
        } else {
            self.display_name.as_str()
        }
    }
}

/// Complete station configuration
///
/// Tasks copy or borrow the active snapshot at the start of each run; all
/// writes go through [`super::ConfigChangeBroker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigSnapshot {
    /// Format version
    pub version: u8,
    pub open_weather_api_key: String<MAX_API_KEY_LEN>,
    pub open_weather_location_id: String<MAX_LOCATION_LEN>,
    pub weather_enabled: bool,
    /// Backlight level, percent (0-100)
    pub display_brightness: u8,
    /// Metric units for weather and temperatures
    pub display_metric: bool,
    pub current_weather_interval_ms: u32,
    pub print_monitor_interval_ms: u32,
    /// How long each printer stays on screen while cycling
    pub display_cycle_interval_ms: u32,
    /// How long weather stays on screen between printer rotations
    pub cycle_weather_dwell_ms: u32,
    pub utc_offset_seconds: i32,
    pub clock_format: ClockFormat,
    pub date_format: DateFormat,
    /// 0 = weather, -1 = cycle, N = printer N (1-based)
    pub current_display_selector: i32,
    pub printers: PrinterRoster,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            open_weather_api_key: String::new(),
            open_weather_location_id: String::new(),
            weather_enabled: true,
            display_brightness: 100,
            display_metric: true,
            current_weather_interval_ms: DEFAULT_WEATHER_INTERVAL_MS,
            print_monitor_interval_ms: DEFAULT_PRINT_MONITOR_INTERVAL_MS,
            display_cycle_interval_ms: DEFAULT_DISPLAY_CYCLE_INTERVAL_MS,
            cycle_weather_dwell_ms: DEFAULT_CYCLE_WEATHER_DWELL_MS,
            utc_offset_seconds: 0,
            clock_format: ClockFormat::TwentyFourHour,
            date_format: DateFormat::DayMonthYear,
            current_display_selector: WEATHER_DISPLAY_SETTING,
            printers: PrinterRoster::new(),
        }
    }
}

impl ConfigSnapshot {
    /// Weather polling has everything it needs
    pub fn weather_configured(&self) -> bool {
        !self.open_weather_api_key.is_empty() && !self.open_weather_location_id.is_empty()
    }

    /// Decoded display selector
    pub fn display_selector(&self) -> DisplaySelector {
        DisplaySelector::from_setting(self.current_display_selector)
    }
}
