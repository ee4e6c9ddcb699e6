//! Display renderer trait

use crate::config::{ClockFormat, DateFormat};
use crate::status::{PrinterRecord, StatusRecord, WeatherData};

/// Pixel-level drawing of the station pages
///
/// The core decides what is shown and when; implementations decide how.
/// Records are passed whole so a renderer can tell "stale" (invalid with a
/// payload) from "no data" (invalid without one).
pub trait Renderer {
    /// Draw the clock and date
    ///
    /// `local_time_s` is `None` until network time is available.
    fn draw_time(&mut self, local_time_s: Option<u64>, clock: ClockFormat, date: DateFormat);

    /// Draw the weather page
    ///
    /// `enabled` is false when weather polling is switched off or not
    /// configured.
    fn draw_weather(&mut self, weather: &StatusRecord<WeatherData>, enabled: bool);

    /// Draw a printer page
    fn draw_printer(&mut self, title: &str, printer: &PrinterRecord, enabled: bool);

    /// Draw the WiFi signal indicator
    fn draw_wifi_strength(&mut self, rssi_dbm: i32);

    /// Set the backlight level (percent)
    fn set_brightness(&mut self, percent: u8);

    /// Select metric or imperial units
    fn set_metric(&mut self, metric: bool);

    /// Clear the screen and redraw static decorations
    fn restart(&mut self);
}
