//! Data source traits
//!
//! HTTP transport and JSON decoding of the weather and printer APIs live
//! behind these traits; the core only sees decoded values.

use crate::config::PrinterConfig;
use crate::status::{JobStatus, PrinterState, WeatherData};

/// Errors from a data source poll
///
/// Both kinds are handled the same way: the record is marked invalid and
/// the next scheduled poll tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// Connection failed, timed out or returned a non-success status
    Transport,
    /// Payload was malformed or incomplete
    Decode,
}

/// Current weather API
pub trait WeatherSource {
    /// Fetch current conditions for a location
    ///
    /// - `api_key`: API key from the settings page
    /// - `location_id`: City id
    /// - `metric`: Request metric units
    fn fetch(
        &mut self,
        api_key: &str,
        location_id: &str,
        metric: bool,
    ) -> Result<WeatherData, SourceError>;
}

/// Printer host API
///
/// Job and printer state are separate endpoints; one may fail while the
/// other succeeds.
pub trait PrinterSource {
    /// Fetch the current job
    fn fetch_job(&mut self, printer: &PrinterConfig) -> Result<JobStatus, SourceError>;

    /// Fetch temperatures and state flags
    fn fetch_state(&mut self, printer: &PrinterConfig) -> Result<PrinterState, SourceError>;
}
