//! Polled status and printer state flags

pub mod aggregator;
pub mod flags;

pub use aggregator::{
    JobStatus, PrinterPoll, PrinterRecord, PrinterState, StatusAggregator, StatusRecord,
    WeatherData,
};
pub use flags::{print_title, PrinterFlag, PrinterFlags, MAX_TITLE_LEN};
