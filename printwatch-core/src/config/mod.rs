//! Configuration
//!
//! Station settings and the printer roster, stored as postcard binary data
//! and changed only through [`ConfigChangeBroker`].

pub mod broker;
pub mod roster;
pub mod types;

pub use broker::{ConfigChangeBroker, ConfigError, ConfigEvent, MAX_CONFIG_SIZE};
pub use roster::{PrinterRoster, RosterError};
pub use types::*;
