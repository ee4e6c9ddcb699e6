//! Printer roster
//!
//! Ordered, fixed-capacity list of printer hosts. A printer's identity is
//! its position: indices are 0-based and always contiguous, so deleting an
//! entry renumbers everything after it.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::types::{PrinterConfig, MAX_PRINTERS};

/// Roster operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RosterError {
    /// Index is outside the current roster
    NotFound,
    /// Roster already holds [`MAX_PRINTERS`] entries
    CapacityExceeded,
}

/// Ordered collection of configured printers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterRoster {
    printers: Vec<PrinterConfig, MAX_PRINTERS>,
}

impl PrinterRoster {
    /// Create an empty roster
    pub const fn new() -> Self {
        Self {
            printers: Vec::new(),
        }
    }

    /// Append a printer, returning its index
    pub fn add(&mut self, config: PrinterConfig) -> Result<usize, RosterError> {
        self.printers
            .push(config)
            .map_err(|_| RosterError::CapacityExceeded)?;
        Ok(self.printers.len() - 1)
    }

    /// Overwrite the printer at `index`, keeping its position
    pub fn edit(&mut self, index: usize, config: PrinterConfig) -> Result<(), RosterError> {
        let slot = self.printers.get_mut(index).ok_or(RosterError::NotFound)?;
        *slot = config;
        Ok(())
    }

    /// Remove the printer at `index`
    ///
    /// Entries after `index` move down by one.
    pub fn delete(&mut self, index: usize) -> Result<PrinterConfig, RosterError> {
        if index >= self.printers.len() {
            return Err(RosterError::NotFound);
        }
        Ok(self.printers.remove(index))
    }

    /// Printer at `index`
    pub fn get(&self, index: usize) -> Result<&PrinterConfig, RosterError> {
        self.printers.get(index).ok_or(RosterError::NotFound)
    }

    /// All printers in order
    pub fn all(&self) -> &[PrinterConfig] {
        &self.printers
    }

    pub fn len(&self) -> usize {
        self.printers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.printers.is_full()
    }

    /// Number of printers with polling enabled
    pub fn enabled_count(&self) -> usize {
        self.printers.iter().filter(|p| p.enabled).count()
    }

    /// First enabled printer strictly after `after` (from the start for `None`)
    ///
    /// Never wraps: returns `None` once the end of the roster is reached.
    pub fn next_enabled_after(&self, after: Option<usize>) -> Option<usize> {
        let start = after.map_or(0, |i| i + 1);
        self.printers
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, p)| p.enabled)
            .map(|(i, _)| i)
    }
}
