//! Printer state flags
//!
//! The printer host reports its state as a set of independent booleans.
//! They are kept as a typed bit set so multi-flag combinations survive and
//! the title precedence lives in one place.

use core::fmt::Write;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::config::MAX_NAME_LEN;

/// Longest title: name + " - " + longest state word
pub const MAX_TITLE_LEN: usize = MAX_NAME_LEN + 3 + 10;

/// One printer state flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PrinterFlag {
    Cancelling = 0,
    ClosedOrError = 1,
    Error = 2,
    Finishing = 3,
    Operational = 4,
    Paused = 5,
    Pausing = 6,
    Printing = 7,
    Ready = 8,
    Resuming = 9,
    SdReady = 10,
}

impl PrinterFlag {
    /// All flags in bit order
    pub const ALL: [PrinterFlag; 11] = [
        PrinterFlag::Cancelling,
        PrinterFlag::ClosedOrError,
        PrinterFlag::Error,
        PrinterFlag::Finishing,
        PrinterFlag::Operational,
        PrinterFlag::Paused,
        PrinterFlag::Pausing,
        PrinterFlag::Printing,
        PrinterFlag::Ready,
        PrinterFlag::Resuming,
        PrinterFlag::SdReady,
    ];

    /// Bit mask for this flag
    pub const fn mask(self) -> u16 {
        1 << self as u8
    }
}

/// Set of [`PrinterFlag`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterFlags(u16);

impl PrinterFlags {
    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build from raw bits, dropping unknown bits
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & 0x07FF)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Add a flag (builder style)
    pub const fn with(self, flag: PrinterFlag) -> Self {
        Self(self.0 | flag.mask())
    }

    pub fn insert(&mut self, flag: PrinterFlag) {
        self.0 |= flag.mask();
    }

    pub fn remove(&mut self, flag: PrinterFlag) {
        self.0 &= !flag.mask();
    }

    /// Set or clear a flag
    pub fn set(&mut self, flag: PrinterFlag, value: bool) {
        if value {
            self.insert(flag);
        } else {
            self.remove(flag);
        }
    }

    pub const fn contains(self, flag: PrinterFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Flags currently set, in bit order
    pub fn iter(self) -> impl Iterator<Item = PrinterFlag> {
        PrinterFlag::ALL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }

    /// Dominant state for title bars
    ///
    /// Error wins over everything, then the transitional states, then
    /// printing and finally ready. `None` when nothing relevant is set.
    pub fn title_state(self) -> Option<&'static str> {
        use PrinterFlag::*;

        if self.contains(ClosedOrError) || self.contains(Error) {
            Some("Error")
        } else if self.contains(Cancelling) {
            Some("Cancelling")
        } else if self.contains(Finishing) {
            Some("Finishing")
        } else if self.contains(Pausing) {
            Some("Pausing")
        } else if self.contains(Paused) {
            Some("Paused")
        } else if self.contains(Resuming) {
            Some("Resuming")
        } else if self.contains(Printing) {
            Some("Printing")
        } else if self.contains(Ready) {
            Some("Ready")
        } else {
            None
        }
    }
}

impl From<PrinterFlag> for PrinterFlags {
    fn from(flag: PrinterFlag) -> Self {
        Self::empty().with(flag)
    }
}

/// Title bar text for a printer
///
/// `"<name> - <State>"`, or just the name when no state applies. An empty
/// name is shown as `"Printer"`; over-long names are truncated.
pub fn print_title(name: &str, flags: PrinterFlags) -> String<MAX_TITLE_LEN> {
    let name = if name.is_empty() { "Printer" } else { name };

    let mut title = String::new();
    for c in name.chars() {
        if title.len() + c.len_utf8() > MAX_NAME_LEN || title.push(c).is_err() {
            break;
        }
    }

    if let Some(state) = flags.title_state() {
        // Capacity covers the longest state word
        let _ = write!(title, " - {}", state);
    }
    title
}
