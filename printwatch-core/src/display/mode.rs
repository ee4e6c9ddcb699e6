//! Display mode types

use crate::config::{CYCLE_DISPLAY_SETTING, WEATHER_DISPLAY_SETTING};

/// What the operator picked in the web UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplaySelector {
    /// Weather page
    Weather,
    /// Rotate through enabled printers
    Cycle,
    /// One printer (0-based roster index)
    Printer(usize),
}

impl DisplaySelector {
    /// Decode the persisted selector value
    ///
    /// `0` is weather, `-1` is cycle and `N >= 1` is printer N (1-based).
    /// Other negative values are treated as weather.
    pub fn from_setting(value: i32) -> Self {
        match value {
            WEATHER_DISPLAY_SETTING => DisplaySelector::Weather,
            CYCLE_DISPLAY_SETTING => DisplaySelector::Cycle,
            n if n > 0 => DisplaySelector::Printer((n - 1) as usize),
            _ => DisplaySelector::Weather,
        }
    }

    /// Encode for persistence
    pub fn to_setting(self) -> i32 {
        match self {
            DisplaySelector::Weather => WEATHER_DISPLAY_SETTING,
            DisplaySelector::Cycle => CYCLE_DISPLAY_SETTING,
            DisplaySelector::Printer(index) => index as i32 + 1,
        }
    }
}

/// Display state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMode {
    /// Weather page only
    Weather,
    /// A single printer, regardless of the others
    FixedPrinter(usize),
    /// Rotation; `None` is the weather leg between rounds
    Cycling { current: Option<usize> },
}

impl DisplayMode {
    /// Check if this mode rotates
    pub fn is_cycling(&self) -> bool {
        matches!(self, DisplayMode::Cycling { .. })
    }

    /// What this mode puts on screen
    pub fn render_target(&self) -> RenderTarget {
        match *self {
            DisplayMode::Weather => RenderTarget::Weather,
            DisplayMode::FixedPrinter(index) => RenderTarget::Printer(index),
            DisplayMode::Cycling {
                current: Some(index),
            } => RenderTarget::Printer(index),
            DisplayMode::Cycling { current: None } => RenderTarget::Weather,
        }
    }
}

/// The single data source currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderTarget {
    Weather,
    Printer(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_decoding() {
        assert_eq!(DisplaySelector::from_setting(0), DisplaySelector::Weather);
        assert_eq!(DisplaySelector::from_setting(-1), DisplaySelector::Cycle);
        assert_eq!(DisplaySelector::from_setting(1), DisplaySelector::Printer(0));
        assert_eq!(DisplaySelector::from_setting(10), DisplaySelector::Printer(9));
        assert_eq!(DisplaySelector::from_setting(-7), DisplaySelector::Weather);
    }

    #[test]
    fn test_selector_encoding() {
        for value in [-1, 0, 1, 5] {
            assert_eq!(DisplaySelector::from_setting(value).to_setting(), value);
        }
    }

    #[test]
    fn test_render_targets() {
        assert_eq!(DisplayMode::Weather.render_target(), RenderTarget::Weather);
        assert_eq!(
            DisplayMode::FixedPrinter(2).render_target(),
            RenderTarget::Printer(2)
        );
        assert_eq!(
            DisplayMode::Cycling { current: None }.render_target(),
            RenderTarget::Weather
        );
        assert_eq!(
            DisplayMode::Cycling { current: Some(4) }.render_target(),
            RenderTarget::Printer(4)
        );
    }
}
