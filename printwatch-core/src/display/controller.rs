//! Display mode controller
//!
//! Owns the [`DisplayMode`] state machine. All transitions go through here:
//! applying the configured selector, stepping the printer rotation, and
//! correcting the state after the roster changes underneath it.

use super::mode::{DisplayMode, DisplaySelector, RenderTarget};
use crate::config::{ConfigSnapshot, PrinterRoster};

/// Display state machine
#[derive(Debug, Clone)]
pub struct DisplayModeController {
    mode: DisplayMode,
}

impl Default for DisplayModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayModeController {
    /// Create a controller showing weather
    pub fn new() -> Self {
        Self {
            mode: DisplayMode::Weather,
        }
    }

    /// Create a controller restored from the boot configuration
    pub fn from_config(config: &ConfigSnapshot) -> Self {
        let mut controller = Self::new();
        controller.apply_config(config.display_selector(), &config.printers);
        controller
    }

    /// Current state
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Check if the rotation is active
    pub fn is_cycling(&self) -> bool {
        self.mode.is_cycling()
    }

    /// What is on screen right now
    pub fn current_render_target(&self) -> RenderTarget {
        self.mode.render_target()
    }

    /// Re-evaluate the state from the configured selector
    ///
    /// A printer selector naming an index outside the roster falls back to
    /// weather. Re-applying `Cycle` while already cycling keeps the current
    /// printer when it is still present and enabled.
    pub fn apply_config(&mut self, selector: DisplaySelector, roster: &PrinterRoster) -> RenderTarget {
        self.mode = match selector {
            DisplaySelector::Weather => DisplayMode::Weather,
            DisplaySelector::Printer(index) if index < roster.len() => {
                DisplayMode::FixedPrinter(index)
            }
            DisplaySelector::Printer(index) => {
                warn!(
                    "Display selector names printer {} but roster has {}, showing weather",
                    index + 1,
                    roster.len()
                );
                DisplayMode::Weather
            }
            DisplaySelector::Cycle => {
                let current = match self.mode {
                    DisplayMode::Cycling { current: Some(i) }
                        if roster.get(i).map(|p| p.enabled).unwrap_or(false) =>
                    {
                        Some(i)
                    }
                    _ => roster.next_enabled_after(None),
                };
                DisplayMode::Cycling { current }
            }
        };

        debug!("Display mode applied: {:?}", self.mode);
        self.current_render_target()
    }

    /// Step the rotation
    ///
    /// Moves to the next enabled printer after the current one. Past the last
    /// enabled printer the rotation shows weather (`current = None`), and the
    /// step after that starts again from the first enabled printer. With no
    /// enabled printers the rotation stays on weather.
    ///
    /// Returns `None` when not cycling.
    pub fn advance_cycle(&mut self, roster: &PrinterRoster) -> Option<RenderTarget> {
        let DisplayMode::Cycling { current } = self.mode else {
            return None;
        };

        let next = match current {
            Some(index) => roster.next_enabled_after(Some(index)),
            None => roster.next_enabled_after(None),
        };

        self.mode = DisplayMode::Cycling { current: next };
        Some(self.current_render_target())
    }

    /// Dwell time for the current rotation leg
    ///
    /// Printers and the weather leg use separate timers.
    pub fn cycle_dwell_ms(&self, config: &ConfigSnapshot) -> Option<u32> {
        match self.mode {
            DisplayMode::Cycling { current: Some(_) } => Some(config.display_cycle_interval_ms),
            DisplayMode::Cycling { current: None } => Some(config.cycle_weather_dwell_ms),
            _ => None,
        }
    }

    /// Correct the state after the printer at `index` was deleted
    ///
    /// `roster` is the roster after the deletion. A deleted fixed selection
    /// falls back to weather; selections after the deleted entry follow
    /// their printer down one slot.
    pub fn on_printer_deleted(
        &mut self,
        index: usize,
        was_current_selection: bool,
        roster: &PrinterRoster,
    ) {
        self.mode = match self.mode {
            DisplayMode::FixedPrinter(k) if was_current_selection || k == index => {
                info!("Displayed printer {} deleted, showing weather", index);
                DisplayMode::Weather
            }
            DisplayMode::FixedPrinter(k) if k > index => DisplayMode::FixedPrinter(k - 1),
            DisplayMode::Cycling { current: Some(c) } if c == index => DisplayMode::Cycling {
                // Whatever slid into the deleted slot is next in line
                current: roster.next_enabled_after(c.checked_sub(1)),
            },
            DisplayMode::Cycling { current: Some(c) } if c > index => {
                DisplayMode::Cycling { current: Some(c - 1) }
            }
            mode => mode,
        };
    }
}
