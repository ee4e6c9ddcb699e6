//! Configuration change broker
//!
//! Single write path for the station configuration. Web handlers mutate the
//! snapshot through the broker; the settings task drains it once per settle.
//!
//! ```text
//! web handler ──mutate──► working copy ──commit──► snapshot ──persist──► ConfigStore
//!                                                     │
//!                                             changed flag / events
//!                                                     │
//!                      SettingsChanged task ◄──drain──┘
//! ```

use heapless::Deque;
use printwatch_hal::{ConfigStore, StorageError, StorageKey};

use super::roster::RosterError;
use super::types::{
    text, ClockFormat, ConfigSnapshot, DateFormat, FieldTooLong, PrinterConfig, CONFIG_VERSION,
    MAX_PRINTERS,
};
use crate::display::DisplaySelector;

/// Maximum serialized config size (binary)
pub const MAX_CONFIG_SIZE: usize = 4096;

/// Pending structural events: one per roster slot plus a reset
const MAX_EVENTS: usize = MAX_PRINTERS + 1;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Roster operation rejected
    Roster(RosterError),
    /// Store operation failed
    Storage(StorageError),
    /// Text value does not fit its field
    FieldTooLong,
    /// Serialization failed
    Encode,
    /// Persisted data could not be decoded
    Decode,
}

impl From<RosterError> for ConfigError {
    fn from(e: RosterError) -> Self {
        ConfigError::Roster(e)
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}

impl From<FieldTooLong> for ConfigError {
    fn from(_: FieldTooLong) -> Self {
        ConfigError::FieldTooLong
    }
}

/// Structural changes the settings task must react to
///
/// These carry information a plain snapshot comparison cannot recover, such
/// as which roster slot disappeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigEvent {
    /// Printer at `index` was removed; later printers moved down one slot
    PrinterDeleted {
        index: usize,
        /// It was the fixed display selection
        was_selected: bool,
    },
    /// Printer at `index` was replaced; its cached status is stale
    PrinterEdited { index: usize },
    /// Every printer was removed at once
    RosterCleared,
}

/// Owns the active configuration and its backing store
pub struct ConfigChangeBroker<S: ConfigStore> {
    store: S,
    snapshot: ConfigSnapshot,
    changed: bool,
    events: Deque<ConfigEvent, MAX_EVENTS>,
}

impl<S: ConfigStore> ConfigChangeBroker<S> {
    /// Boot path: restore the persisted snapshot
    ///
    /// Missing, undecodable or outdated data falls back to factory defaults,
    /// which are written back so the next boot finds a valid record.
    pub fn load(store: S) -> Self {
        let mut broker = Self::with_snapshot(store, ConfigSnapshot::default());

        let restored = if broker.store.exists(StorageKey::Settings) {
            broker.read_persisted()
        } else {
            Err(ConfigError::Storage(StorageError::NotFound))
        };

        match restored {
            Ok(snapshot) => {
                info!(
                    "Configuration loaded: {} printers, selector {}",
                    snapshot.printers.len(),
                    snapshot.current_display_selector
                );
                broker.snapshot = snapshot;
            }
            Err(e) => {
                match e {
                    ConfigError::Storage(StorageError::NotFound) => {
                        info!("No stored configuration, using defaults")
                    }
                    e => warn!("Stored configuration unusable ({:?}), using defaults", e),
                }
                if let Err(e) = broker.persist() {
                    warn!("Failed to persist default configuration: {:?}", e);
                }
            }
        }

        broker
    }

    /// Wrap an existing snapshot without touching the store
    pub fn with_snapshot(store: S, snapshot: ConfigSnapshot) -> Self {
        Self {
            store,
            snapshot,
            changed: false,
            events: Deque::new(),
        }
    }

    fn read_persisted(&mut self) -> Result<ConfigSnapshot, ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self.store.read(StorageKey::Settings, &mut buffer)?;
        debug!("Read {} bytes of configuration", len);

        let snapshot: ConfigSnapshot =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Decode)?;

        if snapshot.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                snapshot.version,
                CONFIG_VERSION
            );
            return Err(ConfigError::Decode);
        }

        Ok(snapshot)
    }

    fn persist(&mut self) -> Result<(), ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let bytes =
            postcard::to_slice(&self.snapshot, &mut buffer).map_err(|_| ConfigError::Encode)?;
        self.store.write(StorageKey::Settings, bytes)?;
        debug!("Persisted {} bytes of configuration", bytes.len());
        Ok(())
    }

    /// Active snapshot
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check if a change is waiting to be drained
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Apply a change through a working copy
    ///
    /// When `f` fails nothing is committed. A result equal to the active
    /// snapshot is a no-op. Otherwise the copy becomes active, the changed
    /// flag is raised and the snapshot is persisted. A persistence failure
    /// is returned but the in-memory change stays committed.
    pub fn mutate<F>(&mut self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ConfigSnapshot) -> Result<(), ConfigError>,
    {
        if self.commit(f)? {
            self.persist()?;
        }
        Ok(())
    }

    /// Run `f` on a working copy and make it active if it differs
    fn commit<F>(&mut self, f: F) -> Result<bool, ConfigError>
    where
        F: FnOnce(&mut ConfigSnapshot) -> Result<(), ConfigError>,
    {
        let mut working = self.snapshot.clone();
        f(&mut working)?;

        if working == self.snapshot {
            return Ok(false);
        }

        self.snapshot = working;
        self.changed = true;
        Ok(true)
    }

    /// Take the snapshot if anything changed since the last drain
    pub fn drain_if_changed(&mut self) -> Option<ConfigSnapshot> {
        if !self.changed {
            return None;
        }
        self.changed = false;
        Some(self.snapshot.clone())
    }

    /// Pop the oldest pending event
    pub fn take_event(&mut self) -> Option<ConfigEvent> {
        self.events.pop_front()
    }

    /// Queue an event
    ///
    /// Index events only make sense as a complete sequence. On overflow the
    /// queue collapses into a single [`ConfigEvent::RosterCleared`] so
    /// consumers drop per-printer state instead of shifting it wrongly.
    fn push_event(&mut self, event: ConfigEvent) {
        let event = if self.events.is_full() {
            warn!("Config event queue full, collapsing to roster reset");
            self.events.clear();
            ConfigEvent::RosterCleared
        } else {
            event
        };
        // Cannot fail after making room
        let _ = self.events.push_back(event);
    }

    /// Restore factory settings, printers included
    ///
    /// Wipes the store before writing the defaults back.
    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        info!("Resetting configuration to defaults");
        let had_printers = !self.snapshot.printers.is_empty();

        let committed = self.commit(|s| {
            *s = ConfigSnapshot::default();
            Ok(())
        })?;

        if committed {
            // Index events queued before the reset refer to a roster that is gone
            self.events.clear();
            if had_printers {
                self.push_event(ConfigEvent::RosterCleared);
            }
        }

        self.store.erase_all()?;
        self.persist()
    }

    // ---- form fields ----

    /// Backlight level, clamped to 0-100
    pub fn set_brightness(&mut self, percent: u8) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.display_brightness = percent.min(100);
            Ok(())
        })
    }

    pub fn set_metric(&mut self, metric: bool) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.display_metric = metric;
            Ok(())
        })
    }

    pub fn set_weather_enabled(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.weather_enabled = enabled;
            Ok(())
        })
    }

    /// Weather API key and location id
    pub fn set_weather_source(&mut self, api_key: &str, location_id: &str) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.open_weather_api_key = text(api_key)?;
            s.open_weather_location_id = text(location_id)?;
            Ok(())
        })
    }

    pub fn set_weather_interval_ms(&mut self, interval_ms: u32) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.current_weather_interval_ms = interval_ms;
            Ok(())
        })
    }

    pub fn set_print_monitor_interval_ms(&mut self, interval_ms: u32) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.print_monitor_interval_ms = interval_ms;
            Ok(())
        })
    }

    pub fn set_display_cycle_interval_ms(&mut self, interval_ms: u32) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.display_cycle_interval_ms = interval_ms;
            Ok(())
        })
    }

    pub fn set_cycle_weather_dwell_ms(&mut self, dwell_ms: u32) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.cycle_weather_dwell_ms = dwell_ms;
            Ok(())
        })
    }

    pub fn set_utc_offset_seconds(&mut self, offset: i32) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.utc_offset_seconds = offset;
            Ok(())
        })
    }

    pub fn set_clock_format(&mut self, format: ClockFormat) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.clock_format = format;
            Ok(())
        })
    }

    pub fn set_date_format(&mut self, format: DateFormat) -> Result<(), ConfigError> {
        self.mutate(|s| {
            s.date_format = format;
            Ok(())
        })
    }

    /// What the display should show
    ///
    /// A printer selection must name an existing roster entry.
    pub fn set_display_selector(&mut self, selector: DisplaySelector) -> Result<(), ConfigError> {
        self.mutate(|s| {
            if let DisplaySelector::Printer(index) = selector {
                s.printers.get(index)?;
            }
            s.current_display_selector = selector.to_setting();
            Ok(())
        })
    }

    // ---- roster ----

    /// Append a printer, returning its index
    pub fn add_printer(&mut self, config: PrinterConfig) -> Result<usize, ConfigError> {
        let mut added = 0;
        self.mutate(|s| {
            added = s.printers.add(config)?;
            Ok(())
        })?;
        info!("Printer {} added", added);
        Ok(added)
    }

    /// Replace the printer at `index`
    pub fn edit_printer(&mut self, index: usize, config: PrinterConfig) -> Result<(), ConfigError> {
        let committed = self.commit(|s| {
            s.printers.edit(index, config)?;
            Ok(())
        })?;

        if committed {
            self.push_event(ConfigEvent::PrinterEdited { index });
            self.persist()?;
        }
        Ok(())
    }

    /// Remove the printer at `index`
    ///
    /// A display selection of the removed printer falls back to weather; a
    /// selection after it follows its printer down one slot.
    pub fn delete_printer(&mut self, index: usize) -> Result<PrinterConfig, ConfigError> {
        let mut removed = None;
        let mut was_selected = false;

        self.commit(|s| {
            let printer = s.printers.delete(index)?;

            s.current_display_selector = match s.display_selector() {
                DisplaySelector::Printer(k) if k == index => {
                    was_selected = true;
                    DisplaySelector::Weather.to_setting()
                }
                DisplaySelector::Printer(k) if k > index => {
                    DisplaySelector::Printer(k - 1).to_setting()
                }
                _ => s.current_display_selector,
            };

            removed = Some(printer);
            Ok(())
        })?;

        let removed = removed.ok_or(ConfigError::Roster(RosterError::NotFound))?;
        info!("Printer {} deleted (selected: {})", index, was_selected);
        self.push_event(ConfigEvent::PrinterDeleted {
            index,
            was_selected,
        });
        self.persist()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_PRINTERS;

    /// Single-slot in-memory store
    #[derive(Default)]
    struct MemStore {
        data: Option<heapless::Vec<u8, MAX_CONFIG_SIZE>>,
        writes: usize,
        erases: usize,
        fail_writes: bool,
    }

    impl ConfigStore for MemStore {
        fn read(&mut self, _key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
            let data = self.data.as_ref().ok_or(StorageError::NotFound)?;
            if buffer.len() < data.len() {
                return Err(StorageError::BufferTooSmall);
            }
            buffer[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        fn write(&mut self, _key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Io);
            }
            self.data = Some(heapless::Vec::from_slice(data).map_err(|_| StorageError::Full)?);
            self.writes += 1;
            Ok(())
        }

        fn exists(&mut self, _key: StorageKey) -> bool {
            self.data.is_some()
        }

        fn erase_all(&mut self) -> Result<(), StorageError> {
            self.data = None;
            self.erases += 1;
            Ok(())
        }
    }

    fn printer(name: &str) -> PrinterConfig {
        PrinterConfig::new("octopi.local", 80, "key", name).unwrap()
    }

    fn broker() -> ConfigChangeBroker<MemStore> {
        ConfigChangeBroker::with_snapshot(MemStore::default(), ConfigSnapshot::default())
    }

    #[test]
    fn test_load_empty_store_persists_defaults() {
        let broker = ConfigChangeBroker::load(MemStore::default());
        assert_eq!(broker.snapshot(), &ConfigSnapshot::default());
        assert_eq!(broker.store().writes, 1);
        assert!(!broker.is_changed());
    }

    #[test]
    fn test_load_restores_persisted_snapshot() {
        let mut first = broker();
        first.set_brightness(42).unwrap();
        first.add_printer(printer("Ender")).unwrap();
        let store = first.store;

        let reloaded = ConfigChangeBroker::load(store);
        assert_eq!(reloaded.snapshot().display_brightness, 42);
        assert_eq!(reloaded.snapshot().printers.len(), 1);
    }

    #[test]
    fn test_load_garbage_falls_back_to_defaults() {
        let mut store = MemStore::default();
        store.data = Some(heapless::Vec::from_slice(&[0xFF; 8]).unwrap());

        let broker = ConfigChangeBroker::load(store);
        assert_eq!(broker.snapshot(), &ConfigSnapshot::default());
    }

    #[test]
    fn test_burst_of_writes_drains_once() {
        let mut broker = broker();
        broker.set_brightness(10).unwrap();
        broker.set_metric(false).unwrap();
        broker.set_utc_offset_seconds(3600).unwrap();
        broker.set_weather_interval_ms(60_000).unwrap();
        broker.set_brightness(20).unwrap();

        let drained = broker.drain_if_changed().unwrap();
        assert_eq!(drained.display_brightness, 20);
        assert!(!drained.display_metric);
        assert_eq!(drained.current_weather_interval_ms, 60_000);
        assert_eq!(broker.drain_if_changed(), None);
    }

    #[test]
    fn test_unchanged_value_is_noop() {
        let mut broker = broker();
        broker.set_brightness(100).unwrap();
        assert!(!broker.is_changed());
        assert_eq!(broker.store().writes, 0);
    }

    #[test]
    fn test_brightness_clamped() {
        let mut broker = broker();
        broker.set_brightness(100).unwrap();
        broker.set_brightness(250).unwrap();
        assert_eq!(broker.snapshot().display_brightness, 100);
    }

    #[test]
    fn test_rejected_roster_op_changes_nothing() {
        let mut broker = broker();
        for i in 0..MAX_PRINTERS {
            broker.add_printer(printer("p")).unwrap();
            assert_eq!(broker.snapshot().printers.len(), i + 1);
        }
        broker.drain_if_changed();
        let writes = broker.store().writes;

        assert_eq!(
            broker.add_printer(printer("extra")),
            Err(ConfigError::Roster(RosterError::CapacityExceeded))
        );
        assert_eq!(
            broker.delete_printer(MAX_PRINTERS),
            Err(ConfigError::Roster(RosterError::NotFound))
        );
        assert_eq!(
            broker.edit_printer(MAX_PRINTERS, printer("x")),
            Err(ConfigError::Roster(RosterError::NotFound))
        );

        assert_eq!(broker.store().writes, writes);
        assert!(!broker.is_changed());
        assert_eq!(broker.take_event(), None);
    }

    #[test]
    fn test_field_too_long_rejected() {
        let mut broker = broker();
        let long = "0123456789012345678901234567890123456789012345678901234567890123456789";
        assert_eq!(
            broker.set_weather_source(long, "1"),
            Err(ConfigError::FieldTooLong)
        );
        assert!(broker.snapshot().open_weather_api_key.is_empty());
        assert!(!broker.is_changed());
    }

    #[test]
    fn test_delete_selected_printer_resets_selector() {
        let mut broker = broker();
        broker.add_printer(printer("a")).unwrap();
        broker.add_printer(printer("b")).unwrap();
        broker.set_display_selector(DisplaySelector::Printer(1)).unwrap();

        let removed = broker.delete_printer(1).unwrap();
        assert_eq!(removed.display_name.as_str(), "b");
        assert_eq!(broker.snapshot().display_selector(), DisplaySelector::Weather);
        assert_eq!(
            broker.take_event(),
            Some(ConfigEvent::PrinterDeleted {
                index: 1,
                was_selected: true
            })
        );
        assert_eq!(broker.take_event(), None);
    }

    #[test]
    fn test_delete_earlier_printer_shifts_selector() {
        let mut broker = broker();
        for name in ["a", "b", "c"] {
            broker.add_printer(printer(name)).unwrap();
        }
        broker.set_display_selector(DisplaySelector::Printer(2)).unwrap();

        broker.delete_printer(0).unwrap();
        assert_eq!(broker.snapshot().display_selector(), DisplaySelector::Printer(1));
        assert_eq!(
            broker.take_event(),
            Some(ConfigEvent::PrinterDeleted {
                index: 0,
                was_selected: false
            })
        );
    }

    #[test]
    fn test_cycle_selector_survives_delete() {
        let mut broker = broker();
        broker.add_printer(printer("a")).unwrap();
        broker.set_display_selector(DisplaySelector::Cycle).unwrap();
        broker.delete_printer(0).unwrap();
        assert_eq!(broker.snapshot().display_selector(), DisplaySelector::Cycle);
    }

    #[test]
    fn test_selector_must_name_existing_printer() {
        let mut broker = broker();
        assert_eq!(
            broker.set_display_selector(DisplaySelector::Printer(0)),
            Err(ConfigError::Roster(RosterError::NotFound))
        );
    }

    #[test]
    fn test_edit_queues_event() {
        let mut broker = broker();
        broker.add_printer(printer("a")).unwrap();
        broker.edit_printer(0, printer("a2")).unwrap();
        assert_eq!(broker.take_event(), Some(ConfigEvent::PrinterEdited { index: 0 }));

        // Identical edit is a no-op
        broker.drain_if_changed();
        broker.edit_printer(0, printer("a2")).unwrap();
        assert_eq!(broker.take_event(), None);
    }

    #[test]
    fn test_persist_failure_keeps_change() {
        let mut broker = broker();
        broker.store.fail_writes = true;
        assert_eq!(
            broker.set_brightness(5),
            Err(ConfigError::Storage(StorageError::Io))
        );
        assert_eq!(broker.snapshot().display_brightness, 5);
        assert!(broker.is_changed());
    }

    #[test]
    fn test_reset_to_defaults() {
        let mut broker = broker();
        broker.add_printer(printer("a")).unwrap();
        broker.set_metric(false).unwrap();
        broker.drain_if_changed();

        broker.reset_to_defaults().unwrap();
        assert_eq!(broker.snapshot(), &ConfigSnapshot::default());
        assert!(broker.drain_if_changed().is_some());
        assert_eq!(broker.take_event(), Some(ConfigEvent::RosterCleared));
        assert_eq!(broker.take_event(), None);

        // Store wiped, then defaults written back
        assert_eq!(broker.store().erases, 1);
        let reloaded = ConfigChangeBroker::load(broker.store);
        assert_eq!(reloaded.snapshot(), &ConfigSnapshot::default());
    }

    #[test]
    fn test_reset_of_defaults_still_wipes_store() {
        let mut broker = broker();
        broker.reset_to_defaults().unwrap();
        assert_eq!(broker.store().erases, 1);
        assert!(broker.store().data.is_some());
        assert!(!broker.is_changed());
        assert_eq!(broker.take_event(), None);
    }

    #[test]
    fn test_event_queue_holds_a_full_roster_of_deletes() {
        let mut broker = broker();
        for _ in 0..MAX_PRINTERS {
            broker.add_printer(printer("p")).unwrap();
        }
        for _ in 0..MAX_PRINTERS {
            broker.delete_printer(0).unwrap();
        }

        for _ in 0..MAX_PRINTERS {
            assert_eq!(
                broker.take_event(),
                Some(ConfigEvent::PrinterDeleted {
                    index: 0,
                    was_selected: false
                })
            );
        }
        assert_eq!(broker.take_event(), None);
    }

    #[test]
    fn test_event_overflow_collapses_to_roster_cleared() {
        let mut broker = broker();
        for _ in 0..MAX_PRINTERS {
            broker.add_printer(printer("p")).unwrap();
        }
        for i in 0..MAX_PRINTERS {
            broker.edit_printer(i, printer("edited")).unwrap();
        }
        broker.delete_printer(0).unwrap();
        // Queue is now full; one more index event cannot be kept in order
        broker.delete_printer(0).unwrap();

        assert_eq!(broker.take_event(), Some(ConfigEvent::RosterCleared));
        assert_eq!(broker.take_event(), None);
    }
}
