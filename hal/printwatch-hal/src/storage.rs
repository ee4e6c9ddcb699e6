//! Persistent storage abstractions
//!
//! Provides a key-value storage trait backed by whatever the board has:
//! SPIFFS/LittleFS files, a flash partition, or RAM in tests.

/// Storage keys for persisted data
///
/// The on-device layout is up to the implementation; a file-system port
/// typically maps each key to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageKey {
    /// Station settings and printer roster (binary postcard format)
    Settings,
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Underlying medium failed
    Io,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Storage is full
    Full,
}

/// Configuration storage trait
///
/// Calls block until the medium has completed the operation. The core
/// only writes from web-request context, never from a polling task, so a
/// slow write stalls the UI rather than a data refresh.
pub trait ConfigStore {
    /// Read a value by key into the provided buffer
    ///
    /// # Returns
    /// The number of bytes read, or an error.
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value by key, replacing any previous value
    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError>;

    /// Check if a key exists in storage
    ///
    /// Checked at boot before reading the settings.
    fn exists(&mut self, key: StorageKey) -> bool;

    /// Erase all stored data (factory reset)
    fn erase_all(&mut self) -> Result<(), StorageError>;
}
