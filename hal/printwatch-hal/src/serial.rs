//! Serial communication abstractions
//!
//! The screenshot exporter talks to a desktop client over the debug serial
//! port using explicit poll loops, so reads are non-blocking.

/// Serial port used for screenshot export
pub trait SerialPort {
    /// Error type for transmit operations
    type Error;

    /// Read one byte if one is waiting
    ///
    /// Returns `None` immediately when the receive buffer is empty.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write data to the port
    ///
    /// Blocks until all data has been queued or an error occurs.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}
