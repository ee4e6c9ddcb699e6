//! PrintWatch Platform Abstraction Layer
//!
//! Traits implemented by board support code (ESP8266/ESP32 ports, the host
//! simulator, test doubles) so the orchestration core never touches a
//! concrete peripheral.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Board firmware / simulator             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  printwatch-core (orchestration)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  printwatch-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::ConfigStore`] - Persistent key-value storage
//! - [`serial::SerialPort`] - Non-blocking serial link (screenshot export)
//! - [`clock::Clock`] - Monotonic millisecond clock

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod serial;
pub mod storage;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use serial::SerialPort;
pub use storage::{ConfigStore, StorageError, StorageKey};
