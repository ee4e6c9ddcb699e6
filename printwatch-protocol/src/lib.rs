//! PrintWatch wire formats
//!
//! This crate defines the byte- and text-level formats the station exchanges
//! with the outside world, independent of any transport:
//!
//! - [`screenshot`]: the serial screenshot export used by the desktop
//!   capture client (bit-exact header plus a request/burst pixel stream)
//! - [`push`]: JSON events pushed to web UI clients over the websocket
//!
//! # Screenshot Overview
//!
//! ```text
//! client                         station
//!   │ ─────────── 'S' ───────────▶ │
//!   │ ◀──── W w w H h h Y b ? … ── │  header
//!   │ ─────────── req ───────────▶ │
//!   │ ◀────────── 8 px ─────────── │  repeated per burst
//!   │ ─────────── 'X' ───────────▶ │  (abort at any time)
//! ```

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod push;
pub mod screenshot;

pub use push::{MonitorInfo, PushError, PushEvent, WeatherReadings};
pub use screenshot::{
    sanitize_filename, FileExtension, FileType, ScreenshotError, ScreenshotHeader,
    ScreenshotSession, SessionAction, CMD_ABORT, CMD_START, DEFAULT_FILENAME, FLUSH_WINDOW_MS,
    PIXELS_PER_BURST,
};
