//! Display mode orchestration
//!
//! Decides what the screen shows: the weather page, one fixed printer, or a
//! rotation through the enabled printers. Rendering code only ever asks for
//! the current [`RenderTarget`]; it never changes the mode itself.

pub mod controller;
pub mod mode;

pub use controller::DisplayModeController;
pub use mode::{DisplayMode, DisplaySelector, RenderTarget};
