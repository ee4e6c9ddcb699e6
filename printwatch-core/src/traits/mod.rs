//! Collaborator traits
//!
//! These traits define the interface between the orchestration core and
//! the platform: data sources, the display and the network stack.

pub mod network;
pub mod renderer;
pub mod source;

pub use network::{NetworkServices, PushChannel};
pub use renderer::Renderer;
pub use source::{PrinterSource, SourceError, WeatherSource};
