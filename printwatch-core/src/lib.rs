//! Board-agnostic core logic for the PrintWatch station
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or network stacks:
//!
//! - Cooperative task scheduler
//! - Display mode state machine (weather / fixed printer / rotation)
//! - Configuration change broker and printer roster
//! - Latest polled status and printer state flags
//! - Collaborator traits (data sources, renderer, network, push)
//! - The [`station::Station`] context that ties them together
//! - Serial screenshot export driver

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod config;
pub mod display;
pub mod push;
pub mod scheduler;
pub mod screenshot;
pub mod station;
pub mod status;
pub mod traits;
