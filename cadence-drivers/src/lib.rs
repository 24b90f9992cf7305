//! Pin conditioning and streamed output
//!
//! This crate provides the stateful pieces built on the traits defined in
//! cadence-hal and the signal logic in cadence-core:
//!
//! - Debounce filter ([`debounce::Debounced`])
//! - Edge detection by polling ([`poll_edge::PollEdge`])
//! - DMA output of rasterized signals ([`output::DmaOutput`])
//! - `embedded-hal` adapters ([`embedded::AsInputPin`])
//!
//! Decorators implement [`cadence_hal::PinIn`] themselves, so they stack in
//! any order and [`cadence_hal::gpio::real`] finds the raw pin underneath.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

// This must go FIRST so that other mods see its macros.
mod fmt;

pub mod debounce;
pub mod embedded;
pub mod input;
pub mod output;
pub mod poll_edge;

#[cfg(test)]
mod mock;

pub use debounce::{debounce, Debounce, Debounced};
pub use embedded::{AsInputPin, PinError};
pub use input::{condition, Conditioned, InputError, Stage};
pub use output::{DmaOutput, OutputError};
pub use poll_edge::{poll_edge, PollEdge};
