//! Cadence Hardware Abstraction Layer
//!
//! This crate defines the capabilities the signal-shaping crates consume
//! from a platform: raw GPIO pins, a monotonic clock and a DMA controller.
//! Platform backends (sysfs, memory-mapped registers, I/O expanders)
//! implement these traits; the conditioning decorators implement
//! [`gpio::PinIn`] themselves so they stack transparently.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application                            │
//! └─────────────────────────────────────────┘
//!          │                     │
//!          ▼                     ▼
//! ┌─────────────────┐   ┌─────────────────┐
//! │ cadence-drivers │──▶│  cadence-core   │
//! │ debounce, poll  │   │ signal, raster  │
//! └─────────────────┘   └─────────────────┘
//!          │                     │
//!          └──────────┬──────────┘
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cadence-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::PinIn`], [`gpio::PinOut`] - Digital I/O
//! - [`clock::Clock`] - Monotonic time and sleeping
//! - [`dma::DmaController`], [`dma::DmaMem`] - Streamed output

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod clock;
pub mod dma;
pub mod gpio;

// Re-export key traits at crate root for convenience
#[cfg(feature = "std")]
pub use clock::SystemClock;
pub use clock::Clock;
pub use dma::{DmaController, DmaMem, DmaRegistry, RegistryError};
pub use gpio::{Edge, Level, PinIn, PinOut, Pull, Timeout};
