//! Board-agnostic signal logic for Cadence
//!
//! This crate contains everything about output waveforms that does not
//! depend on a specific peripheral:
//!
//! - Signal model (bit streams, edge streams, programs)
//! - Rasterizer (multi-lane GPIO words, single-channel bits, FIFO words)
//! - Configuration type definitions
//! - Wire format for signals and configuration (`serde` feature)

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod raster;
pub mod signal;
#[cfg(feature = "serde")]
pub mod wire;

pub use raster::{OutputBuffer, RasterError};
pub use signal::{BitOrder, BitStream, EdgeStream, Loops, Program, Signal, SignalError};
