//! Signal rasterization
//!
//! Turns a [`Signal`] into time-quantized output. Three targets exist:
//!
//! - [`lanes`]: pairs of 32-bit set/clear words where one bit position (the
//!   lane) belongs to this pin. This is what GPIO-bank DMA consumes.
//! - [`bits`]: a single-channel packed [`BitStream`](crate::signal::BitStream),
//!   one bit per slot.
//! - [`dma`]: PCM/PWM FIFO words, where the stream bytes are copied as-is.
//!
//! Lanes and bits share one slot walker: every variant is reduced to "slot
//! `i` carries level `l`" and the target decides how to store it.

pub mod bits;
pub mod dma;
pub mod lanes;

use core::fmt;
use core::time::Duration;

use cadence_hal::Level;

use crate::signal::{BitStream, EdgeStream, Loops, Program, Signal, SignalError};

pub use bits::raster_bits;
pub use dma::copy_to_dma_words;
pub use lanes::{raster32, rasterize, OutputBuffer, MAX_SLOTS};

/// Features that are designed but not built yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feature {
    /// Rasterizing a program that loops forever, at any nesting depth
    InfiniteProgram,
    /// Copying an LSB-first bit stream into DMA words
    LsbFirstDmaCopy,
    /// Copying an edge stream into DMA words
    EdgeStreamDmaCopy,
    /// Copying a program into DMA words
    ProgramDmaCopy,
}

/// Errors from rasterization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RasterError {
    /// Lane mask is 0
    ZeroLaneMask,
    /// Output buffer is empty
    EmptyBuffer,
    /// Assert and deassert buffers have different lengths
    LengthMismatch,
    /// Replication factor is 0
    ZeroSkip,
    /// Raster resolution is 0 where edges must be sampled
    ZeroResolution,
    /// Stream variant not recognized
    UnknownStream,
    /// Signal violates its own invariants
    InvalidSignal(SignalError),
    /// Raster resolution is coarser than the stream's resolution
    ResolutionTooCoarse,
    /// Output buffer cannot hold the whole signal
    BufferTooShort,
    /// Signal needs more slots than a buffer may hold
    SignalTooLong,
    /// Source and destination resolutions differ and resampling is not built
    ResolutionMismatch,
    /// Designed but not built yet
    Unimplemented(Feature),
}

impl RasterError {
    /// Caller misuse; retrying with the same arguments can never succeed
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RasterError::ZeroLaneMask
                | RasterError::EmptyBuffer
                | RasterError::LengthMismatch
                | RasterError::ZeroSkip
                | RasterError::ZeroResolution
                | RasterError::UnknownStream
                | RasterError::InvalidSignal(_)
        )
    }

    /// The signal does not fit the requested timing or buffer
    pub fn is_timing(&self) -> bool {
        matches!(
            self,
            RasterError::ResolutionTooCoarse
                | RasterError::BufferTooShort
                | RasterError::SignalTooLong
                | RasterError::ResolutionMismatch
        )
    }

    /// The requested conversion is not built
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, RasterError::Unimplemented(_))
    }
}

impl From<SignalError> for RasterError {
    fn from(e: SignalError) -> Self {
        RasterError::InvalidSignal(e)
    }
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::ZeroLaneMask => f.write_str("raster: mask is 0"),
            RasterError::EmptyBuffer => f.write_str("raster: buffer is empty"),
            RasterError::LengthMismatch => {
                f.write_str("raster: assert and deassert buffers have different length")
            }
            RasterError::ZeroSkip => f.write_str("raster: skip must be above 0"),
            RasterError::ZeroResolution => f.write_str("raster: resolution must be above 0"),
            RasterError::UnknownStream => f.write_str("raster: unknown stream type"),
            RasterError::InvalidSignal(e) => write!(f, "raster: invalid signal: {}", e),
            RasterError::ResolutionTooCoarse => f.write_str("raster: resolution is too coarse"),
            RasterError::BufferTooShort => f.write_str("raster: buffer is too short"),
            RasterError::SignalTooLong => f.write_str("raster: signal is too long"),
            RasterError::ResolutionMismatch => {
                f.write_str("raster: resolutions differ and resampling is not implemented")
            }
            RasterError::Unimplemented(feature) => {
                write!(f, "raster: not implemented: {:?}", feature)
            }
        }
    }
}

/// Destination of rasterized levels
pub(crate) trait Sink {
    /// Number of slots available
    fn slots(&self) -> usize;

    /// Store `level` at `slot`
    fn put(&mut self, slot: usize, level: Level);
}

/// How bit streams map onto slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BitPolicy {
    /// Each bit fills `skip` slots, whatever its own resolution
    Replicate(usize),
    /// Each bit fills one slot and its resolution must equal the raster's
    Exact,
}

/// Walks a signal slot by slot
#[derive(Debug, Clone, Copy)]
pub(crate) struct Walker {
    pub resolution: Duration,
    pub bits: BitPolicy,
}

impl Walker {
    /// Slots `signal` occupies when played inside a program
    pub fn slots(&self, signal: &Signal) -> Result<usize, RasterError> {
        match signal {
            Signal::BitStream(b) => b
                .len_bits()
                .checked_mul(self.bit_width(b)?)
                .ok_or(RasterError::SignalTooLong),
            Signal::EdgeStream(e) => {
                self.check_edges(e)?;
                slots_for(e.duration(), self.resolution).ok_or(RasterError::SignalTooLong)
            }
            Signal::Program(p) => {
                let count = finite_loops(p)?;
                let mut once = 0usize;
                for part in p.parts() {
                    once = once
                        .checked_add(self.slots(part)?)
                        .ok_or(RasterError::SignalTooLong)?;
                }
                usize::try_from(count)
                    .ok()
                    .and_then(|n| once.checked_mul(n))
                    .ok_or(RasterError::SignalTooLong)
            }
        }
    }

    /// Write `signal` starting at `offset`; returns the slots written
    ///
    /// Callers size the sink with [`Walker::slots`] first.
    pub fn render<S: Sink>(
        &self,
        signal: &Signal,
        sink: &mut S,
        offset: usize,
    ) -> Result<usize, RasterError> {
        match signal {
            Signal::BitStream(b) => self.render_bits(b, sink, offset),
            Signal::EdgeStream(e) => {
                let n = self.slots(signal)?;
                self.render_edges(e, sink, offset, n)
            }
            Signal::Program(p) => self.render_program(p, sink, offset),
        }
    }

    pub fn render_bits<S: Sink>(
        &self,
        b: &BitStream,
        sink: &mut S,
        offset: usize,
    ) -> Result<usize, RasterError> {
        let width = self.bit_width(b)?;
        let mut slot = offset;
        for i in 0..b.len_bits() {
            let level = b.bit(i);
            for _ in 0..width {
                sink.put(slot, level);
                slot += 1;
            }
        }
        Ok(slot - offset)
    }

    /// Fill `count` slots from an edge stream
    ///
    /// Slot `i` carries the level set by the last edge at or before
    /// `i * resolution`.
    pub fn render_edges<S: Sink>(
        &self,
        e: &EdgeStream,
        sink: &mut S,
        offset: usize,
        count: usize,
    ) -> Result<usize, RasterError> {
        self.check_edges(e)?;
        let edges = e.edges();
        let mut level = EdgeStream::START_LEVEL;
        let mut next = 0;
        let mut t = Duration::ZERO;
        for i in 0..count {
            while next < edges.len() && edges[next] <= t {
                level = level.toggled();
                next += 1;
            }
            sink.put(offset + i, level);
            t = t.saturating_add(self.resolution);
        }
        Ok(count)
    }

    fn render_program<S: Sink>(
        &self,
        p: &Program,
        sink: &mut S,
        offset: usize,
    ) -> Result<usize, RasterError> {
        let count = finite_loops(p)?;
        let mut slot = offset;
        for _ in 0..count {
            for part in p.parts() {
                slot += self.render(part, sink, slot)?;
            }
        }
        Ok(slot - offset)
    }

    fn bit_width(&self, b: &BitStream) -> Result<usize, RasterError> {
        match self.bits {
            BitPolicy::Replicate(skip) => Ok(skip),
            BitPolicy::Exact if b.resolution() == self.resolution => Ok(1),
            BitPolicy::Exact => Err(RasterError::ResolutionMismatch),
        }
    }

    pub fn check_edges(&self, e: &EdgeStream) -> Result<(), RasterError> {
        if self.resolution.is_zero() {
            return Err(RasterError::ZeroResolution);
        }
        if self.resolution > e.resolution() {
            return Err(RasterError::ResolutionTooCoarse);
        }
        Ok(())
    }
}

/// Number of `resolution` slots needed to cover `duration`
///
/// `None` when the count does not fit a `usize`.
pub(crate) fn slots_for(duration: Duration, resolution: Duration) -> Option<usize> {
    let n = duration.as_nanos().div_ceil(resolution.as_nanos());
    usize::try_from(n).ok()
}

/// Whether `count` slots of `resolution` cover `duration`
pub(crate) fn covers(resolution: Duration, count: usize, duration: Duration) -> bool {
    resolution.as_nanos().saturating_mul(count as u128) >= duration.as_nanos()
}

fn finite_loops(p: &Program) -> Result<u32, RasterError> {
    match p.loops() {
        Loops::Count(n) => Ok(n),
        Loops::Forever => Err(RasterError::Unimplemented(Feature::InfiniteProgram)),
    }
}
