//! Multi-lane word rasterization
//!
//! GPIO banks driven by DMA take one pair of words per output tick: a set
//! mask and a clear mask. Several pins share each word, one bit position
//! (lane) per pin, so rasterizing a signal only ever ORs its own lane bit
//! into the words and leaves every other lane untouched.
//!
//! When lanes with different native rates share one DMA clock, the slowest
//! field runs with `skip = 1` and faster fields replicate each bit over
//! `skip` consecutive words.

use alloc::vec::Vec;
use core::time::Duration;

use cadence_hal::Level;

use super::{covers, BitPolicy, RasterError, Sink, Walker};
use crate::signal::Signal;

/// Largest buffer [`rasterize`] allocates, in word pairs
///
/// 16M words is 64 MiB per buffer, more than any DMA controller hands out
/// in one go.
pub const MAX_SLOTS: usize = 1 << 24;

/// Pair of equal-length set/clear word buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    assert: Vec<u32>,
    deassert: Vec<u32>,
}

impl OutputBuffer {
    /// Create a zeroed buffer of `len` word pairs
    pub fn new(len: usize) -> Self {
        Self {
            assert: alloc::vec![0; len],
            deassert: alloc::vec![0; len],
        }
    }

    /// Number of words in each buffer
    pub fn len(&self) -> usize {
        self.assert.len()
    }

    /// Whether the buffers hold no words
    pub fn is_empty(&self) -> bool {
        self.assert.is_empty()
    }

    /// Words whose set bits drive lanes high
    pub fn assert(&self) -> &[u32] {
        &self.assert
    }

    /// Words whose set bits drive lanes low
    pub fn deassert(&self) -> &[u32] {
        &self.deassert
    }

    /// Both buffers, mutably, for rasterizing further lanes into them
    pub fn as_mut_slices(&mut self) -> (&mut [u32], &mut [u32]) {
        (&mut self.assert, &mut self.deassert)
    }

    /// Split into `(assert, deassert)`
    pub fn into_parts(self) -> (Vec<u32>, Vec<u32>) {
        (self.assert, self.deassert)
    }
}

struct Lanes<'a> {
    assert: &'a mut [u32],
    deassert: &'a mut [u32],
    mask: u32,
}

impl Sink for Lanes<'_> {
    fn slots(&self) -> usize {
        self.assert.len()
    }

    fn put(&mut self, slot: usize, level: Level) {
        match level {
            Level::High => self.assert[slot] |= self.mask,
            Level::Low => self.deassert[slot] |= self.mask,
        }
    }
}

/// Rasterize `signal` into caller-provided set/clear buffers
///
/// `mask` selects the lane bit. Bit streams fill `skip` words per bit and
/// ignore `resolution`; edge streams are sampled every `resolution`.
///
/// Words past the end of a bit stream or program are left untouched; an
/// edge stream fills the whole buffer, holding its final level.
pub fn raster32(
    signal: &Signal,
    resolution: Duration,
    skip: usize,
    mask: u32,
    assert: &mut [u32],
    deassert: &mut [u32],
) -> Result<(), RasterError> {
    if mask == 0 {
        return Err(RasterError::ZeroLaneMask);
    }
    if assert.is_empty() || deassert.is_empty() {
        return Err(RasterError::EmptyBuffer);
    }
    if assert.len() != deassert.len() {
        return Err(RasterError::LengthMismatch);
    }
    if skip == 0 {
        return Err(RasterError::ZeroSkip);
    }
    signal.validate()?;

    let walker = Walker {
        resolution,
        bits: BitPolicy::Replicate(skip),
    };
    let mut sink = Lanes {
        assert,
        deassert,
        mask,
    };

    match signal {
        Signal::EdgeStream(e) => {
            walker.check_edges(e)?;
            if !covers(resolution, sink.slots(), e.duration()) {
                return Err(RasterError::BufferTooShort);
            }
            let count = sink.slots();
            walker.render_edges(e, &mut sink, 0, count)?;
        }
        Signal::BitStream(_) | Signal::Program(_) => {
            if walker.slots(signal)? > sink.slots() {
                return Err(RasterError::BufferTooShort);
            }
            walker.render(signal, &mut sink, 0)?;
        }
    }
    Ok(())
}

/// Rasterize `signal` into a freshly allocated buffer sized to fit it
///
/// Signals needing more than [`MAX_SLOTS`] words fail with
/// [`RasterError::SignalTooLong`] before anything is allocated.
pub fn rasterize(
    signal: &Signal,
    resolution: Duration,
    mask: u32,
    skip: usize,
) -> Result<OutputBuffer, RasterError> {
    if mask == 0 {
        return Err(RasterError::ZeroLaneMask);
    }
    if skip == 0 {
        return Err(RasterError::ZeroSkip);
    }
    let walker = Walker {
        resolution,
        bits: BitPolicy::Replicate(skip),
    };
    let len = walker.slots(signal)?.max(1);
    if len > MAX_SLOTS {
        return Err(RasterError::SignalTooLong);
    }
    let mut out = OutputBuffer::new(len);
    let (assert, deassert) = out.as_mut_slices();
    raster32(signal, resolution, skip, mask, assert, deassert)?;
    Ok(out)
}
