//! Waveform descriptions
//!
//! A [`Signal`] describes what a pin should do over time without saying
//! anything about the peripheral that will produce it. Every variant is
//! validated on construction and immutable afterwards; data that arrives
//! through serde can be re-checked with [`Signal::validate`].

use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use cadence_hal::Level;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors from constructing a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalError {
    /// Bit stream has no bytes
    EmptyBits,
    /// Resolution is zero
    ZeroResolution,
    /// Edge timestamps are not strictly increasing
    EdgesNotIncreasing,
    /// Program has no parts
    EmptyProgram,
    /// Program loop count is zero
    ZeroLoops,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SignalError::EmptyBits => "bit stream is empty",
            SignalError::ZeroResolution => "resolution must be above 0",
            SignalError::EdgesNotIncreasing => "edge timestamps must be strictly increasing",
            SignalError::EmptyProgram => "program has no parts",
            SignalError::ZeroLoops => "program loop count must be above 0",
        };
        f.write_str(msg)
    }
}

/// Order of bits inside each byte of a [`BitStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BitOrder {
    /// Bit 7 of each byte is emitted first
    #[default]
    MsbFirst,
    /// Bit 0 of each byte is emitted first
    LsbFirst,
}

/// Dense stream of bits at a fixed rate
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BitStream {
    resolution: Duration,
    bits: Vec<u8>,
    order: BitOrder,
}

impl BitStream {
    /// Create a bit stream where each bit lasts `resolution`
    pub fn new(resolution: Duration, bits: Vec<u8>, order: BitOrder) -> Result<Self, SignalError> {
        let stream = Self {
            resolution,
            bits,
            order,
        };
        stream.validate()?;
        Ok(stream)
    }

    /// Create an all-low stream of `len` bytes, typically as a raster target
    pub fn zeroed(resolution: Duration, len: usize, order: BitOrder) -> Result<Self, SignalError> {
        Self::new(resolution, alloc::vec![0; len], order)
    }

    /// Check the stream invariants
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.resolution.is_zero() {
            return Err(SignalError::ZeroResolution);
        }
        if self.bits.is_empty() {
            return Err(SignalError::EmptyBits);
        }
        Ok(())
    }

    /// Duration of a single bit
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Packed bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Bit order within each byte
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Number of bits in the stream
    pub fn len_bits(&self) -> usize {
        self.bits.len() * 8
    }

    /// Total time the stream covers
    pub fn duration(&self) -> Duration {
        scale(self.resolution, self.len_bits())
    }

    /// Level of the `index`th bit, counted in emission order
    ///
    /// # Panics
    /// If `index >= self.len_bits()`.
    pub fn bit(&self, index: usize) -> Level {
        let byte = self.bits[index / 8];
        Level::from(byte & self.mask(index) != 0)
    }

    /// Set the `index`th bit, counted in emission order
    ///
    /// # Panics
    /// If `index >= self.len_bits()`.
    pub fn set_bit(&mut self, index: usize, level: Level) {
        let mask = self.mask(index);
        let byte = &mut self.bits[index / 8];
        if level.is_high() {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bits
    }

    fn mask(&self, index: usize) -> u8 {
        let shift = match self.order {
            BitOrder::MsbFirst => 7 - (index % 8),
            BitOrder::LsbFirst => index % 8,
        };
        1 << shift
    }
}

/// Level transitions at explicit times
///
/// The stream starts [`EdgeStream::START_LEVEL`] and every edge toggles the
/// level. An edge at time zero therefore makes the stream start low.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeStream {
    resolution: Duration,
    edges: Vec<Duration>,
}

impl EdgeStream {
    /// Level before the first edge
    pub const START_LEVEL: Level = Level::High;

    /// Create an edge stream
    ///
    /// `edges` are offsets from the start of the stream and must be strictly
    /// increasing. `resolution` is the precision they were captured or
    /// authored at.
    pub fn new(resolution: Duration, edges: Vec<Duration>) -> Result<Self, SignalError> {
        let stream = Self { resolution, edges };
        stream.validate()?;
        Ok(stream)
    }

    /// Check the stream invariants
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.resolution.is_zero() {
            return Err(SignalError::ZeroResolution);
        }
        if self.edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(SignalError::EdgesNotIncreasing);
        }
        Ok(())
    }

    /// Declared precision of the timestamps
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Edge timestamps
    pub fn edges(&self) -> &[Duration] {
        &self.edges
    }

    /// Time of the last edge
    pub fn duration(&self) -> Duration {
        self.edges.last().copied().unwrap_or(Duration::ZERO)
    }

    /// Level at time `t`
    pub fn level_at(&self, t: Duration) -> Level {
        let toggles = self.edges.partition_point(|&e| e <= t);
        if toggles % 2 == 0 {
            Self::START_LEVEL
        } else {
            Self::START_LEVEL.toggled()
        }
    }
}

/// How many times a [`Program`] plays its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Loops {
    /// Play this many times
    Count(u32),
    /// Repeat until stopped
    Forever,
}

impl Default for Loops {
    fn default() -> Self {
        Loops::Count(1)
    }
}

/// Sequence of signals played back to back
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Program {
    parts: Vec<Signal>,
    loops: Loops,
}

impl Program {
    /// Create a program repeating `parts` according to `loops`
    pub fn new(parts: Vec<Signal>, loops: Loops) -> Result<Self, SignalError> {
        let program = Self { parts, loops };
        program.validate()?;
        Ok(program)
    }

    /// Create a program that plays `parts` once
    pub fn once(parts: Vec<Signal>) -> Result<Self, SignalError> {
        Self::new(parts, Loops::Count(1))
    }

    /// Check the program and all of its parts
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.parts.is_empty() {
            return Err(SignalError::EmptyProgram);
        }
        if self.loops == Loops::Count(0) {
            return Err(SignalError::ZeroLoops);
        }
        self.parts.iter().try_for_each(Signal::validate)
    }

    /// Parts in playback order
    pub fn parts(&self) -> &[Signal] {
        &self.parts
    }

    /// Repetition count
    pub fn loops(&self) -> Loops {
        self.loops
    }

    /// Whether this program and every nested one terminates
    pub fn is_finite(&self) -> bool {
        self.loops != Loops::Forever
            && self.parts.iter().all(|part| match part {
                Signal::Program(p) => p.is_finite(),
                _ => true,
            })
    }
}

/// Logical digital waveform
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Signal {
    /// Bits at a fixed rate
    BitStream(BitStream),
    /// Timed level transitions
    EdgeStream(EdgeStream),
    /// Composition of signals
    Program(Program),
}

impl Signal {
    /// Check the invariants of this signal and everything it contains
    pub fn validate(&self) -> Result<(), SignalError> {
        match self {
            Signal::BitStream(b) => b.validate(),
            Signal::EdgeStream(e) => e.validate(),
            Signal::Program(p) => p.validate(),
        }
    }

    /// Playback time, or `None` for a program that loops forever
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Signal::BitStream(b) => Some(b.duration()),
            Signal::EdgeStream(e) => Some(e.duration()),
            Signal::Program(p) => {
                let count = match p.loops {
                    Loops::Count(n) => n,
                    Loops::Forever => return None,
                };
                let mut once = Duration::ZERO;
                for part in &p.parts {
                    once = once.saturating_add(part.duration()?);
                }
                Some(once.saturating_mul(count))
            }
        }
    }
}

impl From<BitStream> for Signal {
    fn from(b: BitStream) -> Self {
        Signal::BitStream(b)
    }
}

impl From<EdgeStream> for Signal {
    fn from(e: EdgeStream) -> Self {
        Signal::EdgeStream(e)
    }
}

impl From<Program> for Signal {
    fn from(p: Program) -> Self {
        Signal::Program(p)
    }
}

/// `d * n`, saturating
pub(crate) fn scale(d: Duration, n: usize) -> Duration {
    let n = u32::try_from(n).unwrap_or(u32::MAX);
    d.saturating_mul(n)
}
