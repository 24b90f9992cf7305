//! Output lane configuration
//!
//! A lane is one bit position inside the 32-bit words a GPIO bank DMA
//! consumes. The lane index normally equals the pin's offset in its bank.

use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::ConfigError;

/// Number of lanes in one output word
pub const LANES_PER_WORD: u8 = 32;

/// Output lane configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneConfig {
    /// Duration of one output word
    pub resolution: Duration,
    /// Bit index within the word (0-31)
    pub lane: u8,
    /// Words per bit-stream bit
    pub skip: u32,
}

impl LaneConfig {
    /// Create a lane config with no replication
    pub const fn new(resolution: Duration, lane: u8) -> Self {
        Self {
            resolution,
            lane,
            skip: 1,
        }
    }

    /// Same lane, replicating each bit over `skip` words
    pub const fn with_skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    /// Single-bit mask selecting this lane
    pub fn mask(&self) -> Result<u32, ConfigError> {
        self.validate()?;
        Ok(1 << self.lane)
    }

    /// Words per second the DMA controller must emit
    ///
    /// Rounded down; resolutions above one second give 0.
    pub fn rate_hz(&self) -> Result<u64, ConfigError> {
        self.validate()?;
        let hz = 1_000_000_000u128 / self.resolution.as_nanos();
        Ok(u64::try_from(hz).unwrap_or(u64::MAX))
    }

    /// Check resolution, lane and replication
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution.is_zero() {
            return Err(ConfigError::ZeroResolution);
        }
        if self.lane >= LANES_PER_WORD {
            return Err(ConfigError::LaneOutOfRange);
        }
        if self.skip == 0 {
            return Err(ConfigError::ZeroSkip);
        }
        Ok(())
    }
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self::new(Duration::from_micros(1), 0)
    }
}
