//! Input conditioning configuration
//!
//! Settings for the debounce filter and the polling edge emulator. Values
//! are plain data; the drivers crate turns them into pin decorators.

use core::fmt;
use core::time::Duration;

use cadence_hal::{Edge, Pull};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Polling frequency is 0 Hz
    ZeroFrequency,
    /// Output resolution is 0
    ZeroResolution,
    /// Replication factor is 0
    ZeroSkip,
    /// Lane index does not fit a 32-bit word
    LaneOutOfRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroFrequency => "polling frequency must be above 0",
            ConfigError::ZeroResolution => "resolution must be above 0",
            ConfigError::ZeroSkip => "skip must be above 0",
            ConfigError::LaneOutOfRange => "lane must be below 32",
        };
        f.write_str(msg)
    }
}

/// Debounce filter configuration
///
/// With both windows at zero no filter is inserted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebounceConfig {
    /// How long a new level must persist before it is believed
    pub denoise: Duration,
    /// How long after an accepted change further changes are ignored
    pub debounce: Duration,
    /// Edge to arm at wrap time
    pub edge: Edge,
}

impl DebounceConfig {
    /// Create a config with both windows and no armed edge
    pub const fn new(denoise: Duration, debounce: Duration) -> Self {
        Self {
            denoise,
            debounce,
            edge: Edge::None,
        }
    }

    /// Same windows, arming `edge`
    pub const fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    /// Whether the filter would be a no-op
    pub fn is_bypass(&self) -> bool {
        self.denoise.is_zero() && self.debounce.is_zero()
    }

    /// Every combination of windows is meaningful
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Polling edge emulator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PollConfig {
    /// Sampling rate
    pub frequency_hz: u32,
}

impl PollConfig {
    /// Default sampling rate
    pub const DEFAULT_FREQUENCY_HZ: u32 = 1000;

    /// Create a config sampling at `frequency_hz`
    pub const fn new(frequency_hz: u32) -> Self {
        Self { frequency_hz }
    }

    /// Time between two samples
    pub fn period(&self) -> Result<Duration, ConfigError> {
        self.validate()?;
        Ok(Duration::from_nanos(1_000_000_000 / self.frequency_hz as u64))
    }

    /// Check the frequency is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frequency_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FREQUENCY_HZ)
    }
}

/// Full conditioning chain for one input pin
///
/// Polling, when present, is applied closest to the raw pin so that the
/// debounce filter sees synthesized edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputConfig {
    /// Pull resistor
    pub pull: Pull,
    /// Debounce filter
    pub debounce: DebounceConfig,
    /// Edge emulation for pins without native edge detection
    pub poll: Option<PollConfig>,
}

impl InputConfig {
    /// Check every stage
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.debounce.validate()?;
        if let Some(poll) = &self.poll {
            poll.validate()?;
        }
        Ok(())
    }
}
