//! Binary encoding of signals and configuration
//!
//! Signals and configs travel as postcard data: over a serial link from a
//! host tool, or out of flash at boot. Everything decoded here is validated
//! before it is returned, so a corrupt or hostile payload can never reach
//! the rasterizer with broken invariants.

use alloc::vec::Vec;
use core::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ConfigError, DebounceConfig, InputConfig, LaneConfig, PollConfig};
use crate::signal::{Signal, SignalError};

/// Number of [`Signal`] variants; tags at or above this are unknown
const SIGNAL_VARIANTS: u32 = 3;

/// Wire format errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// Serialization failed
    Encode,
    /// Payload is truncated or malformed
    Decode,
    /// Top-level signal tag is not a known variant
    UnknownStream,
    /// Decoded signal violates its invariants
    Invalid(SignalError),
    /// Decoded configuration is out of range
    InvalidConfig(ConfigError),
}

impl From<SignalError> for WireError {
    fn from(e: SignalError) -> Self {
        WireError::Invalid(e)
    }
}

impl From<ConfigError> for WireError {
    fn from(e: ConfigError) -> Self {
        WireError::InvalidConfig(e)
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Encode => f.write_str("wire: encoding failed"),
            WireError::Decode => f.write_str("wire: malformed payload"),
            WireError::UnknownStream => f.write_str("wire: unknown stream type"),
            WireError::Invalid(e) => write!(f, "wire: invalid signal: {}", e),
            WireError::InvalidConfig(e) => write!(f, "wire: invalid config: {}", e),
        }
    }
}

/// Configuration that can be checked after decoding
pub trait Validate: DeserializeOwned {
    /// Check the decoded value
    fn validate(&self) -> Result<(), ConfigError>;
}

impl Validate for DebounceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        DebounceConfig::validate(self)
    }
}

impl Validate for PollConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        PollConfig::validate(self)
    }
}

impl Validate for LaneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        LaneConfig::validate(self)
    }
}

impl Validate for InputConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        InputConfig::validate(self)
    }
}

/// Serialize any signal or config value
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, WireError> {
    postcard::to_allocvec(value).map_err(|_| WireError::Encode)
}

/// Decode and validate a signal
pub fn decode_signal(bytes: &[u8]) -> Result<Signal, WireError> {
    // The variant index leads the payload as a varint
    let (tag, _) = postcard::take_from_bytes::<u32>(bytes).map_err(|_| WireError::Decode)?;
    if tag >= SIGNAL_VARIANTS {
        return Err(WireError::UnknownStream);
    }
    let signal: Signal = postcard::from_bytes(bytes).map_err(|e| match e {
        postcard::Error::DeserializeBadEnum => WireError::UnknownStream,
        _ => WireError::Decode,
    })?;
    signal.validate()?;
    Ok(signal)
}

/// Decode and validate a configuration value
pub fn decode_config<T: Validate>(bytes: &[u8]) -> Result<T, WireError> {
    let value: T = postcard::from_bytes(bytes).map_err(|_| WireError::Decode)?;
    value.validate()?;
    Ok(value)
}
