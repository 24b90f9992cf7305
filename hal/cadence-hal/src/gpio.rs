//! GPIO pin abstractions
//!
//! Input pins are the capability the conditioning decorators consume and
//! produce, so a debounced or polled pin can be handed to anything that
//! accepts a raw one.

use core::fmt;
use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    /// 0V
    #[default]
    Low,
    /// Vin, generally 3.3V or 5V
    High,
}

impl Level {
    /// Whether this is `High`
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Whether this is `Low`
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }

    /// The other level
    pub const fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("Low"),
            Level::High => f.write_str("High"),
        }
    }
}

/// Internal pull resistor for a pin set as input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Pull {
    /// Keep whatever resistor setting the pin already has
    #[default]
    NoChange,
    /// Let the input float
    Float,
    /// Apply pull-down
    Down,
    /// Apply pull-up
    Up,
}

/// Edge detection mode for an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Edge {
    /// No edge detection
    #[default]
    None,
    /// Low to High
    Rising,
    /// High to Low
    Falling,
    /// Any transition
    Both,
}

impl Edge {
    /// Check whether the transition `old -> new` is one this edge reports
    pub const fn matches(self, old: Level, new: Level) -> bool {
        match self {
            Edge::None => false,
            Edge::Rising => old.is_low() && new.is_high(),
            Edge::Falling => old.is_high() && new.is_low(),
            Edge::Both => !matches!(
                (old, new),
                (Level::Low, Level::Low) | (Level::High, Level::High)
            ),
        }
    }

    /// Check whether a pin that just settled on `level` after an edge is on
    /// the side this edge cares about.
    ///
    /// `None` and `Both` accept either level.
    pub const fn accepts(self, level: Level) -> bool {
        match self {
            Edge::Rising => level.is_high(),
            Edge::Falling => level.is_low(),
            Edge::None | Edge::Both => true,
        }
    }
}

/// How long an edge wait may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Block until an edge arrives
    Forever,
    /// Give up after this long; zero checks once without blocking
    After(Duration),
}

impl Timeout {
    /// Check once, never block
    pub const POLL: Timeout = Timeout::After(Duration::ZERO);

    /// The bound, if any
    pub const fn limit(self) -> Option<Duration> {
        match self {
            Timeout::Forever => None,
            Timeout::After(d) => Some(d),
        }
    }

    /// What is left of this timeout once `elapsed` has passed
    pub fn remaining(self, elapsed: Duration) -> Timeout {
        match self {
            Timeout::Forever => Timeout::Forever,
            Timeout::After(d) => Timeout::After(d.saturating_sub(elapsed)),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::After(d)
    }
}

/// Digital input pin
///
/// Implementations wrap the platform's pin access (register, sysfs line,
/// expander register). Decorators implement it too and return the wrapped
/// pin from [`PinIn::inner`].
pub trait PinIn {
    /// Error reported by the underlying hardware access
    type Error: fmt::Debug;

    /// Pin name, e.g. "GPIO4"
    fn name(&self) -> &str;

    /// Pin number on its controller
    fn number(&self) -> u32;

    /// Set the pin up as input with the given pull and edge detection
    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), Self::Error>;

    /// Current level of the pin
    fn read(&mut self) -> Result<Level, Self::Error>;

    /// Wait for an edge
    ///
    /// Returns `Ok(false)` when the timeout expires first.
    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, Self::Error>;

    /// The pin this one decorates, if any
    fn inner(&self) -> Option<&dyn PinIn<Error = Self::Error>> {
        None
    }
}

impl<P: PinIn + ?Sized> PinIn for &mut P {
    type Error = P::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn number(&self) -> u32 {
        (**self).number()
    }

    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), Self::Error> {
        (**self).configure(pull, edge)
    }

    fn read(&mut self) -> Result<Level, Self::Error> {
        (**self).read()
    }

    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, Self::Error> {
        (**self).wait_for_edge(timeout)
    }

    fn inner(&self) -> Option<&dyn PinIn<Error = Self::Error>> {
        (**self).inner()
    }
}

/// Innermost undecorated pin behind any number of decorators
pub fn real<E: fmt::Debug>(pin: &dyn PinIn<Error = E>) -> &dyn PinIn<Error = E> {
    let mut current = pin;
    while let Some(inner) = current.inner() {
        current = inner;
    }
    current
}

/// Digital output pin
///
/// Only identity and a direct level write are needed here; streamed output
/// goes through [`crate::dma::DmaController`].
pub trait PinOut {
    /// Error reported by the underlying hardware access
    type Error: fmt::Debug;

    /// Pin name, e.g. "GPIO4"
    fn name(&self) -> &str;

    /// Pin number on its controller
    fn number(&self) -> u32;

    /// Drive the pin to `level`
    fn out(&mut self, level: Level) -> Result<(), Self::Error>;
}
