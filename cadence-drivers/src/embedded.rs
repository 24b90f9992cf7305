//! `embedded-hal` interop
//!
//! Conditioned pins are plain [`PinIn`]s. [`AsInputPin`] puts any of them
//! behind `embedded_hal::digital::InputPin` so they can be handed to
//! drivers written against `embedded-hal` 1.0.

use core::fmt;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};

use cadence_hal::PinIn;

/// Pin error surfaced through `embedded-hal`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinError<E>(pub E);

impl<E: fmt::Debug> digital::Error for PinError<E> {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl<E: fmt::Debug> fmt::Display for PinError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio: {:?}", self.0)
    }
}

/// Wrapper implementing `embedded_hal::digital::InputPin` for a [`PinIn`]
pub struct AsInputPin<P>(P);

impl<P: PinIn> AsInputPin<P> {
    /// Wrap `pin`
    pub fn new(pin: P) -> Self {
        Self(pin)
    }

    /// The wrapped pin
    pub fn get_ref(&self) -> &P {
        &self.0
    }

    /// The wrapped pin, mutably
    pub fn get_mut(&mut self) -> &mut P {
        &mut self.0
    }

    /// Return the wrapped pin
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: PinIn> ErrorType for AsInputPin<P> {
    type Error = PinError<P::Error>;
}

impl<P: PinIn> InputPin for AsInputPin<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.read().map(|l| l.is_high()).map_err(PinError)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.read().map(|l| l.is_low()).map_err(PinError)
    }
}
