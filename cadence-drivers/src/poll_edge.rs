//! Edge detection by polling
//!
//! GPIOs behind an I2C expander or a USB bridge can be read but cannot
//! signal edges. [`PollEdge`] samples such a pin at a fixed rate inside
//! [`PinIn::wait_for_edge`] and reports the first sample that forms the
//! armed edge.
//!
//! The sampling loop only runs while a caller is waiting. A high rate is
//! close to a busy loop; 20 Hz is plenty for buttons.

use core::fmt;
use core::time::Duration;

use cadence_core::config::{ConfigError, PollConfig};
use cadence_hal::{Clock, Edge, Level, PinIn, Pull, Timeout};

/// Input pin with emulated edge detection
pub struct PollEdge<P, C> {
    pin: P,
    clock: C,
    period: Duration,
    edge: Edge,
    last: Option<Level>,
}

/// Emulate edge detection on `pin` by sampling at `config.frequency_hz`
///
/// No edge is armed until [`PinIn::configure`] is called.
pub fn poll_edge<P: PinIn, C: Clock>(
    pin: P,
    clock: C,
    config: &PollConfig,
) -> Result<PollEdge<P, C>, ConfigError> {
    let period = config.period()?;
    debug!("poll {}: period={}us", pin.number(), period.as_micros() as u64);
    Ok(PollEdge {
        pin,
        clock,
        period,
        edge: Edge::None,
        last: None,
    })
}

impl<P: PinIn, C: Clock> PollEdge<P, C> {
    /// The wrapped pin
    pub fn get_ref(&self) -> &P {
        &self.pin
    }

    /// The wrapped pin, mutably
    pub fn get_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Return the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }

    /// Time between two samples
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Edge [`PinIn::wait_for_edge`] reports
    pub fn armed(&self) -> Edge {
        self.edge
    }

    fn sample(&mut self) -> Result<Level, P::Error> {
        let level = self.pin.read()?;
        self.last = Some(level);
        Ok(level)
    }
}

impl<P: PinIn, C: Clock> PinIn for PollEdge<P, C> {
    type Error = P::Error;

    fn name(&self) -> &str {
        self.pin.name()
    }

    fn number(&self) -> u32 {
        self.pin.number()
    }

    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), Self::Error> {
        self.edge = Edge::None;
        self.last = None;
        self.pin.configure(pull, Edge::None)?;
        self.edge = edge;
        Ok(())
    }

    fn read(&mut self) -> Result<Level, Self::Error> {
        self.sample()
    }

    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, Self::Error> {
        if self.edge == Edge::None {
            warn!("poll {}: waiting without an armed edge", self.pin.number());
            return Ok(false);
        }

        let start = self.clock.now();
        let mut current = match self.last {
            Some(level) => level,
            None => self.sample()?,
        };
        loop {
            let elapsed = self.clock.now().saturating_sub(start);
            let nap = match timeout.limit() {
                Some(limit) if elapsed >= limit => return Ok(false),
                Some(limit) => self.period.min(limit - elapsed),
                None => self.period,
            };
            self.clock.sleep(nap);

            let next = self.sample()?;
            if self.edge.matches(current, next) {
                return Ok(true);
            }
            current = next;
        }
    }

    fn inner(&self) -> Option<&dyn PinIn<Error = Self::Error>> {
        Some(&self.pin)
    }
}

impl<P: PinIn, C> fmt::Display for PollEdge<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PollEdge{{{}({})}}", self.pin.name(), self.pin.number())
    }
}
