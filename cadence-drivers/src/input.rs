//! Input chains built from configuration
//!
//! [`condition`] assembles the decorators an [`InputConfig`] asks for:
//!
//! ```text
//! raw pin ─▶ [PollEdge] ─▶ [Debounced] ─▶ caller
//! ```
//!
//! Polling sits next to the raw pin so the debounce filter waits on the
//! synthesized edges. Stages the config leaves out are not inserted.

use core::fmt;

use cadence_core::config::{ConfigError, InputConfig};
use cadence_hal::{Clock, Edge, Level, PinIn, Pull, Timeout};

use crate::debounce::{debounce, Debounce};
use crate::poll_edge::{poll_edge, PollEdge};

/// Errors from building an input chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError<E> {
    /// Configuration is invalid
    Config(ConfigError),
    /// Raw pin reported an error
    Pin(E),
}

impl<E> From<ConfigError> for InputError<E> {
    fn from(e: ConfigError) -> Self {
        InputError::Config(e)
    }
}

impl<E: fmt::Debug> fmt::Display for InputError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Config(e) => write!(f, "input: {}", e),
            InputError::Pin(e) => write!(f, "input: pin: {:?}", e),
        }
    }
}

/// Raw pin, or raw pin with polled edges
pub enum Stage<P, C> {
    /// Pin detects edges natively
    Native(P),
    /// Edges are emulated by sampling
    Polled(PollEdge<P, C>),
}

impl<P: PinIn, C: Clock> PinIn for Stage<P, C> {
    type Error = P::Error;

    fn name(&self) -> &str {
        match self {
            Stage::Native(p) => p.name(),
            Stage::Polled(p) => p.name(),
        }
    }

    fn number(&self) -> u32 {
        match self {
            Stage::Native(p) => p.number(),
            Stage::Polled(p) => p.number(),
        }
    }

    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), Self::Error> {
        match self {
            Stage::Native(p) => p.configure(pull, edge),
            Stage::Polled(p) => p.configure(pull, edge),
        }
    }

    fn read(&mut self) -> Result<Level, Self::Error> {
        match self {
            Stage::Native(p) => p.read(),
            Stage::Polled(p) => p.read(),
        }
    }

    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, Self::Error> {
        match self {
            Stage::Native(p) => p.wait_for_edge(timeout),
            Stage::Polled(p) => p.wait_for_edge(timeout),
        }
    }

    fn inner(&self) -> Option<&dyn PinIn<Error = Self::Error>> {
        match self {
            Stage::Native(p) => Some(p),
            Stage::Polled(p) => Some(p),
        }
    }
}

/// Fully conditioned input pin
pub type Conditioned<P, C> = Debounce<Stage<P, C>, C>;

/// Wrap `pin` as `config` describes and apply its pull and edge
pub fn condition<P: PinIn, C: Clock + Clone>(
    pin: P,
    clock: C,
    config: &InputConfig,
) -> Result<Conditioned<P, C>, InputError<P::Error>> {
    config.validate()?;
    let stage = match &config.poll {
        Some(poll) => Stage::Polled(poll_edge(pin, clock.clone(), poll)?),
        None => Stage::Native(pin),
    };
    let mut chain = debounce(stage, clock, &config.debounce).map_err(InputError::Pin)?;
    chain
        .configure(config.pull, config.debounce.edge)
        .map_err(InputError::Pin)?;
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ManualClock, PinFault, ScriptPin};
    use cadence_core::config::{DebounceConfig, PollConfig};
    use cadence_hal::gpio::real;
    use core::time::Duration;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_plain_config_is_bare_pin() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High);
        let config = InputConfig {
            pull: Pull::Up,
            ..InputConfig::default()
        };
        let chain = condition(pin, &clock, &config).unwrap();
        assert!(chain.is_bypass());
        match chain.into_inner() {
            Stage::Native(pin) => assert_eq!(pin.pull, Pull::Up),
            Stage::Polled(_) => panic!("unexpected poll stage"),
        }
    }

    #[test]
    fn test_full_chain() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 30, Level::Low)
            .at(MS * 31, Level::High)
            .at(MS * 32, Level::Low);
        let config = InputConfig {
            pull: Pull::Up,
            debounce: DebounceConfig::new(Duration::ZERO, MS * 10).with_edge(Edge::Falling),
            poll: Some(PollConfig::new(100)),
        };
        let mut chain = condition(pin, &clock, &config).unwrap();
        assert!(!chain.is_bypass());
        assert_eq!(real::<PinFault>(&chain).number(), 17);

        // Sampling every 10ms finds the falling edge at 30ms
        assert_eq!(chain.wait_for_edge(Timeout::After(MS * 100)), Ok(true));
        assert_eq!(clock.now(), MS * 30);
        assert_eq!(chain.read(), Ok(Level::Low));
    }

    #[test]
    fn test_invalid_poll_rejected() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High);
        let config = InputConfig {
            poll: Some(PollConfig::new(0)),
            ..InputConfig::default()
        };
        assert!(matches!(
            condition(pin, &clock, &config),
            Err(InputError::Config(ConfigError::ZeroFrequency))
        ));
    }
}
