//! Debounce filter for input pins
//!
//! Mechanical switches and long cables bounce and pick up noise. The filter
//! combines two windows, either of which can be zero:
//!
//! - **denoise**: a new level must persist this long BEFORE it is reported.
//!   Short glitches never reach the caller.
//! - **debounce**: once a new level is reported it is held for this long
//!   AFTER the change, ignoring the bounces that follow. A differing level
//!   read after the window is accepted at once.
//!
//! ```text
//!  raw     ‾‾‾‾|_|‾‾‾‾‾‾|_____|‾|_|‾|________
//!  steady  ‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|_________________
//!                  denoise ─┘└─ debounce ─┘
//! ```
//!
//! The filter is evaluated lazily on every [`PinIn::read`]; there is no
//! background sampling.

use core::fmt;
use core::time::Duration;

use cadence_core::config::DebounceConfig;
use cadence_hal::{Clock, Edge, Level, PinIn, Pull, Timeout};

/// Which window the filter is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for a differing level to persist; holds the onset of the
    /// current glitch, if one is pending
    Denoise { glitch_since: Option<Duration> },
    /// Holding the last accepted level
    Debounce,
}

/// Input pin with a debounce filter
///
/// Created through [`debounce`]. The filter state belongs to this wrapper
/// alone; all access goes through `&mut self`.
pub struct Debounced<P, C> {
    pin: P,
    clock: C,
    denoise: Duration,
    debounce: Duration,
    armed: Edge,
    steady: Level,
    last_steady: Duration,
    phase: Phase,
}

/// Result of [`debounce`]
pub enum Debounce<P, C> {
    /// Both windows were zero; this is the pin that was passed in
    Bypass(P),
    /// Pin wrapped in a filter
    Filtered(Debounced<P, C>),
}

/// Put a debounce filter in front of `pin`
///
/// With both windows zero nothing is inserted and `pin` comes back as
/// [`Debounce::Bypass`]. Otherwise the raw pin is switched to detect both
/// edges, keeping its pull, and sampled once to seed the filter.
pub fn debounce<P: PinIn, C: Clock>(
    pin: P,
    clock: C,
    config: &DebounceConfig,
) -> Result<Debounce<P, C>, P::Error> {
    if config.is_bypass() {
        return Ok(Debounce::Bypass(pin));
    }
    let mut pin = pin;
    pin.configure(Pull::NoChange, Edge::Both)?;
    let steady = pin.read()?;
    let now = clock.now();
    debug!(
        "debounce {}: denoise={}us debounce={}us",
        pin.number(),
        config.denoise.as_micros() as u64,
        config.debounce.as_micros() as u64
    );
    Ok(Debounce::Filtered(Debounced {
        pin,
        clock,
        denoise: config.denoise,
        debounce: config.debounce,
        armed: config.edge,
        steady,
        last_steady: now,
        phase: Phase::Denoise { glitch_since: None },
    }))
}

impl<P: PinIn, C: Clock> Debounced<P, C> {
    /// The wrapped pin
    pub fn get_ref(&self) -> &P {
        &self.pin
    }

    /// The wrapped pin, mutably
    ///
    /// Reading it directly bypasses the filter without updating it.
    pub fn get_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Drop the filter and return the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }

    /// Edge [`PinIn::wait_for_edge`] reports
    pub fn armed(&self) -> Edge {
        self.armed
    }

    /// Last level that passed the filter, without sampling the pin
    pub fn steady(&self) -> Level {
        self.steady
    }

    /// How much longer a pending glitch must persist to be accepted
    ///
    /// Zero when no glitch is pending.
    pub fn denoise_remaining(&self) -> Duration {
        match self.phase {
            Phase::Denoise {
                glitch_since: Some(since),
            } => self
                .denoise
                .saturating_sub(self.clock.now().saturating_sub(since)),
            _ => Duration::ZERO,
        }
    }

    /// How much longer the last accepted level is held regardless of input
    pub fn debounce_remaining(&self) -> Duration {
        match self.phase {
            Phase::Debounce => self
                .debounce
                .saturating_sub(self.clock.now().saturating_sub(self.last_steady)),
            Phase::Denoise { .. } => Duration::ZERO,
        }
    }

    /// Restart the filter from `level`, as of now
    fn resync(&mut self, level: Level) {
        self.steady = level;
        self.last_steady = self.clock.now();
        self.phase = Phase::Denoise { glitch_since: None };
    }

    fn filter(&mut self, raw: Level) -> Level {
        if raw == self.steady {
            // A glitch that ended before the denoise window is forgotten
            if let Phase::Denoise { glitch_since } = &mut self.phase {
                *glitch_since = None;
            }
            return self.steady;
        }

        let now = self.clock.now();
        let accept = match &mut self.phase {
            Phase::Denoise { glitch_since } => {
                let since = *glitch_since.get_or_insert(now);
                now.saturating_sub(since) >= self.denoise
            }
            // Only a resync leaves this phase
            Phase::Debounce => now.saturating_sub(self.last_steady) >= self.debounce,
        };
        if accept {
            trace!("debounce {}: {} -> {}", self.pin.number(), self.steady, raw);
            self.steady = raw;
            self.last_steady = now;
            self.phase = Phase::Debounce;
        }
        self.steady
    }
}

impl<P: PinIn, C: Clock> PinIn for Debounced<P, C> {
    type Error = P::Error;

    fn name(&self) -> &str {
        self.pin.name()
    }

    fn number(&self) -> u32 {
        self.pin.number()
    }

    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), Self::Error> {
        let configured = self.pin.configure(pull, Edge::Both);
        self.armed = edge;
        // Resync even when configuring failed
        let level = self.pin.read()?;
        self.resync(level);
        configured
    }

    fn read(&mut self) -> Result<Level, Self::Error> {
        let raw = self.pin.read()?;
        Ok(self.filter(raw))
    }

    /// Wait for an edge on the raw pin that lands on the armed side
    ///
    /// Every observed edge resyncs the filter to the level read after it,
    /// including edges on the wrong side. A call that returns `Ok(false)`
    /// may therefore still have moved [`Debounced::steady`].
    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, Self::Error> {
        let start = self.clock.now();
        let mut remaining = timeout;
        loop {
            if !self.pin.wait_for_edge(remaining)? {
                return Ok(false);
            }
            let level = self.pin.read()?;
            self.resync(level);
            if self.armed.accepts(level) {
                return Ok(true);
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if let Some(limit) = timeout.limit() {
                if elapsed >= limit {
                    return Ok(false);
                }
            }
            remaining = timeout.remaining(elapsed);
        }
    }

    fn inner(&self) -> Option<&dyn PinIn<Error = Self::Error>> {
        Some(&self.pin)
    }
}

impl<P: PinIn, C> fmt::Display for Debounced<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Debounced{{{}({})}}", self.pin.name(), self.pin.number())
    }
}

impl<P: PinIn, C: Clock> Debounce<P, C> {
    /// Whether no filter was inserted
    pub fn is_bypass(&self) -> bool {
        matches!(self, Debounce::Bypass(_))
    }

    /// The raw pin, with any filter dropped
    pub fn into_inner(self) -> P {
        match self {
            Debounce::Bypass(pin) => pin,
            Debounce::Filtered(d) => d.into_inner(),
        }
    }
}

impl<P: PinIn, C: Clock> PinIn for Debounce<P, C> {
    type Error = P::Error;

    fn name(&self) -> &str {
        match self {
            Debounce::Bypass(pin) => pin.name(),
            Debounce::Filtered(d) => d.name(),
        }
    }

    fn number(&self) -> u32 {
        match self {
            Debounce::Bypass(pin) => pin.number(),
            Debounce::Filtered(d) => d.number(),
        }
    }

    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), Self::Error> {
        match self {
            Debounce::Bypass(pin) => pin.configure(pull, edge),
            Debounce::Filtered(d) => d.configure(pull, edge),
        }
    }

    fn read(&mut self) -> Result<Level, Self::Error> {
        match self {
            Debounce::Bypass(pin) => pin.read(),
            Debounce::Filtered(d) => d.read(),
        }
    }

    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, Self::Error> {
        match self {
            Debounce::Bypass(pin) => pin.wait_for_edge(timeout),
            Debounce::Filtered(d) => d.wait_for_edge(timeout),
        }
    }

    fn inner(&self) -> Option<&dyn PinIn<Error = Self::Error>> {
        match self {
            Debounce::Bypass(pin) => Some(pin),
            Debounce::Filtered(d) => Some(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ManualClock, PinFault, ScriptPin};
    use alloc::vec;
    use alloc::vec::Vec;

    const MS: Duration = Duration::from_millis(1);

    fn filtered<'a>(
        pin: ScriptPin<'a>,
        clock: &'a ManualClock,
        denoise: Duration,
        debounce_window: Duration,
    ) -> Debounced<ScriptPin<'a>, &'a ManualClock> {
        let config = DebounceConfig::new(denoise, debounce_window).with_edge(Edge::Both);
        match debounce(pin, clock, &config).unwrap() {
            Debounce::Filtered(d) => d,
            Debounce::Bypass(_) => panic!("expected a filter"),
        }
    }

    #[test]
    fn test_zero_windows_bypass() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High);
        let result = debounce(pin, &clock, &DebounceConfig::default()).unwrap();
        assert!(result.is_bypass());

        // The pin was not touched
        let pin = result.into_inner();
        assert_eq!(pin.reads, 0);
        assert_eq!(pin.edge, Edge::None);
    }

    #[test]
    fn test_wrap_configures_both_edges() {
        let clock = ManualClock::new();
        let mut pin = ScriptPin::new(&clock, Level::High);
        pin.pull = Pull::Up;
        let d = filtered(pin, &clock, MS, Duration::ZERO);
        assert_eq!(d.get_ref().edge, Edge::Both);
        assert_eq!(d.get_ref().pull, Pull::NoChange);
        assert_eq!(d.get_ref().reads, 1);
        assert_eq!(d.steady(), Level::High);
    }

    #[test]
    fn test_wrap_error_propagates() {
        let clock = ManualClock::new();
        let mut pin = ScriptPin::new(&clock, Level::High);
        pin.fail_configure = true;
        let config = DebounceConfig::new(MS, MS);
        assert!(matches!(debounce(pin, &clock, &config), Err(PinFault)));
    }

    #[test]
    fn test_short_glitch_ignored() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 13, Level::High);
        let mut d = filtered(pin, &clock, MS * 5, Duration::ZERO);

        for _ in 0..30 {
            assert_eq!(d.read(), Ok(Level::High));
            clock.advance(MS);
        }
    }

    #[test]
    fn test_sustained_change_accepted_once() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High).at(MS * 10, Level::Low);
        let mut d = filtered(pin, &clock, MS * 5, Duration::ZERO);

        let mut changes = 0;
        let mut last = Level::High;
        for t in 0..30 {
            let level = d.read().unwrap();
            if level != last {
                changes += 1;
                // Onset seen at 10ms, accepted 5ms later
                assert_eq!(t, 15);
                last = level;
            }
            clock.advance(MS);
        }
        assert_eq!(changes, 1);
        assert_eq!(last, Level::Low);
    }

    #[test]
    fn test_glitch_onset_resets() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 13, Level::High)
            .at(MS * 14, Level::Low);
        let mut d = filtered(pin, &clock, MS * 5, Duration::ZERO);

        for t in 0..30u32 {
            let expected = if t >= 19 { Level::Low } else { Level::High };
            assert_eq!(d.read(), Ok(expected), "at {}ms", t);
            clock.advance(MS);
        }
    }

    #[test]
    fn test_debounce_holds_after_change() {
        let clock = ManualClock::new();
        // Bounces for 4ms after the first falling edge
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 11, Level::High)
            .at(MS * 12, Level::Low)
            .at(MS * 13, Level::High)
            .at(MS * 14, Level::Low);
        let mut d = filtered(pin, &clock, Duration::ZERO, MS * 20);

        for t in 0..40u32 {
            let expected = if t >= 10 { Level::Low } else { Level::High };
            assert_eq!(d.read(), Ok(expected), "at {}ms", t);
            clock.advance(MS);
        }
    }

    #[test]
    fn test_debounce_window_expires() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 15, Level::High);
        let mut d = filtered(pin, &clock, Duration::ZERO, MS * 20);

        clock.set(MS * 10);
        assert_eq!(d.read(), Ok(Level::Low));
        assert_eq!(d.debounce_remaining(), MS * 20);

        clock.set(MS * 20);
        assert_eq!(d.read(), Ok(Level::Low));
        assert_eq!(d.debounce_remaining(), MS * 10);

        clock.set(MS * 30);
        assert_eq!(d.read(), Ok(Level::High));
    }

    #[test]
    fn test_change_after_debounce_window_skips_denoise() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::Low)
            .at(MS * 2000, Level::High)
            .at(MS * 4000, Level::Low);
        let mut d = filtered(pin, &clock, MS * 1000, Duration::ZERO);

        clock.set(MS * 1000);
        assert_eq!(d.read(), Ok(Level::Low));
        // Glitch onset
        clock.set(MS * 2000);
        assert_eq!(d.read(), Ok(Level::Low));
        clock.set(MS * 3000);
        assert_eq!(d.read(), Ok(Level::High));
        // Debounce window is zero, the next change goes straight through
        clock.set(MS * 4000);
        assert_eq!(d.read(), Ok(Level::Low));
    }

    #[test]
    fn test_both_windows() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 20, Level::High)
            .at(MS * 22, Level::Low)
            .at(MS * 40, Level::High);
        let mut d = filtered(pin, &clock, MS * 5, MS * 20);

        let mut changes = Vec::new();
        let mut last = Level::High;
        for t in 0..50u32 {
            let expected = match t {
                0..=14 => Level::High,
                15..=39 => Level::Low,
                _ => Level::High,
            };
            let level = d.read().unwrap();
            assert_eq!(level, expected, "at {}ms", t);
            if level != last {
                changes.push(t);
                last = level;
            }
            clock.advance(MS);
        }
        // The bounce at 20ms is held off; the release at 40ms is taken
        // as soon as the window has passed
        assert_eq!(changes, vec![15, 40]);
    }

    #[test]
    fn test_denoise_remaining() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::Low).at(MS * 2, Level::High);
        let mut d = filtered(pin, &clock, MS * 10, Duration::ZERO);
        assert_eq!(d.denoise_remaining(), Duration::ZERO);

        clock.set(MS * 2);
        assert_eq!(d.read(), Ok(Level::Low));
        clock.set(MS * 6);
        assert_eq!(d.denoise_remaining(), MS * 6);
    }

    #[test]
    fn test_steady_reads_pass_through() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High);
        let mut d = filtered(pin, &clock, MS, MS);
        for _ in 0..5 {
            assert_eq!(d.read(), Ok(Level::High));
        }
        assert_eq!(d.get_ref().reads, 6);
    }

    #[test]
    fn test_configure_resets_and_rearms() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High).at(MS * 10, Level::Low);
        let mut d = filtered(pin, &clock, MS * 50, Duration::ZERO);

        clock.set(MS * 12);
        assert_eq!(d.read(), Ok(Level::High));

        d.configure(Pull::Down, Edge::Falling).unwrap();
        assert_eq!(d.armed(), Edge::Falling);
        assert_eq!(d.get_ref().edge, Edge::Both);
        assert_eq!(d.get_ref().pull, Pull::Down);
        assert_eq!(d.steady(), Level::Low);
        assert_eq!(d.read(), Ok(Level::Low));
    }

    #[test]
    fn test_configure_error_after_reset() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High).at(MS * 10, Level::Low);
        let mut d = filtered(pin, &clock, MS * 50, Duration::ZERO);

        clock.set(MS * 12);
        d.get_mut().fail_configure = true;
        assert_eq!(d.configure(Pull::Up, Edge::Rising), Err(PinFault));
        assert_eq!(d.armed(), Edge::Rising);
        assert_eq!(d.steady(), Level::Low);
    }

    #[test]
    fn test_wait_for_edge_matches_armed() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 20, Level::High);
        let mut d = filtered(pin, &clock, MS, Duration::ZERO);
        d.configure(Pull::NoChange, Edge::Rising).unwrap();

        // The falling edge at 10ms is skipped
        assert_eq!(d.wait_for_edge(Timeout::Forever), Ok(true));
        assert_eq!(clock.now(), MS * 20);
        assert_eq!(d.steady(), Level::High);
    }

    #[test]
    fn test_wait_for_edge_timeout() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High)
            .at(MS * 10, Level::Low)
            .at(MS * 40, Level::High);
        let mut d = filtered(pin, &clock, MS, Duration::ZERO);
        d.configure(Pull::NoChange, Edge::Rising).unwrap();

        // Only a falling edge arrives in time
        assert_eq!(d.wait_for_edge(Timeout::After(MS * 25)), Ok(false));
        assert_eq!(clock.now(), MS * 25);
        // The falling edge was still taken in
        assert_eq!(d.steady(), Level::Low);
    }

    #[test]
    fn test_wait_for_edge_poll_does_not_block() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High).at(MS * 10, Level::Low);
        let mut d = filtered(pin, &clock, MS, Duration::ZERO);
        assert_eq!(d.wait_for_edge(Timeout::POLL), Ok(false));
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_display() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High);
        let d = filtered(pin, &clock, MS, Duration::ZERO);
        assert_eq!(alloc::format!("{}", d), "Debounced{GPIO17(17)}");
    }

    #[test]
    fn test_inner_is_wrapped_pin() {
        let clock = ManualClock::new();
        let pin = ScriptPin::new(&clock, Level::High);
        let d = filtered(pin, &clock, MS, Duration::ZERO);
        let inner = d.inner().unwrap();
        assert!(inner.inner().is_none());
        assert_eq!(inner.number(), 17);
    }
}
