//! Test doubles shared by the driver unit tests

use alloc::vec::Vec;
use core::cell::Cell;
use core::time::Duration;

use cadence_hal::{Clock, Edge, Level, PinIn, Pull, Timeout};

/// Clock that only moves when slept on or advanced
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    sleeps: Cell<u32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d);
    }

    pub fn set(&self, t: Duration) {
        self.now.set(t);
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, d: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(d);
    }
}

/// Pin whose level follows a timeline on a [`ManualClock`]
///
/// `changes` holds `(time, level)` pairs in increasing time order; the pin
/// reads `initial` before the first one.
pub struct ScriptPin<'a> {
    pub clock: &'a ManualClock,
    pub initial: Level,
    pub changes: Vec<(Duration, Level)>,
    pub pull: Pull,
    pub edge: Edge,
    pub reads: u32,
    pub fail_configure: bool,
}

impl<'a> ScriptPin<'a> {
    pub fn new(clock: &'a ManualClock, initial: Level) -> Self {
        Self {
            clock,
            initial,
            changes: Vec::new(),
            pull: Pull::NoChange,
            edge: Edge::None,
            reads: 0,
            fail_configure: false,
        }
    }

    pub fn at(mut self, t: Duration, level: Level) -> Self {
        self.changes.push((t, level));
        self
    }

    fn level_at(&self, t: Duration) -> Level {
        self.changes
            .iter()
            .take_while(|(at, _)| *at <= t)
            .last()
            .map(|(_, level)| *level)
            .unwrap_or(self.initial)
    }

    fn next_change_after(&self, t: Duration) -> Option<Duration> {
        let mut current = self.level_at(t);
        for &(at, level) in &self.changes {
            if at > t && level != current {
                return Some(at);
            }
            if at > t {
                current = level;
            }
        }
        None
    }
}

/// Error reported by [`ScriptPin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl PinIn for ScriptPin<'_> {
    type Error = PinFault;

    fn name(&self) -> &str {
        "GPIO17"
    }

    fn number(&self) -> u32 {
        17
    }

    fn configure(&mut self, pull: Pull, edge: Edge) -> Result<(), PinFault> {
        if self.fail_configure {
            return Err(PinFault);
        }
        self.pull = pull;
        self.edge = edge;
        Ok(())
    }

    fn read(&mut self) -> Result<Level, PinFault> {
        self.reads += 1;
        Ok(self.level_at(self.clock.now()))
    }

    fn wait_for_edge(&mut self, timeout: Timeout) -> Result<bool, PinFault> {
        let now = self.clock.now();
        match (self.next_change_after(now), timeout.limit()) {
            (Some(at), Some(limit)) if at - now > limit => {
                self.clock.advance(limit);
                Ok(false)
            }
            (Some(at), _) => {
                self.clock.set(at);
                Ok(true)
            }
            (None, Some(limit)) => {
                self.clock.advance(limit);
                Ok(false)
            }
            (None, None) => panic!("waiting forever on a pin that never changes"),
        }
    }
}
