//! Time source for assignment timestamps and event log entries.
//!
//! RULE: Nothing in the engine reads the system time directly.
//! Production wires SystemClock; tests wire FixedClock so runs are
//! reproducible down to the recorded timestamps.

use chrono::{DateTime, Duration, TimeZone, Utc};

pub trait Clock: Send {
    /// Current instant. FixedClock advances on every call.
    fn now(&mut self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock: starts at `start`, advances `step` per reading.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: DateTime<Utc>,
    step:    Duration,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self { current: start, step }
    }

    /// 2024-01-01T09:00:00Z, one second per reading.
    pub fn default_test() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Self::new(start, Duration::seconds(1))
    }

    pub fn peek(&self) -> DateTime<Utc> {
        self.current
    }
}

impl Clock for FixedClock {
    fn now(&mut self) -> DateTime<Utc> {
        let now = self.current;
        self.current += self.step;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_by_step() {
        let mut clock = FixedClock::default_test();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(second - first, Duration::seconds(1));
        assert_eq!(clock.peek() - second, Duration::seconds(1));
    }
}
