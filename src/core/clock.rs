//! Scan timestamps.
//!
//! Wraps the realtime and monotonic time sources used to stamp each scan
//! cycle and to compute the interval between two cycles.

use log::debug;
use serde::Serialize;

use crate::error::{Result, ScanError};
use crate::platform;

/// Wall-clock reading, split the way the display layer consumes it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Realtime {
    /// Seconds since the Unix epoch
    pub secs: i64,
    /// Milliseconds since the Unix epoch
    pub ms: u64,
}

/// Source of time readings for the scan clock
pub trait ClockSource {
    /// Current wall-clock time
    fn now_realtime(&self) -> Realtime;

    /// Current monotonic time in milliseconds
    fn now_monotonic(&self) -> u64;
}

/// Clock source backed by the host clocks
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_realtime(&self) -> Realtime {
        let now = chrono::Utc::now();
        Realtime {
            secs: now.timestamp(),
            ms: u64::try_from(now.timestamp_millis()).unwrap_or(0),
        }
    }

    fn now_monotonic(&self) -> u64 {
        platform::monotonic_ms()
    }
}

/// Per-machine timing state advanced once per scan cycle
#[derive(Debug, Clone, Default)]
pub struct ScanClock {
    realtime: Realtime,
    monotonic_ms: u64,
    prev_monotonic_ms: u64,
    first_scan_done: bool,
}

impl ScanClock {
    /// Create a clock holding an initial realtime stamp.
    pub fn new(source: &dyn ClockSource) -> Self {
        Self {
            realtime: source.now_realtime(),
            ..Default::default()
        }
    }

    /// Move to the next cycle.
    ///
    /// The first call uses the bootstrap values `previous = 0, current = 1`
    /// so the first interval is positive. Later calls read the monotonic
    /// source and fail if it did not move forward.
    pub fn advance(&mut self, source: &dyn ClockSource) -> Result<()> {
        if self.first_scan_done {
            self.prev_monotonic_ms = self.monotonic_ms;
            self.monotonic_ms = source.now_monotonic();
        } else {
            self.prev_monotonic_ms = 0;
            self.monotonic_ms = 1;
            self.first_scan_done = true;
        }
        self.realtime = source.now_realtime();

        if self.monotonic_ms <= self.prev_monotonic_ms {
            return Err(ScanError::ClockNotAdvancing {
                previous: self.prev_monotonic_ms,
                current: self.monotonic_ms,
            });
        }

        debug!(
            "scan clock advanced to {} ms (+{} ms)",
            self.monotonic_ms,
            self.elapsed_ms()
        );
        Ok(())
    }

    pub fn realtime(&self) -> Realtime {
        self.realtime
    }

    pub fn monotonic_ms(&self) -> u64 {
        self.monotonic_ms
    }

    pub fn prev_monotonic_ms(&self) -> u64 {
        self.prev_monotonic_ms
    }

    /// Milliseconds between the last two cycles
    pub fn elapsed_ms(&self) -> u64 {
        self.monotonic_ms.saturating_sub(self.prev_monotonic_ms)
    }

    pub fn first_scan_done(&self) -> bool {
        self.first_scan_done
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Clock source replaying scripted monotonic readings
    pub struct ScriptedClock {
        readings: RefCell<VecDeque<u64>>,
    }

    impl ScriptedClock {
        pub fn new(readings: &[u64]) -> Self {
            Self {
                readings: RefCell::new(readings.iter().copied().collect()),
            }
        }
    }

    impl ClockSource for ScriptedClock {
        fn now_realtime(&self) -> Realtime {
            Realtime {
                secs: 1_700_000_000,
                ms: 1_700_000_000_000,
            }
        }

        fn now_monotonic(&self) -> u64 {
            self.readings.borrow_mut().pop_front().unwrap_or(0)
        }
    }

    #[test]
    fn test_first_advance_uses_bootstrap_values() {
        let source = ScriptedClock::new(&[500]);
        let mut clock = ScanClock::new(&source);
        assert!(!clock.first_scan_done());

        clock.advance(&source).unwrap();
        assert_eq!(clock.prev_monotonic_ms(), 0);
        assert_eq!(clock.monotonic_ms(), 1);
        assert_eq!(clock.elapsed_ms(), 1);
        assert!(clock.first_scan_done());
    }

    #[test]
    fn test_later_advances_read_the_source() {
        let source = ScriptedClock::new(&[100, 250]);
        let mut clock = ScanClock::new(&source);

        clock.advance(&source).unwrap();
        clock.advance(&source).unwrap();
        assert_eq!(clock.prev_monotonic_ms(), 1);
        assert_eq!(clock.monotonic_ms(), 100);

        clock.advance(&source).unwrap();
        assert_eq!(clock.prev_monotonic_ms(), 100);
        assert_eq!(clock.monotonic_ms(), 250);
        assert_eq!(clock.elapsed_ms(), 150);
    }

    #[test]
    fn test_stalled_clock_is_rejected() {
        let source = ScriptedClock::new(&[100, 100]);
        let mut clock = ScanClock::new(&source);
        clock.advance(&source).unwrap();
        clock.advance(&source).unwrap();

        let err = clock.advance(&source).unwrap_err();
        assert!(matches!(
            err,
            ScanError::ClockNotAdvancing {
                previous: 100,
                current: 100
            }
        ));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let source = SystemClock;
        let a = source.now_monotonic();
        let b = source.now_monotonic();
        assert!(b >= a);
        assert!(source.now_realtime().secs > 0);
    }
}
