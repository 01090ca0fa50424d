//! Tick count to absolute time conversion
//!
//! The node reports relative time as a 32-bit tick counter running at
//! `TICKS_PER_SECOND`. A `TimeRef` captured when a `reset_time`
//! acknowledgement is processed anchors those ticks to the wall clock.

use crate::protocol::constants::TICKS_PER_SECOND;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock anchor for the node's tick counter
///
/// Zero at startup, overwritten wholesale on each `reset_time` ACK, never
/// otherwise mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRef {
    pub secs: u64,
    pub usecs: u32,
}

impl TimeRef {
    /// Capture the current wall-clock time
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        TimeRef {
            secs: elapsed.as_secs(),
            usecs: elapsed.subsec_micros(),
        }
    }
}

/// Convert a node tick count into absolute (seconds, microseconds)
///
/// Microsecond overflow carries into the seconds field, so the result is
/// always normalized (usecs < 1_000_000).
pub fn absolute(time_ref: &TimeRef, ticks: u32) -> (u64, u32) {
    let mut secs = time_ref.secs + u64::from(ticks / TICKS_PER_SECOND);
    let tick_usecs = (1_000_000u64 * u64::from(ticks % TICKS_PER_SECOND))
        / u64::from(TICKS_PER_SECOND);
    let mut usecs = u64::from(time_ref.usecs) + tick_usecs;
    if usecs >= 1_000_000 {
        secs += 1;
        usecs -= 1_000_000;
    }
    (secs, usecs as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_reference() {
        let time_ref = TimeRef::default();
        assert_eq!(absolute(&time_ref, 0), (0, 0));
        assert_eq!(absolute(&time_ref, TICKS_PER_SECOND), (1, 0));
        assert_eq!(absolute(&time_ref, 3 * TICKS_PER_SECOND), (3, 0));
    }

    #[test]
    fn test_overflow_on_usec_sum() {
        // Reference microseconds just below the carry threshold plus almost a
        // full tick second must carry into the seconds field.
        let time_ref = TimeRef { secs: 0, usecs: 999_999 };
        let (secs, usecs) = absolute(&time_ref, TICKS_PER_SECOND - 1);
        assert_eq!(secs, 1);
        assert!(usecs < 1_000_000);
    }

    #[test]
    fn test_fractional_ticks() {
        let time_ref = TimeRef { secs: 100, usecs: 0 };
        // Half a tick second is half a million microseconds
        let (secs, usecs) = absolute(&time_ref, TICKS_PER_SECOND / 2);
        assert_eq!(secs, 100);
        assert_eq!(usecs, 500_000);
    }

    #[test]
    fn test_now_is_nonzero() {
        let time_ref = TimeRef::now();
        assert!(time_ref.secs > 0);
    }
}
