//! World Clock
//!
//! Handles simulation time as a turn counter plus an in-world wall clock.
//!
//! # Example
//!
//! ```
//! use sim_events::WorldClock;
//!
//! let mut clock = WorldClock::start(6);
//! assert_eq!(clock.stamp(), "06:00am");
//! clock.advance(30);
//! assert_eq!(clock.turn, 1);
//! assert_eq!(clock.stamp(), "06:30am");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes in a simulated day.
pub const MINUTES_PER_DAY: u64 = 24 * 60;

/// First hour (inclusive) of working hours.
pub const WORK_START_HOUR: u32 = 9;

/// Last hour (inclusive) of working hours.
pub const WORK_END_HOUR: u32 = 17;

/// A point in simulation time.
///
/// `elapsed_minutes` counts from midnight of day 1 and never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldClock {
    /// Monotonically increasing turn number.
    pub turn: u64,
    /// Minutes since midnight of day 1.
    pub elapsed_minutes: u64,
}

impl WorldClock {
    /// Creates a clock at turn 0 on day 1 at the given hour.
    pub fn start(start_hour: u32) -> Self {
        Self {
            turn: 0,
            elapsed_minutes: u64::from(start_hour.min(23)) * 60,
        }
    }

    /// Advances one turn and moves the wall clock forward.
    pub fn advance(&mut self, minutes: u32) {
        self.turn += 1;
        self.elapsed_minutes += u64::from(minutes);
    }

    /// Day number, starting at 1.
    pub fn day(&self) -> u64 {
        self.elapsed_minutes / MINUTES_PER_DAY + 1
    }

    /// Hour of day, 0..=23.
    pub fn hour(&self) -> u32 {
        ((self.elapsed_minutes % MINUTES_PER_DAY) / 60) as u32
    }

    /// Minute of hour, 0..=59.
    pub fn minute(&self) -> u32 {
        (self.elapsed_minutes % 60) as u32
    }

    pub fn is_night(&self) -> bool {
        let hour = self.hour();
        hour >= 22 || hour <= 5
    }

    pub fn is_work_hours(&self) -> bool {
        (WORK_START_HOUR..=WORK_END_HOUR).contains(&self.hour())
    }

    /// 12-hour stamp used in memory entries, e.g. "02:30pm".
    pub fn stamp(&self) -> String {
        let hour = self.hour();
        let suffix = if hour < 12 { "am" } else { "pm" };
        let display_hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{:02}:{:02}{}", display_hour, self.minute(), suffix)
    }
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::start(6)
    }
}

impl fmt::Display for WorldClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn_{}.day_{}.{}", self.turn, self.day(), self.stamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_start() {
        let clock = WorldClock::start(6);
        assert_eq!(clock.turn, 0);
        assert_eq!(clock.day(), 1);
        assert_eq!(clock.hour(), 6);
        assert_eq!(clock.minute(), 0);
    }

    #[test]
    fn test_clock_stamp_formats() {
        let mut clock = WorldClock::start(0);
        assert_eq!(clock.stamp(), "12:00am");
        clock.advance(12 * 60 + 5);
        assert_eq!(clock.stamp(), "12:05pm");
        clock.advance(60 * 2);
        assert_eq!(clock.stamp(), "02:05pm");
    }

    #[test]
    fn test_clock_day_rollover() {
        let mut clock = WorldClock::start(23);
        clock.advance(90);
        assert_eq!(clock.day(), 2);
        assert_eq!(clock.hour(), 0);
        assert_eq!(clock.minute(), 30);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = WorldClock::start(6);
        let mut last = clock;
        for step in [15u32, 30, 45, 0, 30] {
            clock.advance(step);
            assert!(clock.turn > last.turn);
            assert!(clock.elapsed_minutes >= last.elapsed_minutes);
            last = clock;
        }
    }

    #[test]
    fn test_night_and_work_hours() {
        assert!(WorldClock::start(22).is_night());
        assert!(WorldClock::start(3).is_night());
        assert!(!WorldClock::start(12).is_night());
        assert!(WorldClock::start(9).is_work_hours());
        assert!(WorldClock::start(17).is_work_hours());
        assert!(!WorldClock::start(18).is_work_hours());
    }

    #[test]
    fn test_clock_display() {
        let clock = WorldClock::start(6);
        assert_eq!(clock.to_string(), "turn_0.day_1.06:00am");
    }

    #[test]
    fn test_clock_roundtrip() {
        let mut clock = WorldClock::start(6);
        clock.advance(30);
        let json = serde_json::to_string(&clock).unwrap();
        assert_eq!(json, r#"{"turn":1,"elapsed_minutes":390}"#);
        let parsed: WorldClock = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, clock);
    }
}
