// src/simulation/clock.rs

use serde::Serialize;

/// One tick advances model time by 15 simulated minutes.
pub const TICK_MINUTES: u32 = 15;

/// The operating day starts at 09:00.
pub const DAY_START: TimeOfDay = TimeOfDay { minutes: 9 * 60 };

/// A clock reading at or past 23:45 wraps back to the start of the day,
/// so 23:30 is the last observable tick of a day.
const DAY_WRAP_MINUTES: u32 = 23 * 60 + 45;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Fixed travel rate: 3 minutes per distance unit, outbound and return.
pub const MINUTES_PER_DISTANCE_UNIT: u32 = 3;

pub fn travel_minutes(distance: u32) -> u32 {
    distance * MINUTES_PER_DISTANCE_UNIT
}

/// A wall-clock instant within a day, used for delivery-window checks
/// and event timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct TimeOfDay {
    minutes: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            minutes: (hour * 60 + minute) % MINUTES_PER_DAY,
        }
    }

    pub fn hour(&self) -> u32 {
        self.minutes / 60
    }

    pub fn minute(&self) -> u32 {
        self.minutes % 60
    }

    pub fn minutes_of_day(&self) -> u32 {
        self.minutes
    }

    /// Projects this instant forward, wrapping past midnight. Used for
    /// "will the store be open when the vehicle gets there" checks.
    pub fn plus_minutes(self, minutes: u32) -> TimeOfDay {
        TimeOfDay {
            minutes: (self.minutes + minutes) % MINUTES_PER_DAY,
        }
    }

    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.hhmm()
    }
}

/// Model time. Window checks read the wrapping time-of-day; vehicle ETAs
/// live on the monotone elapsed-minute axis so a trip spanning the
/// end-of-day wrap still completes.
#[derive(Debug, Clone)]
pub struct SimClock {
    time_of_day: TimeOfDay,
    elapsed_minutes: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            time_of_day: DAY_START,
            elapsed_minutes: 0,
        }
    }

    pub fn now(&self) -> TimeOfDay {
        self.time_of_day
    }

    /// Minutes elapsed since the simulation started; never wraps.
    pub fn elapsed(&self) -> u64 {
        self.elapsed_minutes
    }

    pub fn advance(&mut self) {
        self.elapsed_minutes += u64::from(TICK_MINUTES);
        let next = self.time_of_day.minutes + TICK_MINUTES;
        self.time_of_day = if next >= DAY_WRAP_MINUTES {
            DAY_START
        } else {
            TimeOfDay { minutes: next }
        };
    }

    /// ETA on the monotone axis and the projected time-of-day after
    /// travelling for `minutes`.
    pub fn eta_after(&self, minutes: u32) -> (u64, TimeOfDay) {
        (
            self.elapsed_minutes + u64::from(minutes),
            self.time_of_day.plus_minutes(minutes),
        )
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_nine() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), TimeOfDay::new(9, 0));
        assert_eq!(clock.elapsed(), 0);
    }

    #[test]
    fn advances_in_quarter_hours() {
        let mut clock = SimClock::new();
        clock.advance();
        assert_eq!(clock.now(), TimeOfDay::new(9, 15));
        clock.advance();
        assert_eq!(clock.now(), TimeOfDay::new(9, 30));
        assert_eq!(clock.elapsed(), 30);
    }

    #[test]
    fn wraps_after_half_past_eleven_pm() {
        let mut clock = SimClock::new();
        // 09:00 -> 23:30 is 58 ticks; the 59th wraps to 09:00.
        for _ in 0..58 {
            clock.advance();
        }
        assert_eq!(clock.now(), TimeOfDay::new(23, 30));
        clock.advance();
        assert_eq!(clock.now(), TimeOfDay::new(9, 0));
        // The monotone axis keeps counting through the wrap.
        assert_eq!(clock.elapsed(), 59 * 15);
    }

    #[test]
    fn eta_projection_crosses_midnight() {
        let mut clock = SimClock::new();
        while clock.now() != TimeOfDay::new(23, 30) {
            clock.advance();
        }
        let (eta, arrival) = clock.eta_after(60);
        assert_eq!(eta, clock.elapsed() + 60);
        assert_eq!(arrival, TimeOfDay::new(0, 30));
    }

    #[test]
    fn travel_rate_is_three_minutes_per_unit() {
        assert_eq!(travel_minutes(7), 21);
        assert_eq!(travel_minutes(0), 0);
    }
}
