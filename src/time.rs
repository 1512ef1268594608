use crate::error::TimeParseError;
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Clock time of day in whole minutes, wrapping at 24h.
///
/// Used both as the global simulation clock and for train schedules. Ordering
/// compares within a single day; use [`Time::minutes_until`] for spans that
/// may cross midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Time {
    hours: u32,
    minutes: u32,
}

impl Time {
    /// Builds a time, normalizing overflowing minutes and wrapping hours at 24.
    pub fn new(hours: u32, minutes: u32) -> Time {
        Time::from_minutes(hours as i64 * 60 + minutes as i64)
    }

    pub fn from_minutes(total: i64) -> Time {
        let total = total.rem_euclid(MINUTES_PER_DAY);
        Time {
            hours: (total / 60) as u32,
            minutes: (total % 60) as u32,
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Minutes since midnight.
    pub fn to_minutes(&self) -> i64 {
        self.hours as i64 * 60 + self.minutes as i64
    }

    /// Adds (or with a negative argument, subtracts) minutes, wrapping at 24h.
    pub fn add_minutes(&mut self, minutes: i64) {
        *self = Time::from_minutes(self.to_minutes() + minutes);
    }

    pub fn plus_minutes(self, minutes: i64) -> Time {
        let mut t = self;
        t.add_minutes(minutes);
        t
    }

    /// Forward distance from `self` to `later`, assuming `later` is less than
    /// a day ahead. An earlier clock value is read as "the next day".
    pub fn minutes_until(&self, later: Time) -> i64 {
        (later.to_minutes() - self.to_minutes()).rem_euclid(MINUTES_PER_DAY)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}h{:02}", self.hours, self.minutes)
    }
}

impl FromStr for Time {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimeParseError(s.to_string());
        let (h, m) = s.split_once('h').ok_or_else(err)?;
        if h.is_empty() || m.is_empty() {
            return Err(err());
        }
        let hours: u32 = h.parse().map_err(|_| err())?;
        let minutes: u32 = m.parse().map_err(|_| err())?;
        if hours >= 24 || minutes >= 60 {
            return Err(err());
        }
        Ok(Time { hours, minutes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_minutes_carries_into_hours() {
        let mut t = Time::new(8, 55);
        t.add_minutes(10);
        assert_eq!(t, Time::new(9, 5));
    }

    #[test]
    fn add_minutes_wraps_at_midnight() {
        let mut t = Time::new(23, 50);
        t.add_minutes(20);
        assert_eq!(t, Time::new(0, 10));

        t.add_minutes(-15);
        assert_eq!(t, Time::new(23, 55));
    }

    #[test]
    fn ordering_is_by_hours_then_minutes() {
        assert!(Time::new(8, 0) < Time::new(8, 5));
        assert!(Time::new(7, 59) < Time::new(8, 0));
        assert!(Time::new(14, 10) > Time::new(9, 45));
    }

    #[test]
    fn minutes_until_crosses_midnight() {
        assert_eq!(Time::new(8, 0).minutes_until(Time::new(9, 30)), 90);
        assert_eq!(Time::new(23, 30).minutes_until(Time::new(0, 15)), 45);
        assert_eq!(Time::new(12, 0).minutes_until(Time::new(12, 0)), 0);
    }

    #[test]
    fn display_and_parse() {
        assert_eq!(Time::new(8, 5).to_string(), "08h05");
        assert_eq!("14h10".parse::<Time>().unwrap(), Time::new(14, 10));
        assert_eq!("00h10".parse::<Time>().unwrap(), Time::new(0, 10));
    }

    #[test]
    fn parse_rejects_malformed_times() {
        for bad in ["", "14:10", "h10", "14h", "25h00", "10h60", "aah10"] {
            assert!(bad.parse::<Time>().is_err(), "{} should not parse", bad);
        }
    }
}
