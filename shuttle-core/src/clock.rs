use std::fmt::Display;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use thiserror::Error;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Display for Meridiem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Meridiem::Am => write!(f, "AM"),
            Meridiem::Pm => write!(f, "PM"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid clock time '{0}', expected h:mm AM|PM")]
pub struct ClockParseError(pub String);

/// Wall-clock time in 12-hour form, as shown to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
    meridiem: Meridiem,
}

impl ClockTime {
    pub const FIVE_PM: ClockTime = ClockTime {
        hour: 5,
        minute: 0,
        meridiem: Meridiem::Pm,
    };

    pub fn new(hour: u8, minute: u8, meridiem: Meridiem) -> Option<Self> {
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            meridiem,
        })
    }

    fn from_minute_of_day(minutes: i64) -> Self {
        let minutes = minutes.rem_euclid(MINUTES_PER_DAY);
        let hour24 = (minutes / 60) as u8;
        let minute = (minutes % 60) as u8;
        let meridiem = if hour24 < 12 { Meridiem::Am } else { Meridiem::Pm };
        let hour = match hour24 % 12 {
            0 => 12,
            h => h,
        };
        Self {
            hour,
            minute,
            meridiem,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    pub fn hour24(&self) -> u32 {
        let base = u32::from(self.hour % 12);
        match self.meridiem {
            Meridiem::Am => base,
            Meridiem::Pm => base + 12,
        }
    }

    fn minute_of_day(&self) -> i64 {
        i64::from(self.hour24()) * 60 + i64::from(self.minute)
    }

    pub fn parse(input: &str) -> Result<Self, ClockParseError> {
        let err = || ClockParseError(input.to_string());
        let trimmed = input.trim();
        let split = trimmed.len().saturating_sub(2);
        if !trimmed.is_char_boundary(split) {
            return Err(err());
        }
        let (clock, meridiem) = trimmed.split_at(split);
        let meridiem = match meridiem.to_ascii_uppercase().as_str() {
            "AM" => Meridiem::Am,
            "PM" => Meridiem::Pm,
            _ => return Err(err()),
        };
        let (hour, minute) = clock.trim_end().split_once(':').ok_or_else(err)?;
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(err());
        }
        let hour: u8 = hour.parse().map_err(|_| err())?;
        let minute: u8 = minute.parse().map_err(|_| err())?;
        Self::new(hour, minute, meridiem).ok_or_else(err)
    }

    pub fn from_instant(instant: DateTime<Utc>, zone: FixedOffset) -> Self {
        let local = instant.with_timezone(&zone);
        Self::from_minute_of_day(i64::from(local.hour()) * 60 + i64::from(local.minute()))
    }

    /// Combines a calendar date in `zone` with this clock value.
    pub fn to_instant(&self, date: NaiveDate, zone: FixedOffset) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN) + Duration::minutes(self.minute_of_day());
        let utc = local - Duration::seconds(i64::from(zone.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self::from_minute_of_day(self.minute_of_day() + minutes)
    }

    pub fn top_of_hour(&self) -> Self {
        Self {
            minute: 0,
            ..*self
        }
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02} {}", self.hour, self.minute, self.meridiem)
    }
}

impl std::str::FromStr for ClockTime {
    type Err = ClockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClockTime::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(s: &str) -> ClockTime {
        ClockTime::parse(s).expect("valid clock time")
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(clock("5:00 PM"), ClockTime::FIVE_PM);
        assert_eq!(clock(" 05:00 pm "), ClockTime::FIVE_PM);
        assert_eq!(clock("12:07AM").to_string(), "12:07 AM");
        assert_eq!(clock("9:30 am").to_string(), "9:30 AM");

        for bad in ["", "5 PM", "13:00 PM", "0:10 AM", "5:7 PM", "5:60 PM", "5:00", "x:00 PM"] {
            assert!(ClockTime::parse(bad).is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_hour24() {
        assert_eq!(clock("12:15 AM").hour24(), 0);
        assert_eq!(clock("12:15 PM").hour24(), 12);
        assert_eq!(clock("11:59 PM").hour24(), 23);
    }

    #[test]
    fn test_minute_arithmetic() {
        assert_eq!(clock("6:47 PM").plus_minutes(1), clock("6:48 PM"));
        assert_eq!(clock("11:59 AM").plus_minutes(1), clock("12:00 PM"));
        assert_eq!(clock("11:59 PM").plus_minutes(1), clock("12:00 AM"));
        assert_eq!(clock("12:00 AM").plus_minutes(-1), clock("11:59 PM"));
    }

    #[test]
    fn test_top_of_hour_keeps_meridiem() {
        assert_eq!(clock("5:13 PM").top_of_hour(), clock("5:00 PM"));
        assert_eq!(clock("12:30 PM").top_of_hour(), clock("12:00 PM"));
        assert_eq!(clock("12:59 AM").top_of_hour(), clock("12:00 AM"));
    }

    #[test]
    fn test_instant_conversion_uses_zone() {
        let zone = FixedOffset::east_opt(8 * 3600).unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 10, 47, 30).unwrap();
        let local = ClockTime::from_instant(instant, zone);
        assert_eq!(local, clock("6:47 PM"));

        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let back = clock("6:48 PM").to_instant(date, zone);
        assert_eq!(back, Utc.with_ymd_and_hms(2024, 3, 9, 10, 48, 0).unwrap());

        let late = clock("1:00 AM").to_instant(date, zone);
        assert_eq!(late, Utc.with_ymd_and_hms(2024, 3, 8, 17, 0, 0).unwrap());
    }
}
