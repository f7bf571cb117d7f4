// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Local, TimeDelta, TimeZone, Timelike};

use crate::feed::feedclient::WINDOW_LEN;

/// Source of the current instant in local time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// The local system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that is stuck at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Formats the wall-clock time of `time` as `H:MM`.
pub fn time_label<T: Timelike>(time: &T) -> String {
    format!("{}:{:02}", time.hour(), time.minute())
}

/// Labels for the minute of `now` and the preceding minutes, oldest first.
///
/// Minutes are counted back on the instant, then shown in the zone of `now`. One sample per
/// minute is assumed; the feed's own timestamps are not used.
pub fn time_labels<Tz: TimeZone>(now: &DateTime<Tz>) -> [String; WINDOW_LEN] {
    std::array::from_fn(|index| {
        let minutes_back = (WINDOW_LEN - 1 - index) as i64;
        time_label(&(now.clone() - TimeDelta::minutes(minutes_back)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    /// US Eastern around the 2024-11-03 fall back: EDT until 06:00 UTC, EST after.
    #[derive(Clone, Copy, Debug)]
    struct FallBackZone;

    impl FallBackZone {
        fn offset_at(utc: &NaiveDateTime) -> FixedOffset {
            let switch = NaiveDate::from_ymd_opt(2024, 11, 3)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap();
            let hours = if *utc < switch { 4 } else { 5 };

            FixedOffset::west_opt(hours * 3600).unwrap()
        }
    }

    impl TimeZone for FallBackZone {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            FallBackZone
        }

        fn offset_from_local_date(&self, _: &NaiveDate) -> LocalResult<FixedOffset> {
            LocalResult::None
        }

        fn offset_from_local_datetime(&self, _: &NaiveDateTime) -> LocalResult<FixedOffset> {
            LocalResult::None
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            Self::offset_at(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            Self::offset_at(utc)
        }
    }

    #[test]
    fn labels_count_back_from_now() {
        let labels = time_labels(&at(14, 3, 0).and_utc());

        assert_eq!(labels, ["13:57", "13:58", "13:59", "14:00", "14:01", "14:02", "14:03"]);
    }

    #[test]
    fn hour_is_unpadded_and_minute_is_padded() {
        let labels = time_labels(&at(9, 4, 59).and_utc());

        assert_eq!(labels[0], "8:58");
        assert_eq!(labels[6], "9:04");
        for label in &labels {
            let (hour, minute) = label.split_once(':').unwrap();
            assert!((1..=2).contains(&hour.len()) && hour.bytes().all(|b| b.is_ascii_digit()));
            assert!(minute.len() == 2 && minute.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn labels_wrap_past_midnight() {
        let labels = time_labels(&at(0, 2, 30).and_utc());

        assert_eq!(labels, ["23:56", "23:57", "23:58", "23:59", "0:00", "0:01", "0:02"]);
    }

    #[test]
    fn labels_show_wall_time_of_the_zone() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = offset.from_utc_datetime(&at(14, 3, 0));

        assert_eq!(time_labels(&now)[6], "16:03");
    }

    #[test]
    fn labels_follow_the_instant_across_fall_back() {
        let utc = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(6, 2, 0)
            .unwrap();
        let now = FallBackZone.from_utc_datetime(&utc);

        let labels = time_labels(&now);

        assert_eq!(labels, ["1:56", "1:57", "1:58", "1:59", "1:00", "1:01", "1:02"]);
    }

    #[test]
    fn fixed_clock_is_deterministic() {
        let clock = FixedClock(Local.from_local_datetime(&at(14, 3, 0)).unwrap());

        assert_eq!(time_labels(&clock.now()), time_labels(&clock.now()));
        assert_eq!(time_labels(&clock.now())[6], "14:03");
    }
}
