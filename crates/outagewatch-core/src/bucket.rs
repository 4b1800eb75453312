//! Fixed-width time buckets.
//!
//! Buckets are counted from midnight of the timestamp's own calendar day, in
//! the timestamp's own time zone. For widths that divide an hour this is the
//! familiar "round the minute down to a multiple of N" rule.

use chrono::{DateTime, TimeDelta, TimeZone, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Width of one history bucket, in whole minutes (1..=1440).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketInterval {
    minutes: u32,
}

impl BucketInterval {
    pub const TEN_MINUTES: Self = Self { minutes: 10 };

    /// Build an interval, clamping the width into `1..=1440` minutes.
    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: minutes.clamp(1, MINUTES_PER_DAY),
        }
    }

    pub fn minutes(self) -> u32 {
        self.minutes
    }

    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.minutes))
    }
}

impl Default for BucketInterval {
    fn default() -> Self {
        Self::TEN_MINUTES
    }
}

/// Floor `ts` to the start of the bucket that contains it.
///
/// Seconds and sub-second fields are zeroed. Aligned timestamps come back
/// unchanged.
pub fn bucket<Tz: TimeZone>(ts: &DateTime<Tz>, interval: BucketInterval) -> DateTime<Tz> {
    let minute_of_day = ts.hour() * 60 + ts.minute();
    let excess_minutes = minute_of_day % interval.minutes;

    ts.clone()
        - TimeDelta::minutes(i64::from(excess_minutes))
        - TimeDelta::seconds(i64::from(ts.second()))
        - TimeDelta::nanoseconds(i64::from(ts.nanosecond()))
}
