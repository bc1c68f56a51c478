//! Wall-clock access and calendar-day arithmetic.
//!
//! Everything that asks "what time is it" goes through a [`Clock`] so that
//! confirmation windows and day boundaries can be tested without sleeping.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeDelta, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: parking_lot::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: parking_lot::Mutex::new(start),
        }
    }

    /// Moves the clock to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// First instant inside the period.
    pub start: DateTime<Utc>,
    /// First instant after the period.
    pub end: DateTime<Utc>,
}

impl Period {
    /// Returns `true` if `instant` falls inside the period.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Maps instants to calendar days in a fixed UTC offset.
///
/// "Today" for the task list means the local calendar day of the bot's
/// users, not the UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// Calendar days in the given offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Calendar days in UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Calendar days `minutes` east of UTC, or `None` if out of range.
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    /// The configured offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// `instant` expressed in local time.
    #[must_use]
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// The local calendar day containing `instant`.
    #[must_use]
    pub fn day_containing(&self, instant: DateTime<Utc>) -> Period {
        let start = self.at_local_time(instant, NaiveTime::MIN);
        Period {
            start,
            end: start + TimeDelta::days(1),
        }
    }

    /// The local day before the one containing `instant`.
    #[must_use]
    pub fn day_before(&self, instant: DateTime<Utc>) -> Period {
        let today = self.day_containing(instant);
        Period {
            start: today.start - TimeDelta::days(1),
            end: today.start,
        }
    }

    /// The instant on `instant`'s local day at local wall time `time`.
    #[must_use]
    pub fn at_local_time(&self, instant: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
        let local = self.local(instant).date_naive().and_time(time);
        (local - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// The first instant strictly after `now` whose local wall time is `time`.
    #[must_use]
    pub fn next_local_time(&self, now: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
        let candidate = self.at_local_time(now, time);
        if candidate > now {
            candidate
        } else {
            candidate + TimeDelta::days(1)
        }
    }
}
