//! Calendar helpers: business days and the same-day grace period

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Returns true for Saturdays and Sundays
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every calendar date in `[start, end]`, empty when `end < start`
pub fn dates_in_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}

/// Count the weekdays in `[start, end]`
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    dates_in_range(start, end)
        .filter(|date| !is_weekend(*date))
        .count() as u32
}

/// Cutoff before which leave starting today may still be changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriod {
    cutoff_hour: u32,
    cutoff_minute: u32,
}

impl Default for GracePeriod {
    fn default() -> Self {
        Self {
            cutoff_hour: 9,
            cutoff_minute: 0,
        }
    }
}

impl GracePeriod {
    /// Create a grace period ending at `hour:minute` (inclusive)
    pub fn new(cutoff_hour: u32, cutoff_minute: u32) -> LeaveResult<Self> {
        if cutoff_hour > 23 || cutoff_minute > 59 {
            return Err(LeaveError::Config(format!(
                "Invalid grace period cutoff {:02}:{:02}",
                cutoff_hour, cutoff_minute
            )));
        }
        Ok(Self {
            cutoff_hour,
            cutoff_minute,
        })
    }

    fn cutoff_minutes(&self) -> u32 {
        self.cutoff_hour * 60 + self.cutoff_minute
    }

    fn minute_of_day(now: NaiveDateTime) -> u32 {
        now.hour() * 60 + now.minute()
    }

    /// Returns true while the cutoff minute has not passed
    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        Self::minute_of_day(now) <= self.cutoff_minutes()
    }

    /// Minutes left until the cutoff, `None` once it has passed
    pub fn minutes_remaining(&self, now: NaiveDateTime) -> Option<u32> {
        self.cutoff_minutes().checked_sub(Self::minute_of_day(now))
    }

    /// Future dates are always modifiable, today only within the grace period
    pub fn can_modify(&self, date: NaiveDate, now: NaiveDateTime) -> bool {
        let today = now.date();
        if date > today {
            true
        } else if date == today {
            self.is_open(now)
        } else {
            false
        }
    }

    /// Error out unless `date` may still be modified
    pub fn ensure_modifiable(&self, date: NaiveDate, now: NaiveDateTime) -> LeaveResult<()> {
        if self.can_modify(date, now) {
            Ok(())
        } else {
            Err(LeaveError::OutsideGracePeriod(date))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_business_days_skip_weekends() {
        // 2024-03-08 is a Friday, 2024-03-12 a Tuesday
        assert_eq!(business_days_between(date(2024, 3, 8), date(2024, 3, 12)), 3);
        assert_eq!(business_days_between(date(2024, 3, 9), date(2024, 3, 10)), 0);
        assert_eq!(business_days_between(date(2024, 3, 11), date(2024, 3, 11)), 1);
        assert_eq!(business_days_between(date(2024, 3, 12), date(2024, 3, 11)), 0);
    }

    #[test]
    fn test_grace_period_cutoff_is_inclusive() {
        let grace = GracePeriod::default();
        let today = date(2024, 3, 11);

        let early = today.and_hms_opt(8, 59, 0).unwrap();
        let at_cutoff = today.and_hms_opt(9, 0, 30).unwrap();
        let late = today.and_hms_opt(9, 1, 0).unwrap();

        assert!(grace.can_modify(today, early));
        assert!(grace.can_modify(today, at_cutoff));
        assert!(!grace.can_modify(today, late));
        assert!(grace.can_modify(date(2024, 3, 12), late));
        assert!(!grace.can_modify(date(2024, 3, 10), early));

        assert_eq!(grace.minutes_remaining(early), Some(1));
        assert_eq!(grace.minutes_remaining(late), None);
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        assert!(matches!(GracePeriod::new(24, 0), Err(LeaveError::Config(_))));
    }
}
