//! Business-timezone clock service.
//!
//! All "now" reads in business logic go through the [`Clock`] trait so tests
//! can pin the instant. [`BusinessClock`] couples a clock with the fixed
//! business timezone and owns every cutoff, window, and expiry calculation.
//! Cutoff and expiry math is identical regardless of where the server runs.

use chrono::{DateTime, Days, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use thiserror::Error;

/// Error type for clock operations.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock bound to the business timezone.
#[derive(Clone)]
pub struct BusinessClock {
    clock: Arc<dyn Clock>,
    zone: Tz,
}

impl std::fmt::Debug for BusinessClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessClock")
            .field("zone", &self.zone)
            .finish()
    }
}

impl BusinessClock {
    /// Creates a business clock reading real time.
    pub fn new(zone: Tz) -> Self {
        Self::with_clock(Arc::new(SystemClock), zone)
    }

    /// Creates a business clock with an injected time source.
    pub fn with_clock(clock: Arc<dyn Clock>, zone: Tz) -> Self {
        Self { clock, zone }
    }

    /// The business timezone.
    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Current instant in UTC.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current instant localized to the business timezone.
    pub fn now_in_zone(&self) -> DateTime<Tz> {
        self.clock.now().with_timezone(&self.zone)
    }

    /// Instant `n` calendar days before now, by wall-clock day subtraction
    /// in the business timezone. Month and leap-year boundaries resolve to
    /// the correct calendar date; the wall time is preserved.
    pub fn days_ago(&self, n: u64) -> DateTime<Utc> {
        let local = self.now_in_zone();
        let date = local
            .date_naive()
            .checked_sub_days(Days::new(n))
            .unwrap_or_else(|| local.date_naive());
        self.resolve_local(date.and_time(local.time()))
    }

    /// Instant `h` real hours after `instant`. Duration-based, so the result
    /// is exactly `h` hours later even across DST transition days.
    pub fn add_hours(&self, instant: DateTime<Utc>, h: i64) -> DateTime<Utc> {
        instant + Duration::hours(h)
    }

    /// Instant `d` * 24 real hours after `instant`.
    pub fn add_days(&self, instant: DateTime<Utc>, d: i64) -> DateTime<Utc> {
        instant + Duration::days(d)
    }

    /// True if the current local hour is at or past `hour` (inclusive).
    pub fn is_after_cutoff(&self, hour: u32) -> bool {
        self.now_in_zone().hour() >= hour
    }

    /// First instant after the end of `date` in the business timezone
    /// (midnight opening the following day). Callers use `< end` semantics.
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let next = date.succ_opt().unwrap_or(date);
        self.resolve_local(next.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// Resolves a naive local datetime to an instant. DST gap fallback: if
    /// the local time does not exist, interpret the naive value as UTC.
    fn resolve_local(&self, naive: chrono::NaiveDateTime) -> DateTime<Utc> {
        naive
            .and_local_timezone(self.zone)
            .latest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }
}

/// Parses a `YYYY-MM-DD` string as a local calendar date. Fails on malformed
/// input, out-of-range month, or impossible day (e.g. Feb 30).
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, ClockError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ClockError::InvalidDate(format!("Invalid date format: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    fn fixed(clock_at: &str) -> BusinessClock {
        let instant = DateTime::parse_from_rfc3339(clock_at)
            .unwrap()
            .with_timezone(&Utc);
        BusinessClock::with_clock(Arc::new(FixedClock(instant)), Los_Angeles)
    }

    #[test]
    fn test_now_in_zone_uses_injected_clock() {
        let clock = fixed("2025-03-15T19:00:00Z");
        assert_eq!(clock.now().to_rfc3339(), "2025-03-15T19:00:00+00:00");
        // PDT is UTC-7 on that date
        assert_eq!(clock.now_in_zone().hour(), 12);
    }

    #[test]
    fn test_days_ago_thirty_in_march() {
        // Local noon on 2025-03-15; 30 wall-clock days earlier is Feb 13.
        let clock = fixed("2025-03-15T19:00:00Z");
        let result = clock.days_ago(30).with_timezone(&Los_Angeles);
        assert_eq!(result.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 13).unwrap());
        assert_eq!(result.hour(), 12);
    }

    #[test]
    fn test_days_ago_thirty_across_leap_february() {
        // 2024 is a leap year: 30 days before Mar 1 is Jan 31.
        let clock = fixed("2024-03-01T20:00:00Z");
        let result = clock.days_ago(30).with_timezone(&Los_Angeles);
        assert_eq!(result.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_add_hours_across_spring_forward() {
        let clock = fixed("2025-03-09T00:00:00Z");
        // 2025-03-08 20:00 PST (UTC-8)
        let checked_in = DateTime::parse_from_rfc3339("2025-03-09T04:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let expires = clock.add_hours(checked_in, 12);

        // Exactly 12 real hours later...
        assert_eq!(expires - checked_in, Duration::hours(12));
        // ...which lands on 09:00 PDT: the wall clock shows 13 hours because
        // 02:00-03:00 local did not exist on 2025-03-09.
        assert_eq!(expires.with_timezone(&Los_Angeles).hour(), 9);
    }

    #[test]
    fn test_add_hours_across_fall_back() {
        let clock = fixed("2025-11-01T00:00:00Z");
        // 2025-11-01 20:00 PDT (UTC-7)
        let checked_in = DateTime::parse_from_rfc3339("2025-11-02T03:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let expires = clock.add_hours(checked_in, 12);

        assert_eq!(expires - checked_in, Duration::hours(12));
        // 07:00 PST: the wall clock shows only 11 hours on fall-back day.
        assert_eq!(expires.with_timezone(&Los_Angeles).hour(), 7);
    }

    #[test]
    fn test_add_days_is_duration_based() {
        let clock = fixed("2025-03-08T12:00:00Z");
        let start = clock.now();
        let later = clock.add_days(start, 7);
        assert_eq!(later - start, Duration::days(7));
    }

    #[test]
    fn test_is_after_cutoff_inclusive_boundary() {
        // 22:00 local exactly (PDT, UTC-7)
        let at_cutoff = fixed("2025-06-11T05:00:00Z");
        assert!(at_cutoff.is_after_cutoff(22));

        // 21:59 local
        let before_cutoff = fixed("2025-06-11T04:59:00Z");
        assert!(!before_cutoff.is_after_cutoff(22));

        // 23:30 local
        let after_cutoff = fixed("2025-06-11T06:30:00Z");
        assert!(after_cutoff.is_after_cutoff(22));
    }

    #[test]
    fn test_end_of_day_is_next_midnight_local() {
        let clock = fixed("2025-06-11T00:00:00Z");
        let date = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let end = clock.end_of_day(date).with_timezone(&Los_Angeles);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
        assert_eq!(end.hour(), 0);
    }

    #[test]
    fn test_parse_calendar_date_valid() {
        assert_eq!(
            parse_calendar_date("2025-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_calendar_date_rejects_impossible_day() {
        assert!(parse_calendar_date("2025-02-30").is_err());
    }

    #[test]
    fn test_parse_calendar_date_rejects_month_13() {
        assert!(parse_calendar_date("2025-13-01").is_err());
    }

    #[test]
    fn test_parse_calendar_date_rejects_malformed() {
        assert!(parse_calendar_date("not-a-date").is_err());
        assert!(parse_calendar_date("2025/03/15").is_err());
        assert!(parse_calendar_date("").is_err());
    }

    #[test]
    fn test_leap_day_parses_in_leap_year_only() {
        assert!(parse_calendar_date("2024-02-29").is_ok());
        assert!(parse_calendar_date("2025-02-29").is_err());
    }
}
