//! Job triggers: fixed intervals and UTC cron expressions

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::time::Instant;

use super::SchedulerError;

/// When a job becomes due
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Every `Duration`, first due one period after start
    Every(Duration),
    /// Next matching time of a 6-field cron expression, evaluated in UTC
    Cron(Box<Schedule>),
}

impl Trigger {
    /// Parse a cron expression (sec min hour day month weekday)
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidCronExpression` if the expression does not parse.
    pub fn cron(expression: &str) -> Result<Self, SchedulerError> {
        Schedule::from_str(expression)
            .map(|s| Self::Cron(Box::new(s)))
            .map_err(|e| SchedulerError::InvalidCronExpression(format!("{expression}: {e}")))
    }

    /// Next due point after `now`, as a monotonic instant and a wall-clock time
    ///
    /// Returns `Ok(None)` when a cron schedule has no future occurrence.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidInterval` for a zero period or one that
    /// overflows the clock.
    pub fn next_due(
        &self,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Result<Option<(Instant, DateTime<Utc>)>, SchedulerError> {
        match self {
            Self::Every(period) => {
                if period.is_zero() {
                    return Err(SchedulerError::InvalidInterval("zero period".to_string()));
                }
                let due = now.checked_add(*period).ok_or_else(|| {
                    SchedulerError::InvalidInterval(format!("{}s overflows", period.as_secs()))
                })?;
                let wall_next = chrono::Duration::from_std(*period)
                    .ok()
                    .and_then(|d| wall.checked_add_signed(d))
                    .unwrap_or(wall);
                Ok(Some((due, wall_next)))
            },
            Self::Cron(schedule) => {
                let Some(next) = schedule.after(&wall).next() else {
                    return Ok(None);
                };
                let wait = (next - wall).to_std().unwrap_or(Duration::ZERO);
                Ok(Some((now + wait, next)))
            },
        }
    }

    /// Human-readable description for status output
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Every(period) => format!("every {}s", period.as_secs()),
            Self::Cron(schedule) => format!("cron {schedule}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike, Weekday};

    use super::*;

    #[test]
    fn interval_is_relative_to_now() {
        let now = Instant::now();
        let wall = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let (due, at) = Trigger::Every(Duration::from_secs(300))
            .next_due(now, wall)
            .unwrap()
            .unwrap();
        assert_eq!(due - now, Duration::from_secs(300));
        assert_eq!(at, wall + chrono::Duration::minutes(5));
    }

    #[test]
    fn daily_cron_fires_at_two_utc() {
        let trigger = Trigger::cron("0 0 2 * * *").unwrap();
        let wall = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let now = Instant::now();

        let (due, at) = trigger.next_due(now, wall).unwrap().unwrap();

        assert_eq!(at, Utc.with_ymd_and_hms(2026, 3, 10, 2, 0, 0).unwrap());
        assert_eq!(due - now, Duration::from_secs(14 * 3600));
    }

    #[test]
    fn weekly_cron_fires_on_sunday() {
        let trigger = Trigger::cron("0 0 3 * * Sun").unwrap();
        // 2026-03-09 is a Monday
        let wall = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();

        let (_, at) = trigger.next_due(Instant::now(), wall).unwrap().unwrap();

        assert_eq!(at.weekday(), Weekday::Sun);
        assert_eq!(at.hour(), 3);
        assert_eq!(at.day(), 15);
    }

    #[test]
    fn unusable_intervals_are_errors() {
        let wall = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        assert!(matches!(
            Trigger::Every(Duration::ZERO).next_due(Instant::now(), wall),
            Err(SchedulerError::InvalidInterval(_))
        ));
        assert!(matches!(
            Trigger::Every(Duration::MAX).next_due(Instant::now(), wall),
            Err(SchedulerError::InvalidInterval(_))
        ));
    }

    #[test]
    fn invalid_cron_is_rejected() {
        assert!(matches!(
            Trigger::cron("at noon"),
            Err(SchedulerError::InvalidCronExpression(_))
        ));
    }

    #[test]
    fn describe_names_the_schedule() {
        assert_eq!(Trigger::Every(Duration::from_secs(600)).describe(), "every 600s");
        assert!(Trigger::cron("0 0 2 * * *").unwrap().describe().starts_with("cron"));
    }
}
