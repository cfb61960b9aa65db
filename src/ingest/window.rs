// src/ingest/window.rs
//! Lookback windows. Bounds are inclusive on both ends and `now` is captured
//! exactly once per run.

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How absolute timestamps are turned into the naive date-times stored in
/// artifacts. Fixed per deployment; artifacts from different policies must
/// not be merged together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePolicy {
    #[default]
    Utc,
    Local,
}

impl TimePolicy {
    pub fn localize(self, ts: DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimePolicy::Utc => ts.naive_utc(),
            TimePolicy::Local => ts.with_timezone(&Local).naive_local(),
        }
    }

    pub fn now(self) -> NaiveDateTime {
        self.localize(Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookback {
    Days(u32),
    Hours(f64),
}

impl Default for Lookback {
    fn default() -> Self {
        Lookback::Days(1)
    }
}

/// Upper bound for any lookback, in days.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

impl Lookback {
    /// Resolve optional day/hour settings. Hours take precedence; neither
    /// falls back to one day.
    pub fn resolve(days: Option<u32>, hours: Option<f64>) -> Result<Self, ConfigError> {
        match (days, hours) {
            (_, Some(h)) => Self::hours(h),
            (Some(d), None) => Self::days(d),
            (None, None) => Ok(Lookback::default()),
        }
    }

    pub fn days(d: u32) -> Result<Self, ConfigError> {
        if d > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::InvalidLookback(format!(
                "days must be at most {MAX_LOOKBACK_DAYS} (got {d})"
            )));
        }
        Ok(Lookback::Days(d))
    }

    pub fn hours(h: f64) -> Result<Self, ConfigError> {
        if !h.is_finite() || h < 0.0 {
            return Err(ConfigError::InvalidLookback(format!(
                "hours must be a finite, non-negative number (got {h})"
            )));
        }
        let max_hours = f64::from(MAX_LOOKBACK_DAYS) * 24.0;
        if h > max_hours {
            return Err(ConfigError::InvalidLookback(format!(
                "hours must be at most {max_hours} (got {h})"
            )));
        }
        Ok(Lookback::Hours(h))
    }

    /// `None` when the lookback is outside the accepted range, which only
    /// happens for values built without `days`/`hours`.
    pub fn duration(&self) -> Option<Duration> {
        match *self {
            Lookback::Days(d) if d <= MAX_LOOKBACK_DAYS => Some(Duration::days(i64::from(d))),
            Lookback::Hours(h) if h.is_finite() && h >= 0.0 => {
                let ms = (h * 3_600_000.0).round();
                if ms > f64::from(MAX_LOOKBACK_DAYS) * 86_400_000.0 {
                    return None;
                }
                Some(Duration::milliseconds(ms as i64))
            }
            _ => None,
        }
    }
}

/// `start <= ts <= end`.
pub fn in_window(ts: NaiveDateTime, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    start <= ts && ts <= end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub policy: TimePolicy,
}

impl TimeWindow {
    /// `[now - lookback, now]` for an explicit `now`.
    pub fn ending_at(
        now: NaiveDateTime,
        lookback: Lookback,
        policy: TimePolicy,
    ) -> Result<Self, ConfigError> {
        let start = lookback
            .duration()
            .and_then(|d| now.checked_sub_signed(d))
            .ok_or_else(|| {
                ConfigError::InvalidLookback(format!("{lookback:?} reaches outside the calendar"))
            })?;
        Ok(Self {
            start,
            end: now,
            policy,
        })
    }

    /// Reads the clock once and freezes the window for the whole run.
    pub fn current(lookback: Lookback, policy: TimePolicy) -> Result<Self, ConfigError> {
        Self::ending_at(policy.now(), lookback, policy)
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        in_window(ts, self.start, self.end)
    }

    pub fn localize(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        self.policy.localize(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_hours_keep_minutes() {
        assert_eq!(Lookback::Hours(1.5).duration(), Some(Duration::minutes(90)));
    }

    #[test]
    fn unvalidated_huge_lookback_has_no_duration() {
        assert_eq!(Lookback::Days(200_000_000).duration(), None);
        assert_eq!(Lookback::Hours(1e15).duration(), None);
    }

    #[test]
    fn negative_or_nan_hours_rejected() {
        assert!(Lookback::hours(-1.0).is_err());
        assert!(Lookback::hours(f64::NAN).is_err());
        assert!(Lookback::hours(f64::INFINITY).is_err());
    }

    #[test]
    fn utc_policy_is_identity_on_naive_utc() {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T08:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(TimePolicy::Utc.localize(ts), ts.naive_utc());
    }
}
