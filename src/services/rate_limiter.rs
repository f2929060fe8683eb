//! Lazily-reset daily attempt counters.
//!
//! A counter is only reset when an attempt arrives while it is at its limit on
//! a later calendar day (in the configured UTC offset) than its last attempt.
//! There is no background job; callers evaluate, apply and persist the new
//! state in the same transaction as the action being guarded.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub attempts_today: i32,
    pub last_attempt_or_reset_at: DateTime<Utc>,
}

impl RateLimitState {
    /// State of a counter whose owner was just created.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            attempts_today: 0,
            last_attempt_or_reset_at: now,
        }
    }

    /// Counter mutation that accompanies a decision. Denials leave the state untouched.
    pub fn apply(self, decision: &RateLimitDecision, now: DateTime<Utc>) -> Self {
        match decision {
            RateLimitDecision::Allowed => Self {
                attempts_today: self.attempts_today.saturating_add(1),
                last_attempt_or_reset_at: now,
            },
            RateLimitDecision::AllowedWithReset => Self {
                attempts_today: 1,
                last_attempt_or_reset_at: now,
            },
            RateLimitDecision::Denied { .. } => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    UnderLimit,
    AtLimitSameDay,
    AtLimitNewDay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    AllowedWithReset,
    Denied { reason: String, limit: u32 },
}

impl RateLimitDecision {
    #[cfg(test)]
    pub fn is_allowed(&self) -> bool {
        !matches!(self, RateLimitDecision::Denied { .. })
    }
}

#[derive(Debug, Clone)]
pub struct DailyLimit {
    limit: u32,
    reason: String,
    offset: FixedOffset,
}

impl DailyLimit {
    pub fn new(limit: u32, reason: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            limit,
            reason: reason.into(),
            offset,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn classify(&self, state: &RateLimitState, now: DateTime<Utc>) -> CounterState {
        if i64::from(state.attempts_today) < i64::from(self.limit) {
            return CounterState::UnderLimit;
        }
        if is_later_day(now, state.last_attempt_or_reset_at, self.offset) {
            CounterState::AtLimitNewDay
        } else {
            CounterState::AtLimitSameDay
        }
    }

    pub fn evaluate(&self, state: &RateLimitState, now: DateTime<Utc>) -> RateLimitDecision {
        match self.classify(state, now) {
            CounterState::UnderLimit => RateLimitDecision::Allowed,
            CounterState::AtLimitNewDay => RateLimitDecision::AllowedWithReset,
            CounterState::AtLimitSameDay => RateLimitDecision::Denied {
                reason: self.reason.clone(),
                limit: self.limit,
            },
        }
    }

    /// Evaluate and apply in one step; a denial becomes `AppError::RateLimited`.
    pub fn attempt(&self, state: RateLimitState, now: DateTime<Utc>) -> Result<RateLimitState> {
        let decision = self.evaluate(&state, now);
        if let RateLimitDecision::Denied { reason, limit } = decision {
            return Err(AppError::RateLimited { reason, limit });
        }
        Ok(state.apply(&decision, now))
    }
}

/// Calendar day of `ts` in `offset`; comparing these is start-of-day truncation.
pub fn local_day(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Strictly later calendar day, not "24 hours later".
pub fn is_later_day(now: DateTime<Utc>, other: DateTime<Utc>, offset: FixedOffset) -> bool {
    local_day(now, offset) > local_day(other, offset)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, 0).unwrap()
    }

    fn limit(n: u32) -> DailyLimit {
        DailyLimit::new(n, "Daily retry limit reached", utc())
    }

    #[test]
    fn at_limit_same_day_is_denied() {
        let state = RateLimitState {
            attempts_today: 3,
            last_attempt_or_reset_at: at(10, 0, 5),
        };
        let decision = limit(3).evaluate(&state, at(10, 23, 59));
        assert_eq!(
            decision,
            RateLimitDecision::Denied {
                reason: "Daily retry limit reached".to_string(),
                limit: 3
            }
        );
        assert_eq!(state.apply(&decision, at(10, 23, 59)), state);
    }

    #[test]
    fn at_limit_next_day_resets_to_one() {
        let state = RateLimitState {
            attempts_today: 3,
            last_attempt_or_reset_at: at(10, 0, 5),
        };
        let now = at(11, 0, 1);
        let decision = limit(3).evaluate(&state, now);
        assert_eq!(decision, RateLimitDecision::AllowedWithReset);
        let next = state.apply(&decision, now);
        assert_eq!(next.attempts_today, 1);
        assert_eq!(next.last_attempt_or_reset_at, now);
    }

    #[test]
    fn fresh_counter_is_allowed_and_increments() {
        let now = at(10, 12, 0);
        let state = RateLimitState::fresh(at(1, 0, 0));
        let decision = limit(3).evaluate(&state, now);
        assert_eq!(decision, RateLimitDecision::Allowed);
        assert_eq!(state.apply(&decision, now).attempts_today, 1);
    }

    #[test]
    fn under_limit_keeps_counting_across_days() {
        // Reset only happens once the counter is at its limit.
        let state = RateLimitState {
            attempts_today: 2,
            last_attempt_or_reset_at: at(9, 8, 0),
        };
        let next = limit(3).attempt(state, at(10, 8, 0)).expect("allowed");
        assert_eq!(next.attempts_today, 3);
        assert!(limit(3).attempt(next, at(10, 9, 0)).is_err());
    }

    #[test]
    fn day_boundary_follows_configured_offset() {
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        let limiter = DailyLimit::new(1, "limit", seoul);
        let state = RateLimitState {
            attempts_today: 1,
            // 2024-06-10 23:00 local
            last_attempt_or_reset_at: at(10, 14, 0),
        };
        // 23:59 local, same local day
        assert_eq!(limiter.classify(&state, at(10, 14, 59)), CounterState::AtLimitSameDay);
        // 00:01 local next day, still 2024-06-10 in UTC
        assert_eq!(limiter.classify(&state, at(10, 15, 1)), CounterState::AtLimitNewDay);
    }

    #[test]
    fn attempt_maps_denial_to_rate_limited_error() {
        let state = RateLimitState {
            attempts_today: 5,
            last_attempt_or_reset_at: at(10, 1, 0),
        };
        match limit(5).attempt(state, at(10, 2, 0)) {
            Err(AppError::RateLimited { limit, .. }) => assert_eq!(limit, 5),
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn earlier_timestamp_counts_as_same_day() {
        let state = RateLimitState {
            attempts_today: 1,
            last_attempt_or_reset_at: at(11, 0, 0),
        };
        assert_eq!(limit(1).classify(&state, at(10, 0, 0)), CounterState::AtLimitSameDay);
    }

    #[test]
    fn zero_limit_only_passes_on_a_new_day() {
        let state = RateLimitState::fresh(at(10, 0, 0));
        assert!(!limit(0).evaluate(&state, at(10, 5, 0)).is_allowed());
        assert_eq!(limit(0).evaluate(&state, at(11, 0, 0)), RateLimitDecision::AllowedWithReset);
    }

    #[test]
    fn fixed_clock_reports_its_instant() {
        let clock = FixedClock(at(3, 4, 5));
        assert_eq!(clock.now(), at(3, 4, 5));
        assert!(SystemClock.now() > at(3, 4, 5));
    }
}
