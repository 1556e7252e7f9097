//! Session lockout: three strikes, then a 90 second cooldown
//!
//! State lives only as long as the login screen that owns it. A suspended
//! state clears itself the first time it is checked after the deadline.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

/// Session lockout parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a suspension
    pub threshold: u32,
    /// How long a suspension lasts
    pub cooldown: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            threshold: 3,
            cooldown: Duration::seconds(90),
        }
    }
}

/// Result of recording a failed attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Still open; this many attempts remain before suspension
    Retry { attempts_remaining: u32 },
    /// Threshold reached; the session is now suspended
    Suspended { seconds_left: u64 },
}

/// Failure counter and suspension deadline for one login session
#[derive(Clone, Debug, Default)]
pub struct LoginAttemptState {
    policy: LockoutPolicy,
    failed_count: u32,
    locked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptState {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            failed_count: 0,
            locked_until: None,
        }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn failed_count(&self) -> u32 {
        self.failed_count
    }

    /// Check whether attempts are allowed at `now`.
    ///
    /// Returns the whole seconds left (rounded up) while suspended. An
    /// expired suspension is cleared here and the counter restarts at zero.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<(), u64> {
        match self.locked_until {
            Some(until) if now < until => Err(seconds_until(now, until)),
            Some(_) => {
                self.locked_until = None;
                self.failed_count = 0;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Deadline of the active suspension, without clearing an expired one
    pub fn locked_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.locked_until.filter(|until| now < *until)
    }

    /// Whole seconds left on the active suspension, rounded up
    pub fn seconds_left(&self, now: DateTime<Utc>) -> Option<u64> {
        self.locked_until(now).map(|until| seconds_until(now, until))
    }

    /// Record a wrong secret
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> FailureOutcome {
        self.failed_count += 1;

        if self.failed_count >= self.policy.threshold {
            let until = now + self.policy.cooldown;
            self.locked_until = Some(until);
            self.failed_count = 0;
            warn!(
                "Session suspended after {} failed attempts",
                self.policy.threshold
            );
            FailureOutcome::Suspended {
                seconds_left: seconds_until(now, until),
            }
        } else {
            FailureOutcome::Retry {
                attempts_remaining: self.policy.threshold - self.failed_count,
            }
        }
    }

    /// Record a successful admission
    pub fn record_success(&mut self) {
        self.failed_count = 0;
        self.locked_until = None;
    }
}

/// Whole seconds from `now` to `until`, rounded up
fn seconds_until(now: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000)
}
