//! Per-account lockout after repeated password failures.
//!
//! An account is either counting failures (`Failures::Count(n)` with
//! `n < max_failures`) or locked. A locked account rejects every attempt
//! until `lock_minutes` have passed since the lock event; the first attempt
//! after that resets the counter and is checked normally. There is no
//! separate unlock step.

use chrono::{DateTime, Utc};

use crate::account::{Failures, LockoutState};
use crate::error::CoreError;

/// Threshold and cooldown for account lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures that trigger a lock.
    pub max_failures: u32,
    /// Cooldown after a lock, in whole minutes.
    pub lock_minutes: u32,
    /// Clear the counter on a successful login from the counting state.
    /// Off by default: only the locked→counting transition resets it.
    pub reset_on_success: bool,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lock_minutes: 5,
            reset_on_success: false,
        }
    }
}

/// Result of evaluating one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State to persist. Equal to the input when nothing changed.
    pub next: LockoutState,
    pub verdict: Result<(), CoreError>,
}

impl Transition {
    pub fn changed(&self, from: &LockoutState) -> bool {
        self.next != *from
    }
}

impl LockoutPolicy {
    /// Minutes left on a lock at `now`, or `None` once the cooldown is over.
    pub fn remaining_minutes(&self, state: &LockoutState, now: DateTime<Utc>) -> Option<i64> {
        if state.failures != Failures::Locked {
            return None;
        }
        let elapsed = state
            .last_attempt_at
            .map(|at| (now - at).num_minutes())
            .unwrap_or(i64::MAX / 2);
        let remaining = i64::from(self.lock_minutes) - elapsed;
        (remaining >= 1).then_some(remaining)
    }

    /// Evaluates an attempt. `password_ok` is only called when the account
    /// is allowed to try.
    pub fn evaluate(
        &self,
        state: &LockoutState,
        now: DateTime<Utc>,
        password_ok: impl FnOnce() -> bool,
    ) -> Transition {
        if let Some(minutes) = self.remaining_minutes(state, now) {
            return Transition {
                next: *state,
                verdict: Err(CoreError::LockedOut { minutes }),
            };
        }

        let count = match state.failures {
            Failures::Count(n) => n,
            Failures::Locked => 0,
        };

        if password_ok() {
            let count = if self.reset_on_success { 0 } else { count };
            return Transition {
                next: LockoutState {
                    failures: Failures::Count(count),
                    last_attempt_at: Some(now),
                },
                verdict: Ok(()),
            };
        }

        let count = count + 1;
        if count >= self.max_failures {
            return Transition {
                next: LockoutState {
                    failures: Failures::Locked,
                    last_attempt_at: Some(now),
                },
                verdict: Err(CoreError::LockedOut {
                    minutes: i64::from(self.lock_minutes),
                }),
            };
        }

        Transition {
            next: LockoutState {
                failures: Failures::Count(count),
                last_attempt_at: Some(now),
            },
            verdict: Err(CoreError::WrongPassword {
                remaining: self.max_failures - count,
            }),
        }
    }
}
