//! Password login: captcha, lookup, lockout bookkeeping.
//!
//! Throttling happens before this (see [`crate::limiter`]) and session
//! issuance after it; [`Authenticator`] only decides whether the attempt
//! succeeds and records its effect on the account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::account::Account;
use crate::captcha;
use crate::error::{CoreError, CoreResult};
use crate::lockout::LockoutPolicy;
use crate::store::AccountStore;

/// Longest accepted login name, in characters.
pub const MAX_NUM_LEN: usize = 18;

/// Compare-and-swap attempts before giving up on a contended account.
const SWAP_RETRIES: usize = 4;

/// Compares a stored password with a submitted one.
///
/// Implementations may be slow (key derivation); callers run them on the
/// blocking pool.
pub trait PasswordCheck: Send + Sync {
    fn matches(&self, stored: &str, supplied: &str) -> bool;
}

/// Constant-time equality on the raw strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPassword;

impl PasswordCheck for PlainPassword {
    fn matches(&self, stored: &str, supplied: &str) -> bool {
        stored.as_bytes().ct_eq(supplied.as_bytes()).into()
    }
}

/// Fields submitted to the login endpoint.
#[derive(Debug, Clone, Default)]
pub struct LoginAttempt {
    pub num: String,
    pub passwd: String,
    pub vcode: String,
    pub vreal: String,
}

pub struct Authenticator {
    store: Arc<dyn AccountStore>,
    passwords: Arc<dyn PasswordCheck>,
    policy: LockoutPolicy,
    captcha_key: String,
}

impl Authenticator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        passwords: Arc<dyn PasswordCheck>,
        policy: LockoutPolicy,
        captcha_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            passwords,
            policy,
            captcha_key: captcha_key.into(),
        }
    }

    pub async fn authenticate(&self, attempt: &LoginAttempt) -> CoreResult<Account> {
        self.authenticate_at(attempt, Utc::now()).await
    }

    /// Runs one attempt as if it happened at `now`.
    ///
    /// On success the returned account carries the lockout state that was
    /// persisted for this attempt.
    pub async fn authenticate_at(
        &self,
        attempt: &LoginAttempt,
        now: DateTime<Utc>,
    ) -> CoreResult<Account> {
        if !captcha::verify(&attempt.vcode, &attempt.vreal, &self.captcha_key) {
            return Err(CoreError::InvalidCaptcha);
        }

        let num = attempt.num.as_str();
        if num.is_empty() || num.chars().count() > MAX_NUM_LEN {
            return Err(CoreError::BadCredentials);
        }

        let mut password_ok: Option<bool> = None;

        for _ in 0..SWAP_RETRIES {
            let account = self
                .store
                .find_by_num(num)
                .await?
                .ok_or(CoreError::BadCredentials)?;
            let current = account.lockout;

            let ok = if self.policy.remaining_minutes(&current, now).is_some() {
                false
            } else {
                match password_ok {
                    Some(ok) => ok,
                    None => {
                        let ok = self.check_password(&account.passwd, &attempt.passwd).await?;
                        password_ok = Some(ok);
                        ok
                    }
                }
            };

            let transition = self.policy.evaluate(&current, now, || ok);

            // A failed write is logged but never overturns the verdict.
            if transition.changed(&current) {
                match self
                    .store
                    .swap_lockout(account.id, current, transition.next)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(
                            "Lockout state changed underneath login for {num}, retrying"
                        );
                        continue;
                    }
                    Err(e) => tracing::error!("Failed to record login outcome for {num}: {e}"),
                }
            }

            log_outcome(num, &transition.verdict);
            return transition.verdict.map(|()| Account {
                lockout: transition.next,
                ..account
            });
        }

        tracing::warn!("Gave up recording login for {num}: account kept changing");
        Err(CoreError::Conflict(
            "account is being modified concurrently, please retry".to_string(),
        ))
    }

    /// Checks `supplied` against the account's current password without
    /// touching lockout state.
    pub async fn check_password(&self, stored: &str, supplied: &str) -> CoreResult<bool> {
        let passwords = self.passwords.clone();
        let stored = stored.to_string();
        let supplied = supplied.to_string();
        tokio::task::spawn_blocking(move || passwords.matches(&stored, &supplied))
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))
    }
}

fn log_outcome(num: &str, verdict: &Result<(), CoreError>) {
    match verdict {
        Ok(()) => tracing::info!("Password verified for account: {num}"),
        Err(CoreError::LockedOut { minutes }) => {
            tracing::warn!("Login refused for locked account {num} ({minutes} min left)")
        }
        Err(e) => tracing::warn!("Failed login attempt for account {num}: {e}"),
    }
}
