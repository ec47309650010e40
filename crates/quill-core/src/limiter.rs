//! Process-wide login throttle.
//!
//! A single token bucket shared by every login request: it caps aggregate
//! login traffic rather than attempts against any one account.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::error::{CoreError, CoreResult};

pub struct LoginLimiter {
    bucket: DefaultDirectRateLimiter,
}

impl LoginLimiter {
    /// Admits `per_second` logins on average with bursts up to `burst`.
    pub fn new(per_second: NonZeroU32, burst: NonZeroU32) -> Self {
        let quota = Quota::per_second(per_second).allow_burst(burst);
        Self {
            bucket: RateLimiter::direct(quota),
        }
    }

    /// Waits for a token, giving up after `timeout`.
    ///
    /// A caller that times out consumes nothing.
    pub async fn wait(&self, timeout: Duration) -> CoreResult<()> {
        if self.try_acquire() {
            return Ok(());
        }
        match tokio::time::timeout(timeout, self.bucket.until_ready()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                tracing::warn!("Login limiter wait timed out after {:?}", timeout);
                Err(CoreError::RateLimited)
            }
        }
    }

    /// Takes a token only if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }
}

impl std::fmt::Debug for LoginLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginLimiter").finish_non_exhaustive()
    }
}
