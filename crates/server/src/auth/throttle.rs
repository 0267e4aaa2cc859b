use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Limits sign-in attempts per account email.
pub struct LoginThrottle {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginThrottle {
    pub fn per_minute(attempts: u32) -> Self {
        let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::dashmap(Quota::per_minute(attempts)),
        }
    }

    /// Returns `false` once the email has used up its attempts for now.
    pub fn try_attempt(&self, email: &str) -> bool {
        let allowed = self.limiter.check_key(&email.to_string()).is_ok();
        self.limiter.retain_recent();
        allowed
    }
}
