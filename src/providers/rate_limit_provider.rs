use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::config::RateLimitSettings;
use crate::errors::InternalError;
use crate::errors::internal::RateLimitError;

/// Public endpoints that are throttled per client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedRoute {
    Login,
    CheckSession,
    PasswordResetRequest,
    PasswordResetVerify,
    PasswordReset,
}

impl LimitedRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitedRoute::Login => "auth.login",
            LimitedRoute::CheckSession => "auth.check_session",
            LimitedRoute::PasswordResetRequest => "auth.password_reset_request",
            LimitedRoute::PasswordResetVerify => "auth.password_reset_verify",
            LimitedRoute::PasswordReset => "auth.password_reset",
        }
    }
}

/// Checks between sweeps of idle client keys
const PRUNE_EVERY: u64 = 256;

/// One keyed limiter per route, keyed by client address
///
/// Every `PRUNE_EVERY` checks, keys whose budget has fully refilled are
/// dropped from all routes so the maps track only recently active clients.
pub struct RateLimitProvider {
    login: DefaultKeyedRateLimiter<String>,
    check_session: DefaultKeyedRateLimiter<String>,
    reset_request: DefaultKeyedRateLimiter<String>,
    reset_verify: DefaultKeyedRateLimiter<String>,
    reset: DefaultKeyedRateLimiter<String>,
    checks: AtomicU64,
}

fn per_minute(limit: u32) -> DefaultKeyedRateLimiter<String> {
    let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(burst))
}

impl RateLimitProvider {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            login: per_minute(settings.login_per_minute),
            check_session: per_minute(settings.check_session_per_minute),
            reset_request: per_minute(settings.reset_request_per_minute),
            reset_verify: per_minute(settings.reset_verify_per_minute),
            reset: per_minute(settings.reset_per_minute),
            checks: AtomicU64::new(0),
        }
    }

    fn limiters(&self) -> [&DefaultKeyedRateLimiter<String>; 5] {
        [
            &self.login,
            &self.check_session,
            &self.reset_request,
            &self.reset_verify,
            &self.reset,
        ]
    }

    fn limiter(&self, route: LimitedRoute) -> &DefaultKeyedRateLimiter<String> {
        match route {
            LimitedRoute::Login => &self.login,
            LimitedRoute::CheckSession => &self.check_session,
            LimitedRoute::PasswordResetRequest => &self.reset_request,
            LimitedRoute::PasswordResetVerify => &self.reset_verify,
            LimitedRoute::PasswordReset => &self.reset,
        }
    }

    /// Consume one cell for `client` on `route`
    pub fn check(&self, route: LimitedRoute, client: &str) -> Result<(), InternalError> {
        if (self.checks.fetch_add(1, Ordering::Relaxed) + 1) % PRUNE_EVERY == 0 {
            self.prune();
        }

        let limiter = self.limiter(route);
        let key = client.to_string();
        if limiter.check_key(&key).is_ok() {
            return Ok(());
        }

        tracing::warn!("Rate limit exceeded on {} for {}", route.as_str(), client);
        Err(RateLimitError::Exceeded {
            route: route.as_str(),
            client: key,
        }
        .into())
    }

    /// Drop client keys that are back at a full budget
    pub fn prune(&self) {
        for limiter in self.limiters() {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
        tracing::debug!("Rate limiter now tracks {} client keys", self.tracked_clients());
    }

    /// Client keys currently held across all routes
    pub fn tracked_clients(&self) -> usize {
        self.limiters().iter().map(|limiter| limiter.len()).sum()
    }
}
