//! Rate limiting primitives for auth flows.
//!
//! Fixed-window counting: each `(action, client)` key holds a count and a
//! window deadline. A burst straddling a window boundary can admit up to
//! twice the limit; the target is abuse throttling, not precise quotas.
//! Single-process only — multi-instance deployments swap in a shared counter
//! store behind the same trait.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tokio::time::interval;

#[derive(Clone, Copy, Debug)]
pub enum RateLimitAction {
    Register,
    Login,
    VerifyEmail,
    ResendVerification,
    ForgotPassword,
    ResetPassword,
    Refresh,
}

impl RateLimitAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::VerifyEmail => "verify-email",
            Self::ResendVerification => "resend-verification",
            Self::ForgotPassword => "forgot-password",
            Self::ResetPassword => "reset-password",
            Self::Refresh => "refresh",
        }
    }

    /// Per-action window and ceiling. Credential endpoints are strictest.
    #[must_use]
    pub const fn config(self) -> RateLimitConfig {
        match self {
            Self::Login => RateLimitConfig {
                window: Duration::from_secs(15 * 60),
                max_requests: 10,
            },
            Self::Register | Self::ForgotPassword | Self::ResetPassword => RateLimitConfig {
                window: Duration::from_secs(60 * 60),
                max_requests: 5,
            },
            Self::VerifyEmail | Self::ResendVerification => RateLimitConfig {
                window: Duration::from_secs(10 * 60),
                max_requests: 10,
            },
            Self::Refresh => RateLimitConfig {
                window: Duration::from_secs(60),
                max_requests: 30,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in: Duration,
}

pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str, config: RateLimitConfig) -> RateLimitStatus;
    /// Clear a counter, e.g. after a successful login ends a failure streak.
    fn reset(&self, key: &str);
}

/// Compose the map key for one action and one client identifier.
#[must_use]
pub fn rate_limit_key(action: RateLimitAction, client: &str) -> String {
    format!("{}:{client}", action.as_str())
}

#[derive(Clone, Copy, Debug)]
struct WindowEntry {
    count: u32,
    window_reset_unix_ms: u64,
}

/// In-memory fixed-window limiter.
#[derive(Default)]
pub struct FixedWindowLimiter {
    entries: Mutex<HashMap<String, WindowEntry>>,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn check_at(&self, key: &str, config: RateLimitConfig, now_ms: u64) -> RateLimitStatus {
        let window_ms = u64::try_from(config.window.as_millis()).unwrap_or(u64::MAX);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            window_reset_unix_ms: now_ms.saturating_add(window_ms),
        });

        // An elapsed window is the same as no entry at all.
        if now_ms >= entry.window_reset_unix_ms {
            entry.count = 0;
            entry.window_reset_unix_ms = now_ms.saturating_add(window_ms);
        }

        entry.count = entry.count.saturating_add(1);
        let reset_in = Duration::from_millis(entry.window_reset_unix_ms.saturating_sub(now_ms));

        if entry.count > config.max_requests {
            RateLimitStatus {
                allowed: false,
                remaining: 0,
                reset_in,
            }
        } else {
            RateLimitStatus {
                allowed: true,
                remaining: config.max_requests - entry.count,
                reset_in,
            }
        }
    }

    fn sweep_at(&self, now_ms: u64) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.window_reset_unix_ms > now_ms);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, key: &str, config: RateLimitConfig) -> RateLimitStatus {
        self.check_at(key, config, now_unix_millis())
    }

    fn reset(&self, key: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

/// Spawn the background sweep that drops expired windows, bounding memory.
/// Expired entries are also treated as absent on access, so this is
/// housekeeping, not correctness.
pub fn spawn_sweeper(
    limiter: Arc<FixedWindowLimiter>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            limiter.sweep_at(now_unix_millis());
        }
    })
}

/// Limiter that admits everything; used in tests and as an explicit opt-out.
#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _key: &str, config: RateLimitConfig) -> RateLimitStatus {
        RateLimitStatus {
            allowed: true,
            remaining: config.max_requests,
            reset_in: Duration::ZERO,
        }
    }

    fn reset(&self, _key: &str) {}
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
