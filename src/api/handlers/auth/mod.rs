//! Auth handlers and supporting modules.
//!
//! This module coordinates registration, login, email verification, password
//! reset, and stateless session issuance.
//!
//! ## Rate limiting
//!
//! Every mutating endpoint checks a fixed-window counter keyed by
//! `(action, client ip)` before doing any other work. A successful login
//! resets the login counter so a past failure streak stops penalizing the
//! client.
//!
//! ## One-time tokens
//!
//! Verification and reset tokens are random 32-byte values sent to the user
//! once by email; the store only ever holds their SHA-256 hash plus an
//! explicit expiry. Presented tokens are re-hashed for lookup.

pub(crate) mod cookies;
pub(crate) mod login;
pub(crate) mod password;
pub(crate) mod principal;
pub(crate) mod rate_limit;
pub(crate) mod refresh;
pub(crate) mod register;
pub(crate) mod session;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use rate_limit::{
    FixedWindowLimiter, NoopRateLimiter, RateLimitAction, RateLimitConfig, RateLimitStatus,
    RateLimiter, spawn_sweeper,
};

#[cfg(test)]
pub(crate) mod test_token_helpers {
    pub(crate) use super::utils::generate_one_time_token as generate;
    pub(crate) use super::utils::hash_one_time_token as hash;
}

use axum::http::HeaderMap;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use self::rate_limit::rate_limit_key;
use self::utils::rate_limit_client;

/// Rate limits are enforced before any other endpoint work. Returns the
/// counter key so a handler can reset it later (login does, on success).
pub(crate) fn enforce_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    action: RateLimitAction,
) -> Result<String, ApiError> {
    let key = rate_limit_key(action, &rate_limit_client(headers));
    let status = state.rate_limiter().check(&key, action.config());
    if status.allowed {
        Ok(key)
    } else {
        Err(ApiError::RateLimited {
            retry_after_seconds: status.reset_in.as_secs().max(1),
        })
    }
}
