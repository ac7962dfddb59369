//! Shared application state and configuration.

use std::sync::Arc;

use crate::api::email::EmailSender;
use crate::api::handlers::auth::rate_limit::RateLimiter;
use crate::store::{AnswerStore, QuestionStore, UserStore};
use crate::token::{RawHmacVerifier, SessionIssuer};

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_VERIFICATION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_RESET_TTL_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    public_base_url: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    verification_ttl_seconds: i64,
    reset_ttl_seconds: i64,
}

impl AppConfig {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        Self {
            public_base_url,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            verification_ttl_seconds: DEFAULT_VERIFICATION_TTL_SECONDS,
            reset_ttl_seconds: DEFAULT_RESET_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_verification_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn verification_ttl_seconds(&self) -> i64 {
        self.verification_ttl_seconds
    }

    #[must_use]
    pub fn reset_ttl_seconds(&self) -> i64 {
        self.reset_ttl_seconds
    }

    /// Only mark cookies secure when the site is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

pub struct AppState {
    config: AppConfig,
    issuer: SessionIssuer,
    guard_verifier: RawHmacVerifier,
    rate_limiter: Arc<dyn RateLimiter>,
    users: Arc<dyn UserStore>,
    questions: Arc<dyn QuestionStore>,
    answers: Arc<dyn AnswerStore>,
    email: Arc<dyn EmailSender>,
}

impl AppState {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        issuer: SessionIssuer,
        guard_verifier: RawHmacVerifier,
        rate_limiter: Arc<dyn RateLimiter>,
        users: Arc<dyn UserStore>,
        questions: Arc<dyn QuestionStore>,
        answers: Arc<dyn AnswerStore>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            issuer,
            guard_verifier,
            rate_limiter,
            users,
            questions,
            answers,
            email,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    /// The verifier backend used by the route guard, kept separate from the
    /// issuer's codec on purpose.
    #[must_use]
    pub fn guard_verifier(&self) -> &RawHmacVerifier {
        &self.guard_verifier
    }

    pub(crate) fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[must_use]
    pub fn questions(&self) -> &dyn QuestionStore {
        self.questions.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> &dyn AnswerStore {
        self.answers.as_ref()
    }

    #[must_use]
    pub fn email(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        let config = AppConfig::new("https://demando.dev".to_string());
        assert_eq!(config.access_ttl_seconds(), DEFAULT_ACCESS_TTL_SECONDS);
        assert_eq!(config.refresh_ttl_seconds(), DEFAULT_REFRESH_TTL_SECONDS);
        assert_eq!(
            config.verification_ttl_seconds(),
            DEFAULT_VERIFICATION_TTL_SECONDS
        );
        assert_eq!(config.reset_ttl_seconds(), DEFAULT_RESET_TTL_SECONDS);

        let config = config
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_verification_ttl_seconds(180)
            .with_reset_ttl_seconds(240);
        assert_eq!(config.access_ttl_seconds(), 60);
        assert_eq!(config.refresh_ttl_seconds(), 120);
        assert_eq!(config.verification_ttl_seconds(), 180);
        assert_eq!(config.reset_ttl_seconds(), 240);
    }

    #[test]
    fn cookie_secure_follows_scheme() {
        assert!(AppConfig::new("https://demando.dev".to_string()).cookie_secure());
        assert!(!AppConfig::new("http://localhost:3000".to_string()).cookie_secure());
    }
}
