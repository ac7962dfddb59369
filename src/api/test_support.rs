//! Shared fixtures for handler unit tests.

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::email::EmailSender;
use crate::api::handlers::auth::NoopRateLimiter;
use crate::api::state::{AppConfig, AppState};
use crate::store::{MemoryStore, NewUser, UserRecord};
use crate::token::{RawHmacVerifier, SessionIssuer, TokenCodec, now_unix_seconds};

const TEST_SECRET: &str = "handler-test-secret";
const TEST_BASE_URL: &str = "http://localhost:3000";

/// Email sender that records raw one-time tokens instead of delivering them.
#[derive(Default)]
pub(crate) struct CapturingEmailSender {
    verification_tokens: Mutex<Vec<String>>,
    reset_tokens: Mutex<Vec<String>>,
}

impl CapturingEmailSender {
    fn push(store: &Mutex<Vec<String>>, token: &str) {
        store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(token.to_string());
    }

    fn last(store: &Mutex<Vec<String>>) -> Option<String> {
        store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl EmailSender for CapturingEmailSender {
    async fn send_verification_email(&self, _to: &str, _name: &str, raw_token: &str) -> Result<()> {
        Self::push(&self.verification_tokens, raw_token);
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        _to: &str,
        _name: &str,
        raw_token: &str,
    ) -> Result<()> {
        Self::push(&self.reset_tokens, raw_token);
        Ok(())
    }
}

thread_local! {
    static LAST_EMAILS: std::cell::RefCell<Option<Arc<CapturingEmailSender>>> =
        const { std::cell::RefCell::new(None) };
}

/// Build an `AppState` over fresh in-memory stores, a no-op rate limiter, and
/// a capturing email sender. The sender for the most recent state built on
/// this thread backs [`last_verification_token`] / [`last_reset_token`];
/// tokio's test runtime keeps each `#[tokio::test]` on one thread, so state
/// and captures stay paired.
pub(crate) fn test_state() -> Arc<AppState> {
    let store = Arc::new(MemoryStore::new());
    let emails = Arc::new(CapturingEmailSender::default());
    LAST_EMAILS.with(|slot| *slot.borrow_mut() = Some(emails.clone()));

    Arc::new(AppState::new(
        AppConfig::new(TEST_BASE_URL.to_string()),
        SessionIssuer::new(
            TokenCodec::new(SecretString::from(TEST_SECRET)),
            15 * 60,
            7 * 24 * 60 * 60,
        ),
        RawHmacVerifier::new(SecretString::from(TEST_SECRET)),
        Arc::new(NoopRateLimiter),
        store.clone(),
        store.clone(),
        store,
        emails,
    ))
}

/// Raw token from the most recent verification email on this thread.
pub(crate) fn last_verification_token(_state: &AppState) -> Option<String> {
    LAST_EMAILS.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|emails| CapturingEmailSender::last(&emails.verification_tokens))
    })
}

/// Raw token from the most recent password-reset email on this thread.
pub(crate) fn last_reset_token(_state: &AppState) -> Option<String> {
    LAST_EMAILS.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|emails| CapturingEmailSender::last(&emails.reset_tokens))
    })
}

/// Create a user directly through the store, mirroring what the register
/// handler persists.
pub(crate) async fn register_user(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<UserRecord> {
    use crate::api::handlers::auth::test_token_helpers::{generate, hash};
    use crate::store::password::hash_password;

    let raw_token = generate()?;
    let record = state
        .users()
        .create(NewUser {
            name: "Test User".to_string(),
            email: email.to_lowercase(),
            password_hash: hash_password(password)?,
            verification_token_hash: hash(&raw_token),
            verification_expires_unix: now_unix_seconds() + 24 * 60 * 60,
        })
        .await?;
    // Register the token as "emailed" so tests can redeem it.
    LAST_EMAILS.with(|slot| {
        if let Some(emails) = slot.borrow().as_ref() {
            CapturingEmailSender::push(&emails.verification_tokens, &raw_token);
        }
    });
    Ok(record)
}

/// Flip a user to verified, clearing the token fields like the handler does.
pub(crate) async fn verify_user(state: &AppState, email: &str) -> Result<UserRecord> {
    let mut record = state
        .users()
        .find_by_email(&email.to_lowercase())
        .await?
        .ok_or_else(|| anyhow::anyhow!("no such user: {email}"))?;
    record.verified = true;
    record.verification_token_hash = None;
    record.verification_expires_unix = None;
    state.users().save(&record).await?;
    Ok(record)
}
