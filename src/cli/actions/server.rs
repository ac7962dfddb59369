use crate::api;
use crate::api::email::{EmailSender, HttpEmailSender, LogEmailSender};
use crate::api::handlers::auth::{FixedWindowLimiter, spawn_sweeper};
use crate::api::state::{AppConfig, AppState};
use crate::store::MemoryStore;
use crate::token::{RawHmacVerifier, SessionIssuer, TokenCodec};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub secret: String,
    pub public_base_url: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub verification_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    pub rate_limit_sweep_seconds: u64,
    pub mail_endpoint: Option<String>,
    pub mail_api_key: Option<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if state construction or the server itself fails.
pub async fn execute(args: Args) -> Result<()> {
    let secret = SecretString::from(args.secret);

    let config = AppConfig::new(args.public_base_url.clone())
        .with_access_ttl_seconds(args.access_ttl_seconds)
        .with_refresh_ttl_seconds(args.refresh_ttl_seconds)
        .with_verification_ttl_seconds(args.verification_ttl_seconds)
        .with_reset_ttl_seconds(args.reset_ttl_seconds);

    let issuer = SessionIssuer::new(
        TokenCodec::new(secret.clone()),
        args.access_ttl_seconds,
        args.refresh_ttl_seconds,
    );
    let guard_verifier = RawHmacVerifier::new(secret);

    let limiter = Arc::new(FixedWindowLimiter::new());
    spawn_sweeper(
        limiter.clone(),
        Duration::from_secs(args.rate_limit_sweep_seconds.max(1)),
    );

    // Missing mail credentials degrade delivery to a logging no-op so
    // non-production flows keep working.
    let email: Arc<dyn EmailSender> = match (args.mail_endpoint, args.mail_api_key) {
        (Some(endpoint), Some(api_key)) => Arc::new(HttpEmailSender::new(
            endpoint,
            SecretString::from(api_key),
            args.public_base_url.clone(),
        )?),
        _ => {
            info!("No mail endpoint configured; emails will be logged only");
            Arc::new(LogEmailSender::new(args.public_base_url.clone()))
        }
    };

    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(
        config,
        issuer,
        guard_verifier,
        limiter,
        store.clone(),
        store.clone(),
        store,
        email,
    ));

    api::new(args.port, state).await
}
