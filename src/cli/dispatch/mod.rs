//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, email};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let secret = matches
        .get_one::<String>(auth::ARG_SECRET)
        .cloned()
        .context("missing required argument: --secret")?;
    let public_base_url = matches
        .get_one::<String>(auth::ARG_PUBLIC_BASE_URL)
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    let ttl = |name: &str, default: u64| -> i64 {
        let seconds = matches.get_one::<u64>(name).copied().unwrap_or(default);
        i64::try_from(seconds).unwrap_or(i64::MAX)
    };

    Ok(Action::Server(Args {
        port,
        secret,
        public_base_url,
        access_ttl_seconds: ttl(auth::ARG_ACCESS_TTL, 15 * 60),
        refresh_ttl_seconds: ttl(auth::ARG_REFRESH_TTL, 7 * 24 * 60 * 60),
        verification_ttl_seconds: ttl(auth::ARG_VERIFICATION_TTL, 24 * 60 * 60),
        reset_ttl_seconds: ttl(auth::ARG_RESET_TTL, 60 * 60),
        rate_limit_sweep_seconds: matches
            .get_one::<u64>(auth::ARG_RATE_LIMIT_SWEEP_SECONDS)
            .copied()
            .unwrap_or(300),
        mail_endpoint: matches.get_one::<String>(email::ARG_MAIL_ENDPOINT).cloned(),
        mail_api_key: matches.get_one::<String>(email::ARG_MAIL_API_KEY).cloned(),
    }))
}
