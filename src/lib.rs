//! # Demando (Q&A Platform API)
//!
//! `demando` is the authentication and API service for a question-and-answer
//! platform. It handles registration with email verification, password login,
//! stateless access/refresh token issuance with rotation, route guarding, and
//! question/answer CRUD.
//!
//! ## Authentication
//!
//! Sessions are stateless bearer tokens: a short-lived access token and a
//! long-lived refresh token, both HMAC-SHA256 signed compact tokens delivered
//! as `HttpOnly` cookies. No server-side session record is kept; logout and
//! rotation only replace cookies.
//!
//! ## Verification gate
//!
//! Accounts are session-active immediately after registration, but the route
//! guard (not login) blocks unverified accounts from protected routes until
//! the emailed verification token is consumed.
//!
//! ## Storage
//!
//! User, question, and answer documents live behind repository traits; the
//! bundled backend is an in-process map suitable for single-node deployments
//! and tests.

pub mod api;
pub mod cli;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
