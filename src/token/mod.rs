//! Stateless bearer tokens: claims, signing codec, and issuance.
//!
//! Tokens are three dot-separated segments,
//! `base64url(header).base64url(payload).base64url(signature)`, with no
//! padding. The signature is HMAC-SHA256 over the `header.payload` substring
//! using one shared secret.
//!
//! Two verifier backends share that byte-level scheme: [`codec::TokenCodec`]
//! (signs and verifies, built on the `hmac` crate) and
//! [`raw::RawHmacVerifier`] (verify-only, built directly on the SHA-256
//! primitive so it can be embedded where the full codec cannot). The
//! conformance tests in `raw.rs` pin both backends to identical output; any
//! change to the encoding here must keep them in lockstep.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

pub mod codec;
pub mod issuer;
pub mod raw;

pub use codec::TokenCodec;
pub use issuer::{SessionIssuer, TokenPair};
pub use raw::RawHmacVerifier;

/// Account role carried inside token claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

/// Identity claim set minted into every token. Immutable once signed; a new
/// token must be issued to reflect account changes (e.g. verification).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub verified: bool,
}

/// Full token payload: the identity claim set plus issuance timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub verified: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            sub: self.sub,
            email: self.email.clone(),
            role: self.role,
            verified: self.verified,
        }
    }
}

/// Trait over the two verifier backends so callers can be swapped between
/// them (the route guard uses the raw backend, handlers use the codec).
pub trait TokenVerifier: Send + Sync {
    /// Verify a token and return its claims, or `None` for anything invalid:
    /// wrong segment count, bad signature, undecodable payload, or expiry at
    /// or before the current instant. Never panics or propagates errors.
    fn verify(&self, token: &str) -> Option<Claims>;
}

/// Unix seconds for token timestamps.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Split a compact token into exactly three non-empty segments.
pub(crate) fn split_segments(token: &str) -> Option<(&str, &str, &str)> {
    let mut parts = token.split('.');
    let header = parts.next()?;
    let payload = parts.next()?;
    let signature = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return None;
    }
    Some((header, payload, signature))
}

/// Decode a payload segment into claims and enforce expiry against `now`.
pub(crate) fn decode_claims(payload_b64: &str, now: i64) -> Option<Claims> {
    let bytes = URL_SAFE_NO_PAD.decode(payload_b64.as_bytes()).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    if claims.exp <= now {
        return None;
    }
    Some(claims)
}
