//! Authenticated principal extraction for API handlers.
//!
//! Handlers authenticate through the issuer's codec backend; the route guard
//! has its own verifier. Both accept the same tokens — the conformance tests
//! in `token::raw` keep that true.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::cookies::extract_access_token;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::token::Role;

/// Authenticated user context derived from a verified access token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub verified: bool,
}

/// Resolve the access token into a principal, or 401 when absent/invalid.
/// Absent and bad credentials are indistinguishable to the caller.
pub(crate) fn require_auth(headers: &HeaderMap, state: &AppState) -> Result<Principal, ApiError> {
    let Some(token) = extract_access_token(headers) else {
        return Err(ApiError::authentication("Authentication required"));
    };
    let Some(claims) = state.issuer().verify(&token) else {
        return Err(ApiError::authentication("Authentication required"));
    };
    Ok(Principal {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
        verified: claims.verified,
    })
}

/// Like [`require_auth`], but additionally requires a verified account.
pub(crate) fn require_verified(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Principal, ApiError> {
    let principal = require_auth(headers, state)?;
    if !principal.verified {
        return Err(ApiError::Authorization {
            message: "Please verify your email address first".to_string(),
            requires_verification: true,
        });
    }
    Ok(principal)
}
