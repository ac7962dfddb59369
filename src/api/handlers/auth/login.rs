//! Login endpoint.

use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::cookies::append_token_cookies;
use super::rate_limit::RateLimitAction;
use super::types::{LoginRequest, UserResponse};
use super::utils::normalize_email;
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;
use crate::store::password::verify_password;
use crate::token::{Identity, now_unix_seconds};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; session cookies set", body = Envelope),
        (status = 401, description = "Unknown email or wrong password", body = Envelope),
        (status = 403, description = "Account not verified", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let limit_key = super::enforce_rate_limit(&state, &headers, RateLimitAction::Login)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };

    let email = normalize_email(&request.email);
    // Unknown email and wrong password carry distinct field errors under the
    // same status, so the response pair does not confirm account existence.
    let Some(mut record) = state.users().find_by_email(&email).await? else {
        return Err(ApiError::authentication_field(
            "email",
            "No account found with this email",
        ));
    };
    if !verify_password(&request.password, &record.password_hash) {
        return Err(ApiError::authentication_field(
            "password",
            "Incorrect password",
        ));
    }

    if !record.verified {
        return Err(ApiError::Authorization {
            message: "Please verify your email address before logging in".to_string(),
            requires_verification: true,
        });
    }

    // The failure streak that fed the throttle ends here.
    state.rate_limiter().reset(&limit_key);

    record.last_login_unix = Some(now_unix_seconds());
    state.users().save(&record).await?;

    let pair = state.issuer().issue_pair(&Identity {
        sub: record.id,
        email: record.email.clone(),
        role: record.role,
        verified: record.verified,
    })?;

    let mut response = (
        StatusCode::OK,
        Json(Envelope::ok("Login successful").with_data(UserResponse::from(&record))),
    )
        .into_response();
    append_token_cookies(response.headers_mut(), &state, &pair);
    Ok(response)
}
