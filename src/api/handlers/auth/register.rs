//! Registration endpoint.

use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

use super::cookies::append_token_cookies;
use super::rate_limit::RateLimitAction;
use super::types::{RegisterRequest, UserResponse};
use super::utils::{
    generate_one_time_token, hash_one_time_token, normalize_email, valid_email, valid_password,
};
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;
use crate::store::NewUser;
use crate::store::password::hash_password;
use crate::token::{Identity, now_unix_seconds};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; session cookies set", body = Envelope),
        (status = 400, description = "Invalid fields", body = Envelope),
        (status = 409, description = "Email already registered", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Response, ApiError> {
    super::enforce_rate_limit(&state, &headers, RateLimitAction::Register)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };

    let name = request.name.trim().to_string();
    let email = normalize_email(&request.email);
    let mut errors = BTreeMap::new();
    if name.is_empty() {
        errors.insert("name".to_string(), "Name is required".to_string());
    }
    if !valid_email(&email) {
        errors.insert("email".to_string(), "A valid email is required".to_string());
    }
    if !valid_password(&request.password) {
        errors.insert(
            "password".to_string(),
            "Password must be at least 8 characters".to_string(),
        );
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let raw_token = generate_one_time_token()?;
    let record = state
        .users()
        .create(NewUser {
            name,
            email,
            password_hash: hash_password(&request.password)?,
            verification_token_hash: hash_one_time_token(&raw_token),
            verification_expires_unix: now_unix_seconds()
                .saturating_add(state.config().verification_ttl_seconds()),
        })
        .await?;

    // Delivery is best-effort: the account exists even if the email never
    // arrives; the user can request a resend.
    if let Err(err) = state
        .email()
        .send_verification_email(&record.email, &record.name, &raw_token)
        .await
    {
        error!("Failed to send verification email: {err:#}");
    }

    // The account is session-active immediately; the route guard enforces
    // the verification gate for protected routes.
    let pair = state.issuer().issue_pair(&Identity {
        sub: record.id,
        email: record.email.clone(),
        role: record.role,
        verified: record.verified,
    })?;

    let mut response = (
        StatusCode::CREATED,
        Json(
            Envelope::ok("Account created. Check your email to verify your address.")
                .with_data(UserResponse::from(&record)),
        ),
    )
        .into_response();
    append_token_cookies(response.headers_mut(), &state, &pair);
    Ok(response)
}
