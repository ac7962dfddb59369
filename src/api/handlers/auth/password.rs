//! Forgot/reset password endpoints.

use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::error;

use super::rate_limit::RateLimitAction;
use super::types::{ForgotPasswordRequest, ResetPasswordRequest};
use super::utils::{
    generate_one_time_token, hash_one_time_token, normalize_email, valid_email, valid_password,
};
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;
use crate::store::password::hash_password;
use crate::token::now_unix_seconds;

/// Request a password-reset email. Always answers with the same generic 200,
/// whether or not the account exists.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Generic acknowledgement", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<Response, ApiError> {
    super::enforce_rate_limit(&state, &headers, RateLimitAction::ForgotPassword)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };

    let generic = || {
        (
            StatusCode::OK,
            Json(Envelope::ok(
                "If an account exists for that address, a password reset email is on its way",
            )),
        )
            .into_response()
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Ok(generic());
    }

    if let Some(mut record) = state.users().find_by_email(&email).await? {
        let raw_token = generate_one_time_token()?;
        record.reset_token_hash = Some(hash_one_time_token(&raw_token));
        record.reset_expires_unix =
            Some(now_unix_seconds().saturating_add(state.config().reset_ttl_seconds()));
        state.users().save(&record).await?;

        if let Err(err) = state
            .email()
            .send_password_reset_email(&record.email, &record.name, &raw_token)
            .await
        {
            error!("Failed to send password reset email: {err:#}");
        }
    }

    Ok(generic())
}

/// Redeem a reset token and install a new password.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = Envelope),
        (status = 400, description = "Invalid or expired token, or weak password", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<Response, ApiError> {
    super::enforce_rate_limit(&state, &headers, RateLimitAction::ResetPassword)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };

    let token = request.token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("token", "Reset token is required"));
    }
    if !valid_password(&request.password) {
        return Err(ApiError::validation(
            "password",
            "Password must be at least 8 characters",
        ));
    }

    let token_hash = hash_one_time_token(token);
    let Some(mut record) = state.users().find_by_reset_token_hash(&token_hash).await? else {
        return Err(ApiError::validation(
            "token",
            "Invalid or expired reset token",
        ));
    };

    let expired = record
        .reset_expires_unix
        .is_none_or(|expires| expires <= now_unix_seconds());
    if expired {
        return Err(ApiError::validation(
            "token",
            "Invalid or expired reset token",
        ));
    }

    record.password_hash = hash_password(&request.password)?;
    record.reset_token_hash = None;
    record.reset_expires_unix = None;
    state.users().save(&record).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::ok(
            "Password updated. You can now log in with your new password.",
        )),
    )
        .into_response())
}
