//! Email verification endpoints.

use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::error;

use super::rate_limit::RateLimitAction;
use super::types::{ResendVerificationRequest, VerifyEmailRequest};
use super::utils::{generate_one_time_token, hash_one_time_token, normalize_email, valid_email};
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;
use crate::token::now_unix_seconds;

/// Consume the emailed token and mark the account verified.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = Envelope),
        (status = 400, description = "Invalid or expired token", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<Response, ApiError> {
    super::enforce_rate_limit(&state, &headers, RateLimitAction::VerifyEmail)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };
    let token = request.token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("token", "Verification token is required"));
    }

    // Hash before lookup; raw tokens are never stored server-side.
    let token_hash = hash_one_time_token(token);
    let Some(mut record) = state
        .users()
        .find_by_verification_token_hash(&token_hash)
        .await?
    else {
        return Err(ApiError::validation(
            "token",
            "Invalid or expired verification token",
        ));
    };

    // A crash between save and response can leave a verified account still
    // holding its token; a retried click must succeed.
    if record.verified {
        return Ok((
            StatusCode::OK,
            Json(Envelope::ok("Email already verified")),
        )
            .into_response());
    }

    let expired = record
        .verification_expires_unix
        .is_none_or(|expires| expires <= now_unix_seconds());
    if expired {
        return Err(ApiError::validation(
            "token",
            "Invalid or expired verification token",
        ));
    }

    record.verified = true;
    record.verification_token_hash = None;
    record.verification_expires_unix = None;
    state.users().save(&record).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::ok("Email verified. You can now log in.")),
    )
        .into_response())
}

/// Resend a verification email (always a generic 200 to avoid enumeration).
#[utoipa::path(
    post,
    path = "/api/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Resend accepted", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> Result<Response, ApiError> {
    super::enforce_rate_limit(&state, &headers, RateLimitAction::ResendVerification)?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };

    let generic = || {
        (
            StatusCode::OK,
            Json(Envelope::ok(
                "If an unverified account exists for that address, a new verification email is on its way",
            )),
        )
            .into_response()
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Ok(generic());
    }

    if let Some(mut record) = state.users().find_by_email(&email).await?
        && !record.verified
    {
        let raw_token = generate_one_time_token()?;
        record.verification_token_hash = Some(hash_one_time_token(&raw_token));
        record.verification_expires_unix = Some(
            now_unix_seconds().saturating_add(state.config().verification_ttl_seconds()),
        );
        state.users().save(&record).await?;

        if let Err(err) = state
            .email()
            .send_verification_email(&record.email, &record.name, &raw_token)
            .await
        {
            error!("Failed to resend verification email: {err:#}");
        }
    }

    Ok(generic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{last_verification_token, register_user, test_state};

    #[tokio::test]
    async fn verify_email_empty_token_is_rejected() {
        let state = Extension(test_state());
        let result = verify_email(
            HeaderMap::new(),
            state,
            Some(Json(VerifyEmailRequest {
                token: " ".to_string(),
            })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn verify_email_unknown_token_is_rejected() {
        let state = Extension(test_state());
        let result = verify_email(
            HeaderMap::new(),
            state,
            Some(Json(VerifyEmailRequest {
                token: "no-such-token".to_string(),
            })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn verify_email_consumes_token_and_sets_flag() -> anyhow::Result<()> {
        let state = test_state();
        let record = register_user(&state, "hana@example.com", "password123").await?;
        let token = last_verification_token(&state).expect("token captured");

        let response = verify_email(
            HeaderMap::new(),
            Extension(state.clone()),
            Some(Json(VerifyEmailRequest { token })),
        )
        .await
        .map_err(|err| anyhow::anyhow!("verify failed: {err}"))?;
        assert_eq!(response.status(), StatusCode::OK);

        let reloaded = state
            .users()
            .find_by_id(record.id)
            .await?
            .expect("user exists");
        assert!(reloaded.verified);
        assert!(reloaded.verification_token_hash.is_none());
        assert!(reloaded.verification_expires_unix.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn verify_email_expired_token_is_rejected() -> anyhow::Result<()> {
        let state = test_state();
        let record = register_user(&state, "ivy@example.com", "password123").await?;
        let token = last_verification_token(&state).expect("token captured");

        let mut stale = state
            .users()
            .find_by_id(record.id)
            .await?
            .expect("user exists");
        stale.verification_expires_unix = Some(now_unix_seconds() - 1);
        state.users().save(&stale).await?;

        let result = verify_email(
            HeaderMap::new(),
            Extension(state),
            Some(Json(VerifyEmailRequest { token })),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn reverifying_a_verified_account_is_a_noop_success() -> anyhow::Result<()> {
        let state = test_state();
        let record = register_user(&state, "jay@example.com", "password123").await?;
        let token = last_verification_token(&state).expect("token captured");

        // Simulate the crash window: verified flag set, token still stored.
        let mut partial = state
            .users()
            .find_by_id(record.id)
            .await?
            .expect("user exists");
        partial.verified = true;
        state.users().save(&partial).await?;

        let response = verify_email(
            HeaderMap::new(),
            Extension(state),
            Some(Json(VerifyEmailRequest { token })),
        )
        .await
        .map_err(|err| anyhow::anyhow!("verify failed: {err}"))?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn resend_is_generic_for_unknown_accounts() -> anyhow::Result<()> {
        let state = Extension(test_state());
        let response = resend_verification(
            HeaderMap::new(),
            state,
            Some(Json(ResendVerificationRequest {
                email: "nobody@example.com".to_string(),
            })),
        )
        .await
        .map_err(|err| anyhow::anyhow!("resend failed: {err}"))?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn resend_mints_a_fresh_token_for_unverified_accounts() -> anyhow::Result<()> {
        let state = test_state();
        let record = register_user(&state, "kira@example.com", "password123").await?;
        let first = last_verification_token(&state).expect("token captured");

        resend_verification(
            HeaderMap::new(),
            Extension(state.clone()),
            Some(Json(ResendVerificationRequest {
                email: "kira@example.com".to_string(),
            })),
        )
        .await
        .map_err(|err| anyhow::anyhow!("resend failed: {err}"))?;

        let second = last_verification_token(&state).expect("token captured");
        assert_ne!(first, second);

        let reloaded = state
            .users()
            .find_by_id(record.id)
            .await?
            .expect("user exists");
        assert_eq!(
            reloaded.verification_token_hash,
            Some(hash_one_time_token(&second))
        );
        Ok(())
    }
}
