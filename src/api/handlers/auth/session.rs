//! Session endpoints: logout and the authenticated profile.

use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::cookies::append_clear_cookies;
use super::principal::require_auth;
use super::types::UserResponse;
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;

/// Clear both token cookies. Stateless: nothing is revoked server-side, the
/// browser just forgets its credentials.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Cookies cleared", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> Response {
    let mut response = (StatusCode::OK, Json(Envelope::ok("Logged out"))).into_response();
    append_clear_cookies(response.headers_mut(), &state);
    response
}

/// Return the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Authenticated user profile", body = Envelope),
        (status = 401, description = "Missing or invalid access token", body = Envelope),
        (status = 404, description = "Token subject no longer exists", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let principal = require_auth(&headers, &state)?;

    let Some(record) = state.users().find_by_id(principal.user_id).await? else {
        return Err(ApiError::NotFound);
    };

    Ok((
        StatusCode::OK,
        Json(Envelope::ok("OK").with_data(UserResponse::from(&record))),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{register_user, test_state};
    use crate::token::{Identity, Role};
    use axum::http::HeaderValue;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use uuid::Uuid;

    #[tokio::test]
    async fn logout_expires_both_cookies() {
        let state = Extension(test_state());
        let response = logout(state).await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn me_requires_a_token() {
        let state = Extension(test_state());
        let result = me(HeaderMap::new(), state).await;
        assert!(matches!(result, Err(ApiError::Authentication { .. })));
    }

    #[tokio::test]
    async fn me_returns_the_profile() -> anyhow::Result<()> {
        let state = test_state();
        let record = register_user(&state, "pia@example.com", "password123").await?;
        let token = state.issuer().issue_access(&Identity {
            sub: record.id,
            email: record.email.clone(),
            role: record.role,
            verified: record.verified,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("access_token={token}"))?,
        );
        let response = me(headers, Extension(state))
            .await
            .map_err(|err| anyhow::anyhow!("me failed: {err}"))?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn me_is_404_for_vanished_subjects() -> anyhow::Result<()> {
        let state = test_state();
        let token = state.issuer().issue_access(&Identity {
            sub: Uuid::new_v4(),
            email: "ghost@example.com".to_string(),
            role: Role::User,
            verified: true,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("access_token={token}"))?,
        );
        let result = me(headers, Extension(state)).await;
        assert!(matches!(result, Err(ApiError::NotFound)));
        Ok(())
    }
}
