//! Token refresh endpoint.

use axum::Json;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::cookies::{REFRESH_COOKIE_NAME, append_token_cookies, extract_cookie};
use super::rate_limit::RateLimitAction;
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;

/// Exchange the refresh cookie for a new access/refresh pair.
///
/// Rotation is stateless: the old refresh token is superseded, not revoked.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New token pair issued; cookies replaced", body = Envelope),
        (status = 401, description = "Missing, invalid, or expired refresh token", body = Envelope),
        (status = 429, description = "Rate limited", body = Envelope)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    super::enforce_rate_limit(&state, &headers, RateLimitAction::Refresh)?;

    let Some(token) = extract_cookie(&headers, REFRESH_COOKIE_NAME) else {
        return Err(ApiError::authentication("Refresh token required"));
    };

    let Some(pair) = state.issuer().rotate(&token)? else {
        // Expired or forged refresh tokens require a full re-login.
        return Err(ApiError::authentication("Session expired, please log in again"));
    };

    let mut response = (StatusCode::OK, Json(Envelope::ok("Session refreshed"))).into_response();
    append_token_cookies(response.headers_mut(), &state, &pair);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use crate::token::{Identity, Role};
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            sub: Uuid::from_u128(11),
            email: "omar@example.com".to_string(),
            role: Role::User,
            verified: true,
        }
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_401() {
        let state = Extension(test_state());
        let result = refresh(HeaderMap::new(), state).await;
        assert!(matches!(result, Err(ApiError::Authentication { .. })));
    }

    #[tokio::test]
    async fn refresh_with_garbage_cookie_is_401() -> anyhow::Result<()> {
        let state = Extension(test_state());
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("refresh_token=garbage"));
        let result = refresh(headers, state).await;
        assert!(matches!(result, Err(ApiError::Authentication { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rotates_both_cookies_with_same_identity() -> anyhow::Result<()> {
        let state = test_state();
        let token = state.issuer().issue_refresh(&identity())?;
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("refresh_token={token}"))?,
        );

        let response = refresh(headers, Extension(state.clone()))
            .await
            .map_err(|err| anyhow::anyhow!("refresh failed: {err}"))?;
        assert_eq!(response.status(), StatusCode::OK);

        let cookies: Vec<String> = response
            .headers()
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok().map(str::to_string))
            .collect();
        let access = cookies
            .iter()
            .find_map(|c| c.strip_prefix("access_token="))
            .and_then(|rest| rest.split(';').next())
            .expect("access cookie set");
        let claims = state.issuer().verify(access).expect("new access verifies");
        assert_eq!(claims.identity(), identity());
        Ok(())
    }
}
