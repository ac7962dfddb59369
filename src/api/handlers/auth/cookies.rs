//! Auth cookie handling for the access/refresh token pair.

use axum::http::header::{AUTHORIZATION, COOKIE, InvalidHeaderValue, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use crate::api::state::AppState;
use crate::token::TokenPair;

pub(crate) const ACCESS_COOKIE_NAME: &str = "access_token";
pub(crate) const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Build a secure `HttpOnly` cookie for one token.
fn token_cookie(
    name: &str,
    token: &str,
    max_age_seconds: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Append `Set-Cookie` headers for a freshly minted pair.
pub(crate) fn append_token_cookies(headers: &mut HeaderMap, state: &AppState, pair: &TokenPair) {
    let secure = state.config().cookie_secure();
    if let Ok(cookie) = token_cookie(
        ACCESS_COOKIE_NAME,
        &pair.access,
        state.issuer().access_ttl_seconds(),
        secure,
    ) {
        headers.append(SET_COOKIE, cookie);
    }
    if let Ok(cookie) = token_cookie(
        REFRESH_COOKIE_NAME,
        &pair.refresh,
        state.issuer().refresh_ttl_seconds(),
        secure,
    ) {
        headers.append(SET_COOKIE, cookie);
    }
}

/// Append `Set-Cookie` headers that expire both tokens.
pub(crate) fn append_clear_cookies(headers: &mut HeaderMap, state: &AppState) {
    let secure = state.config().cookie_secure();
    for name in [ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME] {
        if let Ok(cookie) = clear_cookie(name, secure) {
            headers.append(SET_COOKIE, cookie);
        }
    }
}

/// Read one cookie value from the request headers.
pub(crate) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name {
            return Some(val.to_string());
        }
    }
    None
}

/// Access token from the `Authorization: Bearer` header or the cookie.
pub(crate) fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    extract_cookie(headers, ACCESS_COOKIE_NAME)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_includes_attributes() {
        let cookie = token_cookie(ACCESS_COOKIE_NAME, "tok", 900, false).expect("valid header");
        let value = cookie.to_str().expect("ascii");
        assert!(value.starts_with("access_token=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age=900"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn secure_flag_appended_for_https_sites() {
        let cookie = token_cookie(REFRESH_COOKIE_NAME, "tok", 60, true).expect("valid header");
        assert!(cookie.to_str().expect("ascii").ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(ACCESS_COOKIE_NAME, false).expect("valid header");
        assert!(cookie.to_str().expect("ascii").contains("Max-Age=0"));
    }

    #[test]
    fn extract_cookie_finds_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc; refresh_token=def"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_COOKIE_NAME),
            Some("abc".to_string())
        );
        assert_eq!(
            extract_cookie(&headers, REFRESH_COOKIE_NAME),
            Some("def".to_string())
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("access_token=from-cookie"),
        );
        assert_eq!(
            extract_access_token(&headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn empty_bearer_falls_through_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=abc"));
        assert_eq!(extract_access_token(&headers), Some("abc".to_string()));
    }
}
