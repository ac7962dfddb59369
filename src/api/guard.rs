//! Route guard middleware.
//!
//! Classifies every inbound path and decides allow/redirect from the access
//! cookie alone, before routing. The decision is stateless per request:
//!
//! | Route class | Anonymous | Unverified | Verified |
//! |-------------|-----------|------------|----------|
//! | Protected   | login     | login      | allow    |
//! | AuthOnly    | allow     | allow      | dashboard|
//! | Public      | allow     | allow      | allow    |
//!
//! The API namespace, `/health`, and static assets bypass the guard so token
//! issuance and the app shell stay reachable. Verification runs on the
//! raw-primitive backend, not the issuer's codec.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use super::handlers::auth::cookies::{ACCESS_COOKIE_NAME, extract_cookie};
use super::state::AppState;
use crate::token::TokenVerifier;

const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/profile", "/ask", "/collections"];
const AUTH_ONLY_PREFIXES: &[&str] = &["/login", "/register", "/forgot-password", "/reset-password"];
const BYPASS_PREFIXES: &[&str] = &["/api/", "/assets/", "/static/"];

const LOGIN_PATH: &str = "/login";
const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RouteClass {
    Protected,
    AuthOnly,
    Public,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AccessState {
    Anonymous,
    Unverified,
    Verified,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Decision {
    Allow,
    RedirectToLogin { return_to: String },
    RedirectToDashboard,
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// Classify a path, or `None` when the guard does not apply at all.
pub(crate) fn classify(path: &str) -> Option<RouteClass> {
    if path == "/health" || BYPASS_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return None;
    }
    // Asset files (anything with an extension in the last segment) skip the
    // guard so the app shell can always load its resources.
    if path
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('.'))
    {
        return None;
    }

    if PROTECTED_PREFIXES
        .iter()
        .any(|prefix| matches_prefix(path, prefix))
    {
        return Some(RouteClass::Protected);
    }
    if AUTH_ONLY_PREFIXES
        .iter()
        .any(|prefix| matches_prefix(path, prefix))
    {
        return Some(RouteClass::AuthOnly);
    }
    Some(RouteClass::Public)
}

/// The decision table, as a pure function of class and access state.
pub(crate) fn decide(class: RouteClass, access: AccessState, path: &str) -> Decision {
    match (class, access) {
        (RouteClass::Protected, AccessState::Anonymous | AccessState::Unverified) => {
            Decision::RedirectToLogin {
                return_to: path.to_string(),
            }
        }
        (RouteClass::AuthOnly, AccessState::Verified) => Decision::RedirectToDashboard,
        _ => Decision::Allow,
    }
}

fn access_state(headers: &HeaderMap, verifier: &dyn TokenVerifier) -> AccessState {
    let Some(token) = extract_cookie(headers, ACCESS_COOKIE_NAME) else {
        return AccessState::Anonymous;
    };
    match verifier.verify(&token) {
        Some(claims) if claims.verified => AccessState::Verified,
        Some(_) => AccessState::Unverified,
        None => AccessState::Anonymous,
    }
}

/// Build the login redirect, capturing the original path as a return target.
fn login_location(return_to: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", return_to)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

/// Guard middleware applied ahead of routing.
pub(crate) async fn guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let Some(class) = classify(&path) else {
        return next.run(request).await;
    };

    let access = access_state(request.headers(), state.guard_verifier());
    match decide(class, access, &path) {
        Decision::Allow => next.run(request).await,
        Decision::RedirectToLogin { return_to } => {
            Redirect::temporary(&login_location(&return_to)).into_response()
        }
        Decision::RedirectToDashboard => Redirect::temporary(DASHBOARD_PATH).into_response(),
    }
}
