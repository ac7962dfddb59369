use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router, middleware,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, options},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use url::Url;

use crate::api::handlers::{health, root};
use crate::api::state::AppState;

pub(crate) mod email;
pub mod error;
pub(crate) mod guard;
pub(crate) mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;
pub mod state;
#[cfg(test)]
pub(crate) mod test_support;

pub use email::{EmailSender, HttpEmailSender, LogEmailSender};
pub use handlers::auth::{FixedWindowLimiter, NoopRateLimiter, RateLimiter, spawn_sweeper};
pub use openapi::openapi;

/// Build the full application router: documented routes, the undocumented
/// `/` and preflight `OPTIONS /health`, the route guard, and the layer stack.
///
/// # Errors
/// Returns an error if the configured public base URL cannot be turned into
/// a CORS origin.
pub fn app(state: Arc<AppState>) -> Result<Router> {
    let origin = public_origin(state.config().public_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true);

    // Build the router from OpenAPI-wired routes, then extend it with non-doc
    // routes. The spec stays in openapi.rs for the `openapi` binary.
    let (router, _openapi) = openapi::api_router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(middleware::from_fn_with_state(state.clone(), guard::guard))
                .layer(Extension(state)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: Arc<AppState>) -> Result<()> {
    let app = app(state)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn public_origin(public_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(public_base_url)
        .with_context(|| format!("Invalid public base URL: {public_base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Public base URL must include a valid host: {public_base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build public origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_origin_strips_path_and_keeps_port() -> Result<()> {
        let origin = public_origin("http://localhost:3000/app/")?;
        assert_eq!(origin, HeaderValue::from_static("http://localhost:3000"));

        let origin = public_origin("https://demando.dev")?;
        assert_eq!(origin, HeaderValue::from_static("https://demando.dev"));
        Ok(())
    }

    #[test]
    fn public_origin_rejects_garbage() {
        assert!(public_origin("not a url").is_err());
    }

    #[test]
    fn app_builds_with_test_state() -> Result<()> {
        let state = test_support::test_state();
        let _router = app(state)?;
        Ok(())
    }
}
