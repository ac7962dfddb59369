//! Error taxonomy and the uniform response envelope.
//!
//! Every JSON response uses `{success, message, data?, errors?}`. Handler
//! failures are `ApiError` values; conversion to a response picks the status,
//! fills the envelope, and adds `Retry-After` for throttled requests.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Uniform response envelope.
#[derive(Serialize, Debug, ToSchema)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl Envelope {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    /// Attach serialized payload data. Serialization of our own response
    /// types cannot fail; a failure degrades to an envelope without data.
    #[must_use]
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Build a one-entry field error map.
#[must_use]
pub fn field_errors(field: &str, message: &str) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    errors.insert(field.to_string(), message.to_string());
    errors
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),
    #[error("{message}")]
    Authentication {
        message: String,
        errors: Option<BTreeMap<String, String>>,
    },
    #[error("{message}")]
    Authorization {
        message: String,
        requires_verification: bool,
    },
    #[error("too many requests")]
    RateLimited { retry_after_seconds: u64 },
    #[error("resource not found")]
    NotFound,
    #[error("conflict")]
    Conflict(BTreeMap<String, String>),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation(field_errors(field, message))
    }

    #[must_use]
    pub fn authentication(message: &str) -> Self {
        Self::Authentication {
            message: message.to_string(),
            errors: None,
        }
    }

    /// 401 with a field-level error; the status stays identical across
    /// fields so responses do not reveal which part was wrong to a prober.
    #[must_use]
    pub fn authentication_field(field: &str, message: &str) -> Self {
        Self::Authentication {
            message: "Invalid credentials".to_string(),
            errors: Some(field_errors(field, message)),
        }
    }

    #[must_use]
    pub fn conflict(field: &str, message: &str) -> Self {
        Self::Conflict(field_errors(field, message))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => {
                Self::conflict("email", "An account with this email already exists")
            }
            StoreError::NotFound => Self::NotFound,
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(Envelope::fail("Invalid request").with_errors(errors)),
            )
                .into_response(),
            Self::Authentication { message, errors } => {
                let mut envelope = Envelope::fail(message);
                if let Some(errors) = errors {
                    envelope = envelope.with_errors(errors);
                }
                (StatusCode::UNAUTHORIZED, Json(envelope)).into_response()
            }
            Self::Authorization {
                message,
                requires_verification,
            } => {
                let mut envelope = Envelope::fail(message);
                if requires_verification {
                    envelope =
                        envelope.with_data(serde_json::json!({ "requires_verification": true }));
                }
                (StatusCode::FORBIDDEN, Json(envelope)).into_response()
            }
            Self::RateLimited {
                retry_after_seconds,
            } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(Envelope::fail("Too many requests, slow down")),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                    response.headers_mut().insert(RETRY_AFTER, value);
                }
                response
            }
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(Envelope::fail("Resource not found")),
            )
                .into_response(),
            Self::Conflict(errors) => (
                StatusCode::CONFLICT,
                Json(Envelope::fail("Conflict").with_errors(errors)),
            )
                .into_response(),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Envelope::fail("Something went wrong")),
                )
                    .into_response()
            }
        }
    }
}
