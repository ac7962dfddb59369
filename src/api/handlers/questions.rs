//! Question CRUD endpoints.
//!
//! Reads are public; mutations require a verified account. Mutating someone
//! else's question returns `404 Not Found` rather than `403 Forbidden` to
//! prevent resource enumeration.

use axum::Json;
use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::{Principal, require_verified};
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;
use crate::store::{NewQuestion, QuestionRecord};
use crate::token::{Role, now_unix_seconds};

const MAX_TAGS: usize = 5;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct QuestionRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct QuestionResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at_unix: i64,
    pub updated_at_unix: i64,
}

impl From<&QuestionRecord> for QuestionResponse {
    fn from(record: &QuestionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            author_id: record.author_id.to_string(),
            title: record.title.clone(),
            body: record.body.clone(),
            tags: record.tags.clone(),
            created_at_unix: record.created_at_unix,
            updated_at_unix: record.updated_at_unix,
        }
    }
}

/// Moderators and admins may edit or remove any question.
fn can_moderate(principal: &Principal) -> bool {
    matches!(principal.role, Role::Moderator | Role::Admin)
}

fn validate_question(request: &QuestionRequest) -> Result<(String, String, Vec<String>), ApiError> {
    let title = request.title.trim().to_string();
    let body = request.body.trim().to_string();
    let tags: Vec<String> = request
        .tags
        .iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();

    let mut errors = BTreeMap::new();
    if title.is_empty() {
        errors.insert("title".to_string(), "Title is required".to_string());
    }
    if body.is_empty() {
        errors.insert("body".to_string(), "Body is required".to_string());
    }
    if tags.len() > MAX_TAGS {
        errors.insert("tags".to_string(), format!("At most {MAX_TAGS} tags"));
    }
    if errors.is_empty() {
        Ok((title, body, tags))
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[utoipa::path(
    get,
    path = "/api/questions",
    responses(
        (status = 200, description = "All questions, newest first", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn list_questions(state: Extension<Arc<AppState>>) -> Result<Response, ApiError> {
    let questions = state.questions().list().await?;
    let data: Vec<QuestionResponse> = questions.iter().map(QuestionResponse::from).collect();
    Ok((StatusCode::OK, Json(Envelope::ok("OK").with_data(data))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = QuestionRequest,
    responses(
        (status = 201, description = "Question created", body = Envelope),
        (status = 400, description = "Invalid fields", body = Envelope),
        (status = 401, description = "Not authenticated", body = Envelope),
        (status = 403, description = "Account not verified", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn create_question(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<QuestionRequest>>,
) -> Result<Response, ApiError> {
    let principal = require_verified(&headers, &state)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };
    let (title, body, tags) = validate_question(&request)?;

    let record = state
        .questions()
        .create(NewQuestion {
            author_id: principal.user_id,
            title,
            body,
            tags,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Question posted").with_data(QuestionResponse::from(&record))),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    params(("id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "The question", body = Envelope),
        (status = 404, description = "No such question", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn get_question(
    Path(id): Path<Uuid>,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let Some(record) = state.questions().find_by_id(id).await? else {
        return Err(ApiError::NotFound);
    };
    Ok((
        StatusCode::OK,
        Json(Envelope::ok("OK").with_data(QuestionResponse::from(&record))),
    )
        .into_response())
}

#[utoipa::path(
    put,
    path = "/api/questions/{id}",
    params(("id" = String, Path, description = "Question id")),
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = Envelope),
        (status = 400, description = "Invalid fields", body = Envelope),
        (status = 401, description = "Not authenticated", body = Envelope),
        (status = 404, description = "No such question (or not the author)", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn update_question(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<QuestionRequest>>,
) -> Result<Response, ApiError> {
    let principal = require_verified(&headers, &state)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };
    let (title, body, tags) = validate_question(&request)?;

    let Some(mut record) = state.questions().find_by_id(id).await? else {
        return Err(ApiError::NotFound);
    };
    if record.author_id != principal.user_id && !can_moderate(&principal) {
        return Err(ApiError::NotFound);
    }

    record.title = title;
    record.body = body;
    record.tags = tags;
    record.updated_at_unix = now_unix_seconds();
    state.questions().save(&record).await?;

    Ok((
        StatusCode::OK,
        Json(Envelope::ok("Question updated").with_data(QuestionResponse::from(&record))),
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    params(("id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question and its answers removed", body = Envelope),
        (status = 401, description = "Not authenticated", body = Envelope),
        (status = 404, description = "No such question (or not the author)", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn delete_question(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let principal = require_verified(&headers, &state)?;

    let Some(record) = state.questions().find_by_id(id).await? else {
        return Err(ApiError::NotFound);
    };
    if record.author_id != principal.user_id && !can_moderate(&principal) {
        return Err(ApiError::NotFound);
    }

    state.questions().delete(id).await?;
    state.answers().delete_for_question(id).await?;

    Ok((StatusCode::OK, Json(Envelope::ok("Question deleted"))).into_response())
}
