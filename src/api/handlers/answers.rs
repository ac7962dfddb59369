//! Answer endpoints, nested under questions.

use axum::Json;
use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::require_verified;
use crate::api::error::{ApiError, Envelope};
use crate::api::state::AppState;
use crate::store::{AnswerRecord, NewAnswer};
use crate::token::Role;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AnswerRequest {
    pub body: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AnswerResponse {
    pub id: String,
    pub question_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at_unix: i64,
}

impl From<&AnswerRecord> for AnswerResponse {
    fn from(record: &AnswerRecord) -> Self {
        Self {
            id: record.id.to_string(),
            question_id: record.question_id.to_string(),
            author_id: record.author_id.to_string(),
            body: record.body.clone(),
            created_at_unix: record.created_at_unix,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/questions/{id}/answers",
    params(("id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "Answers, oldest first", body = Envelope),
        (status = 404, description = "No such question", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn list_answers(
    Path(id): Path<Uuid>,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    if state.questions().find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    let answers = state.answers().list_for_question(id).await?;
    let data: Vec<AnswerResponse> = answers.iter().map(AnswerResponse::from).collect();
    Ok((StatusCode::OK, Json(Envelope::ok("OK").with_data(data))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/questions/{id}/answers",
    params(("id" = String, Path, description = "Question id")),
    request_body = AnswerRequest,
    responses(
        (status = 201, description = "Answer posted", body = Envelope),
        (status = 400, description = "Empty body", body = Envelope),
        (status = 401, description = "Not authenticated", body = Envelope),
        (status = 403, description = "Account not verified", body = Envelope),
        (status = 404, description = "No such question", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn create_answer(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<AnswerRequest>>,
) -> Result<Response, ApiError> {
    let principal = require_verified(&headers, &state)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("body", "Missing payload"));
    };
    let body = request.body.trim().to_string();
    if body.is_empty() {
        return Err(ApiError::validation("body", "Answer body is required"));
    }

    if state.questions().find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let record = state
        .answers()
        .create(NewAnswer {
            question_id: id,
            author_id: principal.user_id,
            body,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Answer posted").with_data(AnswerResponse::from(&record))),
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/answers/{id}",
    params(("id" = String, Path, description = "Answer id")),
    responses(
        (status = 200, description = "Answer removed", body = Envelope),
        (status = 401, description = "Not authenticated", body = Envelope),
        (status = 404, description = "No such answer (or not the author)", body = Envelope)
    ),
    tag = "questions"
)]
pub async fn delete_answer(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let principal = require_verified(&headers, &state)?;

    let Some(record) = state.answers().find_by_id(id).await? else {
        return Err(ApiError::NotFound);
    };
    let moderator = matches!(principal.role, Role::Moderator | Role::Admin);
    if record.author_id != principal.user_id && !moderator {
        return Err(ApiError::NotFound);
    }

    state.answers().delete(id).await?;
    Ok((StatusCode::OK, Json(Envelope::ok("Answer deleted"))).into_response())
}
