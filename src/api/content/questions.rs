use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::topics::fetch_topic;
use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::questions::QuestionFields;
use crate::schemas::content::{QuestionCreate, QuestionResponse, QuestionUpdate};
use crate::schemas::ApiResponse;
use crate::services::question_rules::validate_question_shape;

pub(super) async fn create_question(
    Path(topic_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuestionCreate>,
) -> Result<(StatusCode, Json<ApiResponse<QuestionResponse>>), ApiError> {
    validate_payload(&payload)?;
    validate_question_shape(payload.question_type, &payload.options, payload.correct_answer)
        .map_err(ApiError::BadRequest)?;

    let topic = fetch_topic(&state, &topic_id).await?;
    let explanation = non_blank(payload.explanation);
    let question = repositories::questions::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        &topic.id,
        QuestionFields {
            question_type: payload.question_type,
            text: payload.text.trim(),
            options: &payload.options,
            correct_answer: payload.correct_answer,
            explanation: explanation.as_deref(),
            difficulty: payload.difficulty,
            is_previous_exam: payload.is_previous_exam,
            order_index: payload.order_index,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(
        admin_id = %admin.id,
        question_id = %question.id,
        action = "create_question",
        "Question created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(QuestionResponse::from_db(question)))))
}

/// Merges the patch onto the stored question and re-checks the shape of the result, so a
/// patch that only shrinks `options` cannot leave `correctAnswer` pointing past the end.
pub(super) async fn update_question(
    Path(question_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuestionUpdate>,
) -> Result<Json<ApiResponse<QuestionResponse>>, ApiError> {
    validate_payload(&payload)?;

    let current = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let question_type = payload.question_type.unwrap_or(current.question_type);
    let options = payload.options.unwrap_or(current.options.0);
    let correct_answer = payload.correct_answer.unwrap_or(current.correct_answer);
    validate_question_shape(question_type, &options, correct_answer)
        .map_err(ApiError::BadRequest)?;

    let text = non_blank(payload.text).unwrap_or(current.text);
    let explanation = match payload.explanation {
        Some(value) => non_blank(Some(value)),
        None => current.explanation,
    };

    let question = repositories::questions::replace(
        state.db(),
        &question_id,
        QuestionFields {
            question_type,
            text: &text,
            options: &options,
            correct_answer,
            explanation: explanation.as_deref(),
            difficulty: payload.difficulty.unwrap_or(current.difficulty),
            is_previous_exam: payload.is_previous_exam.unwrap_or(current.is_previous_exam),
            order_index: payload.order_index.unwrap_or(current.order_index),
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        question_id = %question.id,
        action = "update_question",
        "Question updated"
    );
    Ok(Json(ApiResponse::ok(QuestionResponse::from_db(question))))
}

pub(super) async fn delete_question(
    Path(question_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repositories::questions::delete(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.id,
        question_id = %question_id,
        action = "delete_question",
        "Question deleted"
    );
    Ok(Json(ApiResponse::empty("Question deleted")))
}
