use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::guards::{CurrentAdmin, MaybeUser};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::Exam;
use crate::repositories;
use crate::schemas::content::{
    ExamCreate, ExamListQuery, ExamResponse, ExamUpdate, TopicCreate, TopicResponse,
};
use crate::schemas::ApiResponse;

pub(super) async fn list_exams(
    caller: MaybeUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ExamListQuery>,
) -> Result<Json<ApiResponse<Vec<ExamResponse>>>, ApiError> {
    let include_inactive = query.include_inactive && caller.is_admin();
    let exams = repositories::exams::list(state.db(), include_inactive)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(ApiResponse::ok(exams.into_iter().map(ExamResponse::from_db).collect())))
}

pub(super) async fn get_exam(
    Path(exam_id): Path<String>,
    caller: MaybeUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExamResponse>>, ApiError> {
    let exam = fetch_visible_exam(&state, &caller, &exam_id).await?;
    Ok(Json(ApiResponse::ok(ExamResponse::from_db(exam))))
}

pub(super) async fn list_topics(
    Path(exam_id): Path<String>,
    caller: MaybeUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TopicResponse>>>, ApiError> {
    let exam = fetch_visible_exam(&state, &caller, &exam_id).await?;
    let topics = repositories::topics::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list topics"))?;

    Ok(Json(ApiResponse::ok(topics.into_iter().map(TopicResponse::from_db).collect())))
}

pub(super) async fn create_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExamCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ExamResponse>>), ApiError> {
    validate_payload(&payload)?;

    let description = non_blank(payload.description);
    let badge = non_blank(payload.badge);
    let code = payload.code.trim().to_ascii_lowercase();
    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            code: &code,
            description: description.as_deref(),
            price: payload.price,
            is_active: payload.is_active,
            features: payload.features,
            badge: badge.as_deref(),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| duplicate_code_error(e, "Failed to create exam"))?;

    tracing::info!(admin_id = %admin.id, exam_id = %exam.id, action = "create_exam", "Exam created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(ExamResponse::from_db(exam)))))
}

pub(super) async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ExamUpdate>,
) -> Result<Json<ApiResponse<ExamResponse>>, ApiError> {
    validate_payload(&payload)?;

    let exam = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            name: non_blank(payload.name),
            code: non_blank(payload.code).map(|code| code.to_ascii_lowercase()),
            description: payload.description,
            price: payload.price,
            is_active: payload.is_active,
            features: payload.features,
            badge: payload.badge,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| duplicate_code_error(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    tracing::info!(admin_id = %admin.id, exam_id = %exam.id, action = "update_exam", "Exam updated");
    Ok(Json(ApiResponse::ok(ExamResponse::from_db(exam))))
}

pub(super) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repositories::exams::delete(state.db(), &exam_id).await.map_err(|e| {
        if db::is_foreign_key_violation(&e) {
            ApiError::Conflict(
                "Packages or practice results still reference this exam; deactivate it instead"
                    .to_string(),
            )
        } else {
            ApiError::internal(e, "Failed to delete exam")
        }
    })?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, exam_id = %exam_id, action = "delete_exam", "Exam deleted");
    Ok(Json(ApiResponse::empty("Exam deleted")))
}

pub(super) async fn create_topic(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TopicCreate>,
) -> Result<(StatusCode, Json<ApiResponse<TopicResponse>>), ApiError> {
    validate_payload(&payload)?;

    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let description = non_blank(payload.description);
    let topic = repositories::topics::create(
        state.db(),
        repositories::topics::CreateTopic {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            name: payload.name.trim(),
            description: description.as_deref(),
            order_index: payload.order_index,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create topic"))?;

    tracing::info!(admin_id = %admin.id, topic_id = %topic.id, action = "create_topic", "Topic created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(TopicResponse::from_db(topic)))))
}

/// Inactive exams are only visible to staff.
async fn fetch_visible_exam(
    state: &AppState,
    caller: &MaybeUser,
    exam_id: &str,
) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    match exam {
        Some(exam) if exam.is_active || caller.is_staff() => Ok(exam),
        _ => Err(ApiError::NotFound("Exam not found".to_string())),
    }
}

fn duplicate_code_error(err: sqlx::Error, context: &str) -> ApiError {
    if db::is_unique_violation(&err) {
        ApiError::Conflict("An exam with this code already exists".to_string())
    } else {
        ApiError::internal(err, context)
    }
}
