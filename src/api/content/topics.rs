use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::guards::{require_exam_entitlement, CurrentAdmin, CurrentUser};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Topic, User};
use crate::repositories;
use crate::schemas::content::{
    MaterialCreate, MaterialQuery, MaterialResponse, QuestionResponse, TopicResponse, TopicUpdate,
};
use crate::schemas::ApiResponse;

pub(super) async fn update_topic(
    Path(topic_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TopicUpdate>,
) -> Result<Json<ApiResponse<TopicResponse>>, ApiError> {
    validate_payload(&payload)?;

    let topic = repositories::topics::update(
        state.db(),
        &topic_id,
        non_blank(payload.name),
        payload.description,
        payload.order_index,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update topic"))?
    .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;

    tracing::info!(admin_id = %admin.id, topic_id = %topic.id, action = "update_topic", "Topic updated");
    Ok(Json(ApiResponse::ok(TopicResponse::from_db(topic))))
}

pub(super) async fn delete_topic(
    Path(topic_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repositories::topics::delete(state.db(), &topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete topic"))?;
    if !deleted {
        return Err(ApiError::NotFound("Topic not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, topic_id = %topic_id, action = "delete_topic", "Topic deleted");
    Ok(Json(ApiResponse::empty("Topic deleted")))
}

/// Study mode: every question of the topic with answers and explanations.
pub(super) async fn list_questions(
    Path(topic_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<QuestionResponse>>>, ApiError> {
    let topic = fetch_entitled_topic(&state, &user, &topic_id).await?;
    let questions = repositories::questions::list_by_topic(state.db(), &topic.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(ApiResponse::ok(questions.into_iter().map(QuestionResponse::from_db).collect())))
}

pub(super) async fn list_materials(
    Path(topic_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MaterialQuery>,
) -> Result<Json<ApiResponse<Vec<MaterialResponse>>>, ApiError> {
    let topic = fetch_entitled_topic(&state, &user, &topic_id).await?;
    let materials = repositories::materials::list_by_topic(state.db(), &topic.id, query.kind)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list materials"))?;

    Ok(Json(ApiResponse::ok(materials.into_iter().map(MaterialResponse::from_db).collect())))
}

pub(super) async fn create_material(
    Path(topic_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MaterialCreate>,
) -> Result<(StatusCode, Json<ApiResponse<MaterialResponse>>), ApiError> {
    validate_payload(&payload)?;
    let topic = fetch_topic(&state, &topic_id).await?;

    let material = repositories::materials::create(
        state.db(),
        repositories::materials::CreateMaterial {
            id: &Uuid::new_v4().to_string(),
            topic_id: &topic.id,
            kind: payload.kind,
            title: payload.title.trim(),
            content: &payload.content,
            order_index: payload.order_index,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create material"))?;

    tracing::info!(
        admin_id = %admin.id,
        material_id = %material.id,
        action = "create_material",
        "Material created"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(MaterialResponse::from_db(material)))))
}

pub(super) async fn delete_material(
    Path(material_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = repositories::materials::delete(state.db(), &material_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete material"))?;
    if !deleted {
        return Err(ApiError::NotFound("Material not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.id,
        material_id = %material_id,
        action = "delete_material",
        "Material deleted"
    );
    Ok(Json(ApiResponse::empty("Material deleted")))
}

pub(super) async fn fetch_topic(state: &AppState, topic_id: &str) -> Result<Topic, ApiError> {
    repositories::topics::find_by_id(state.db(), topic_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch topic"))?
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))
}

async fn fetch_entitled_topic(
    state: &AppState,
    user: &User,
    topic_id: &str,
) -> Result<Topic, ApiError> {
    let topic = fetch_topic(state, topic_id).await?;
    require_exam_entitlement(state, user, &topic.exam_id).await?;
    Ok(topic)
}
