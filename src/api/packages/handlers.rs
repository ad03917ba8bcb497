use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery, OptionalJson};
use crate::api::guards::{find_active_package, CurrentAdmin, CurrentUser};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::UserPackage;
use crate::db::types::PackageStatus;
use crate::repositories;
use crate::schemas::package::{
    PackageAssign, PackageDecision, PackageListQuery, PackageRequest, PackageResponse,
};
use crate::schemas::ApiResponse;
use crate::services::package_lifecycle::{self, PackageAction};

type PackageResult = Result<Json<ApiResponse<PackageResponse>>, ApiError>;

pub(super) async fn request_package(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PackageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PackageResponse>>), ApiError> {
    validate_payload(&payload)?;

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    if !exam.is_active {
        return Err(ApiError::Rejected("This exam is not open for purchase".to_string()));
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::packages::settle_expired(&mut tx, &user.id, &exam.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to settle expired package"))?;

    let open = repositories::packages::find_open_for_update(&mut tx, &user.id, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing packages"))?;
    if let Some(open) = open {
        return Err(ApiError::Conflict(match open.status {
            PackageStatus::Active => "You already have an active package for this exam",
            _ => "A package request for this exam is already awaiting approval",
        }
        .to_string()));
    }

    let payment_method = non_blank(payload.payment_method);
    let transaction_id = non_blank(payload.transaction_id);
    let payment_notes = non_blank(payload.payment_notes);
    let package_id = Uuid::new_v4().to_string();

    repositories::packages::insert_pending(
        &mut tx,
        repositories::packages::InsertPending {
            id: &package_id,
            user_id: &user.id,
            exam_id: &exam.id,
            payment_date: payload.payment_date,
            payment_amount: payload.payment_amount,
            payment_method: payment_method.as_deref(),
            transaction_id: transaction_id.as_deref(),
            payment_notes: payment_notes.as_deref(),
            now,
        },
    )
    .await
    .map_err(|e| open_package_error(e, "Failed to create package request"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::record_package_transition("request");
    tracing::info!(
        user_id = %user.id,
        package_id = %package_id,
        exam_id = %exam.id,
        action = "request",
        "Package requested"
    );

    let response = load_response(&state, &package_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(response, "Package request received; awaiting approval")),
    ))
}

pub(super) async fn my_packages(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PackageResponse>>>, ApiError> {
    let rows = repositories::packages::list_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list packages"))?;

    let now = primitive_now_utc();
    Ok(Json(ApiResponse::ok(
        rows.into_iter().map(|row| PackageResponse::from_row(row, now)).collect(),
    )))
}

pub(super) async fn my_active_package(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> PackageResult {
    let active = find_active_package(&state, &user, None).await?;

    Ok(Json(match active {
        Some(row) => ApiResponse::ok(PackageResponse::from_row(row, primitive_now_utc())),
        None => ApiResponse::empty("no active package"),
    }))
}

pub(super) async fn list_pending(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PackageResponse>>>, ApiError> {
    let rows = repositories::packages::list_pending(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list pending packages"))?;

    let now = primitive_now_utc();
    Ok(Json(ApiResponse::ok(
        rows.into_iter().map(|row| PackageResponse::from_row(row, now)).collect(),
    )))
}

pub(super) async fn list_all(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PackageListQuery>,
) -> Result<Json<ApiResponse<Vec<PackageResponse>>>, ApiError> {
    let rows = repositories::packages::list_all(
        state.db(),
        repositories::packages::ListPackagesParams {
            status: query.status,
            exam_id: query.exam_id,
            skip: query.skip,
            limit: query.limit,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list packages"))?;

    let now = primitive_now_utc();
    Ok(Json(ApiResponse::ok(
        rows.into_iter().map(|row| PackageResponse::from_row(row, now)).collect(),
    )))
}

pub(super) async fn approve_package(
    Path(package_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<PackageDecision>,
) -> PackageResult {
    let now = primitive_now_utc();
    package_lifecycle::validate_expiry(payload.expires_at, now)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let notes = non_blank(payload.notes);

    let updated = repositories::packages::approve(
        state.db(),
        &package_id,
        payload.expires_at,
        notes.as_deref(),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to approve package"))?;

    finish_transition(&state, &admin.id, &package_id, PackageAction::Approve, updated).await
}

pub(super) async fn reject_package(
    Path(package_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<PackageDecision>,
) -> PackageResult {
    close_package(&state, &admin.id, &package_id, PackageAction::Reject, payload).await
}

pub(super) async fn cancel_package(
    Path(package_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<PackageDecision>,
) -> PackageResult {
    close_package(&state, &admin.id, &package_id, PackageAction::Cancel, payload).await
}

pub(super) async fn assign_package(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PackageAssign>,
) -> Result<(StatusCode, Json<ApiResponse<PackageResponse>>), ApiError> {
    validate_payload(&payload)?;

    let now = primitive_now_utc();
    package_lifecycle::validate_expiry(payload.expires_at, now)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user = repositories::users::find_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("No user with this email".to_string()))?;

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    repositories::packages::settle_expired(&mut tx, &user.id, &exam.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to settle expired package"))?;

    let open = repositories::packages::find_open_for_update(&mut tx, &user.id, &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing packages"))?;
    if let Some(open) = open {
        return Err(ApiError::Conflict(match open.status {
            PackageStatus::Pending => {
                "User has a pending request for this exam; approve or reject it instead"
            }
            _ => "User already has an active package for this exam",
        }
        .to_string()));
    }

    let notes = non_blank(payload.notes);
    let package_id = Uuid::new_v4().to_string();
    repositories::packages::insert_assigned(
        &mut tx,
        repositories::packages::InsertAssigned {
            id: &package_id,
            user_id: &user.id,
            exam_id: &exam.id,
            expires_at: payload.expires_at,
            admin_notes: notes.as_deref(),
            now,
        },
    )
    .await
    .map_err(|e| open_package_error(e, "Failed to assign package"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::record_package_transition("assign");
    tracing::info!(
        admin_id = %admin.id,
        package_id = %package_id,
        user_id = %user.id,
        exam_id = %exam.id,
        action = "assign",
        "Package assigned"
    );

    let response = load_response(&state, &package_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(response, "Package assigned"))))
}

async fn close_package(
    state: &AppState,
    admin_id: &str,
    package_id: &str,
    action: PackageAction,
    payload: PackageDecision,
) -> PackageResult {
    let notes = non_blank(payload.notes);
    let updated = repositories::packages::cancel_from(
        state.db(),
        package_id,
        action.source_statuses(),
        notes.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update package"))?;

    finish_transition(state, admin_id, package_id, action, updated).await
}

/// Logs and answers a conditional transition, or explains why it matched no row.
async fn finish_transition(
    state: &AppState,
    admin_id: &str,
    package_id: &str,
    action: PackageAction,
    updated: Option<UserPackage>,
) -> PackageResult {
    let Some(package) = updated else {
        return Err(transition_failure(state, package_id, action).await);
    };

    metrics::record_package_transition(action.as_str());
    tracing::info!(
        admin_id = %admin_id,
        package_id = %package.id,
        user_id = %package.user_id,
        action = action.as_str(),
        status = package.status.as_str(),
        "Package transition applied"
    );

    let response = load_response(state, &package.id).await?;
    Ok(Json(ApiResponse::ok(response)))
}

async fn transition_failure(state: &AppState, package_id: &str, action: PackageAction) -> ApiError {
    let current = match repositories::packages::find_by_id(state.db(), package_id).await {
        Ok(current) => current,
        Err(err) => return ApiError::internal(err, "Failed to fetch package"),
    };

    let Some(current) = current else {
        return ApiError::NotFound("Package not found".to_string());
    };

    match package_lifecycle::check_transition(current.status, action) {
        Err(err) => ApiError::Conflict(err.to_string()),
        Ok(_) => ApiError::Conflict("Package was modified concurrently; retry".to_string()),
    }
}

async fn load_response(state: &AppState, package_id: &str) -> Result<PackageResponse, ApiError> {
    let row = repositories::packages::find_row_by_id(state.db(), package_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch package"))?
        .ok_or_else(|| ApiError::NotFound("Package not found".to_string()))?;

    Ok(PackageResponse::from_row(row, primitive_now_utc()))
}

fn open_package_error(err: sqlx::Error, context: &str) -> ApiError {
    if db::is_unique_violation(&err) {
        ApiError::Conflict("An open package already exists for this exam".to_string())
    } else {
        ApiError::internal(err, context)
    }
}
