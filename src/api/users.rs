use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::user::{
    AdminUserUpdate, PasswordChange, ProfileUpdate, UserListQuery, UserResponse,
};
use crate::schemas::ApiResponse;

type UserResult = Result<Json<ApiResponse<UserResponse>>, ApiError>;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", patch(update_me))
        .route("/me/password", post(change_password))
        .route("/:user_id", get(get_user).patch(update_user).delete(delete_user))
}

async fn update_me(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> UserResult {
    validate_payload(&payload)?;

    let updated = repositories::users::update(
        state.db(),
        &user.id,
        repositories::users::UpdateUser {
            full_name: non_blank(payload.full_name),
            city: non_blank(payload.city),
            ..Default::default()
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update profile"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(UserResponse::from_db(updated))))
}

async fn change_password(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PasswordChange>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validate_payload(&payload)?;

    let verified = security::verify_password(&payload.current_password, &user.hashed_password)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    let hashed_password = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    repositories::users::update(
        state.db(),
        &user.id,
        repositories::users::UpdateUser {
            hashed_password: Some(hashed_password),
            ..Default::default()
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(ApiResponse::empty("Password updated")))
}

async fn list_users(
    ApiQuery(params): ApiQuery<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = repositories::users::list(
        state.db(),
        repositories::users::ListUsersParams {
            email: params.email,
            role: params.role,
            is_active: params.is_active,
            skip: params.skip,
            limit: params.limit,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(ApiResponse::ok(users.into_iter().map(UserResponse::from_db).collect())))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> UserResult {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(UserResponse::from_db(user))))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AdminUserUpdate>,
) -> UserResult {
    validate_payload(&payload)?;

    let demotes_self = payload.role.is_some_and(|role| role != admin.role);
    if admin.id == user_id && (payload.is_active == Some(false) || demotes_self) {
        return Err(ApiError::Conflict(
            "Admins cannot deactivate or demote themselves".to_string(),
        ));
    }

    let updated = repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            full_name: non_blank(payload.full_name),
            role: payload.role,
            is_active: payload.is_active,
            city: non_blank(payload.city),
            hashed_password: None,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %updated.id,
        role = ?updated.role,
        is_active = updated.is_active,
        action = "update_user",
        "User updated"
    );

    Ok(Json(ApiResponse::ok(UserResponse::from_db(updated))))
}

async fn delete_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if admin.id == user_id {
        return Err(ApiError::Conflict("Admins cannot delete themselves".to_string()));
    }

    let deleted = repositories::users::delete(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, user_id = %user_id, action = "delete_user", "User deleted");
    Ok(Json(ApiResponse::empty("User deleted")))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::db::types::{PackageStatus, UserRole};
    use crate::test_support::{self, bearer_token, json_request, read_json, TEST_PASSWORD};

    #[tokio::test]
    async fn profile_and_password_updates() {
        let ctx = test_support::setup_test_context().await;
        let user =
            test_support::insert_user(ctx.state.db(), "ayse@example.com", UserRole::Student).await;
        let token = bearer_token(&user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                "/api/v1/users/me",
                Some(&token),
                Some(serde_json::json!({"fullName": "Ayşe Kaya", "city": "Bursa"})),
            ))
            .await
            .expect("update");
        let body = read_json(response).await;
        assert_eq!(body["data"]["fullName"], "Ayşe Kaya");
        assert_eq!(body["data"]["city"], "Bursa");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/users/me/password",
                Some(&token),
                Some(serde_json::json!({
                    "currentPassword": "yanlis",
                    "newPassword": "yeni-sifre-123"
                })),
            ))
            .await
            .expect("wrong current");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ctx
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/users/me/password",
                Some(&token),
                Some(serde_json::json!({
                    "currentPassword": TEST_PASSWORD,
                    "newPassword": "yeni-sifre-123"
                })),
            ))
            .await
            .expect("change");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_delete_cascades_and_protects_self() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let admin = test_support::insert_user(pool, "yonetici@example.com", UserRole::Admin).await;
        let student = test_support::insert_user(pool, "ogrenci@example.com", UserRole::Student).await;
        let exam = test_support::insert_exam(pool, "adalet-gys", true).await;
        test_support::insert_package(pool, &student.id, &exam.id, PackageStatus::Active, None).await;
        let token = bearer_token(&admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                &format!("/api/v1/users/{}", admin.id),
                Some(&token),
                None,
            ))
            .await
            .expect("self delete");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ctx
            .app
            .oneshot(json_request(
                Method::DELETE,
                &format!("/api/v1/users/{}", student.id),
                Some(&token),
                None,
            ))
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::OK);

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_packages")
            .fetch_one(pool)
            .await
            .expect("count");
        assert_eq!(remaining, 0);
    }
}
