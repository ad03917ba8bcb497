use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::guards::CurrentUser;
use crate::api::validation::{non_blank, validate_payload};
use crate::core::redis::auth_rate_key;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::schemas::user::UserResponse;
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    validate_payload(&payload)?;
    check_rate_limit(&state, "register", &payload.email).await?;

    let email = repositories::users::normalize_email(&payload.email);
    let exists = repositories::users::exists_by_email(state.db(), &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if exists {
        return Err(ApiError::Conflict("An account with this email already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let city = non_blank(payload.city);

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: &email,
            hashed_password,
            full_name: payload.full_name.trim(),
            role: UserRole::Student,
            is_active: true,
            city: city.as_deref(),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            ApiError::Conflict("An account with this email already exists".to_string())
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    tracing::info!(user_id = %user.id, "User registered");
    let response = issue_token(&state, user)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    check_rate_limit(&state, "login", &payload.email).await?;

    let user = repositories::users::find_by_email(state.db(), &payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized("Incorrect email or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect email or password"));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Inactive user"));
    }

    Ok(Json(ApiResponse::ok(issue_token(&state, user)?)))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(UserResponse::from_db(user)))
}

async fn check_rate_limit(state: &AppState, action: &str, email: &str) -> Result<(), ApiError> {
    let security = state.settings().security();
    let allowed = state
        .redis()
        .rate_limit(
            &auth_rate_key(action, email),
            security.auth_rate_limit,
            security.auth_rate_window_seconds,
        )
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Rate limiter unavailable; allowing request");
            true
        });

    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests("Too many attempts, try again later"))
    }
}

fn issue_token(state: &AppState, user: User) -> Result<TokenResponse, ApiError> {
    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::db::types::UserRole;
    use crate::test_support::{self, json_request, read_json, TEST_PASSWORD};

    #[tokio::test]
    async fn malformed_register_body_uses_error_envelope() {
        let (app, _guard) = test_support::lazy_app().await;

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/auth/register")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from("{\"email\": "))
                    .unwrap(),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_any_lookup() {
        let (app, _guard) = test_support::lazy_app().await;

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "email": "ayse@example.com",
                    "password": "kisa",
                    "fullName": "Ayşe Yılmaz"
                })),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_then_login_and_me() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "email": "Ayse@Example.com",
                    "password": TEST_PASSWORD,
                    "fullName": "Ayşe Yılmaz",
                    "city": "İzmir"
                })),
            ))
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["data"]["user"]["email"], "ayse@example.com");
        assert_eq!(body["data"]["user"]["role"], "STUDENT");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({"email": "ayse@example.com", "password": TEST_PASSWORD})),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::OK);
        let token = read_json(response).await["data"]["accessToken"]
            .as_str()
            .expect("token")
            .to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
            .await
            .expect("me");
        assert_eq!(read_json(response).await["data"]["city"], "İzmir");

        let duplicate = ctx
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "email": "ayse@example.com",
                    "password": TEST_PASSWORD,
                    "fullName": "Başka Biri"
                })),
            ))
            .await
            .expect("duplicate");
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn wrong_password_and_inactive_user_are_unauthorized() {
        let ctx = test_support::setup_test_context().await;
        let user =
            test_support::insert_user(ctx.state.db(), "ali@example.com", UserRole::Student).await;

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({"email": "ali@example.com", "password": "yanlis-sifre"})),
            ))
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(&user.id)
            .execute(ctx.state.db())
            .await
            .expect("deactivate");
        let token = test_support::bearer_token(&user.id, ctx.state.settings());
        let response = ctx
            .app
            .oneshot(json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
