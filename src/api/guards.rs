use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::time::primitive_now_utc;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::repositories;
use crate::repositories::packages::PackageRow;
use crate::services::package_lifecycle;

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);
/// Admins and instructors.
pub(crate) struct CurrentStaff(pub(crate) User);
/// Authenticated caller if credentials were sent; anonymous otherwise. Bad credentials are
/// still rejected.
pub(crate) struct MaybeUser(pub(crate) Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token.trim(), app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Inactive user"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role.is_staff() {
            Ok(CurrentStaff(user))
        } else {
            Err(ApiError::Forbidden("Staff access required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeUser(None));
        }

        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(MaybeUser(Some(user)))
    }
}

impl MaybeUser {
    pub(crate) fn is_staff(&self) -> bool {
        self.0.as_ref().is_some_and(|user| user.role.is_staff())
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(User::is_admin)
    }
}

/// The caller's package currently in force, optionally restricted to one exam.
pub(crate) async fn find_active_package(
    state: &AppState,
    user: &User,
    exam_id: Option<&str>,
) -> Result<Option<PackageRow>, ApiError> {
    let candidates = repositories::packages::list_stored_active(state.db(), &user.id, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load packages"))?;

    let current = package_lifecycle::current_entitlement(&candidates, primitive_now_utc())
        .map(|row| row.package.id.clone());

    Ok(current.and_then(|id| candidates.into_iter().find(|row| row.package.id == id)))
}

/// Like [`find_active_package`] but fails with `PackageRequired` when nothing is in force.
pub(crate) async fn require_active_package(
    state: &AppState,
    user: &User,
) -> Result<PackageRow, ApiError> {
    find_active_package(state, user, None).await?.ok_or_else(ApiError::package_required)
}

/// Content of `exam_id` is readable by staff or by holders of a package in force for it.
pub(crate) async fn require_exam_entitlement(
    state: &AppState,
    user: &User,
    exam_id: &str,
) -> Result<(), ApiError> {
    if user.role.is_staff() {
        return Ok(());
    }

    match find_active_package(state, user, Some(exam_id)).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::package_required()),
    }
}
