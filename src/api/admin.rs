use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::PackageStatus;
use crate::repositories;
use crate::schemas::admin::AdminStats;
use crate::schemas::ApiResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/stats", get(dashboard_stats))
}

/// Each figure is loaded on its own; one failing query leaves that figure `null`.
async fn dashboard_stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AdminStats>>, ApiError> {
    let db = state.db();
    let (users, exams, pending, active, answers) = tokio::join!(
        repositories::stats::count_users(db),
        repositories::stats::count_exams(db),
        repositories::packages::count_by_status(db, PackageStatus::Pending),
        repositories::packages::count_in_force(db, primitive_now_utc()),
        repositories::exam_results::count_all(db),
    );

    Ok(Json(ApiResponse::ok(AdminStats {
        total_users: figure(users, "total_users"),
        total_exams: figure(exams, "total_exams"),
        pending_packages: figure(pending, "pending_packages"),
        active_packages: figure(active, "active_packages"),
        total_answers: figure(answers, "total_answers"),
    })))
}

fn figure(result: Result<i64, sqlx::Error>, name: &'static str) -> Option<i64> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, figure = name, "Failed to load dashboard figure");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use time::Duration;
    use tower::ServiceExt;

    use super::figure;
    use crate::core::time::primitive_now_utc;
    use crate::db::types::{PackageStatus, UserRole};
    use crate::test_support::{self, bearer_token, json_request, read_json};

    #[test]
    fn failed_figure_is_null() {
        assert_eq!(figure(Ok(4), "total_users"), Some(4));
        assert_eq!(figure(Err(sqlx::Error::RowNotFound), "total_users"), None);
    }

    #[tokio::test]
    async fn stats_count_packages_in_force_at_read_time() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let admin = test_support::insert_user(pool, "yonetici@example.com", UserRole::Admin).await;
        let student =
            test_support::insert_user(pool, "ogrenci@example.com", UserRole::Student).await;
        let adalet = test_support::insert_exam(pool, "adalet-gys", true).await;
        let meb = test_support::insert_exam(pool, "meb", true).await;
        let icisleri = test_support::insert_exam(pool, "icisleri-gys", true).await;
        test_support::insert_package(
            pool,
            &student.id,
            &adalet.id,
            PackageStatus::Active,
            Some(primitive_now_utc() - Duration::days(1)),
        )
        .await;
        test_support::insert_package(pool, &student.id, &meb.id, PackageStatus::Active, None).await;
        test_support::insert_package(pool, &student.id, &icisleri.id, PackageStatus::Pending, None)
            .await;
        let token = bearer_token(&admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/admin/stats", Some(&token), None))
            .await
            .expect("stats");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["totalUsers"], 2);
        assert_eq!(body["data"]["totalExams"], 3);
        assert_eq!(body["data"]["pendingPackages"], 1);
        assert_eq!(body["data"]["activePackages"], 1);
        assert_eq!(body["data"]["totalAnswers"], 0);

        let student_token = bearer_token(&student.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(Method::GET, "/api/v1/admin/stats", Some(&student_token), None))
            .await
            .expect("student stats");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
