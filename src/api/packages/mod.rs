mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(handlers::request_package))
        .route("/my-packages", get(handlers::my_packages))
        .route("/my-active-package", get(handlers::my_active_package))
        .route("/pending", get(handlers::list_pending))
        .route("/all", get(handlers::list_all))
        .route("/assign", post(handlers::assign_package))
        .route("/:package_id/approve", post(handlers::approve_package))
        .route("/:package_id/reject", post(handlers::reject_package))
        .route("/:package_id/cancel", post(handlers::cancel_package))
}
