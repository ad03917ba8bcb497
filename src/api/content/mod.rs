mod exams;
mod questions;
mod topics;

use axum::{routing::delete, routing::get, routing::patch, Router};

use crate::core::state::AppState;

pub(crate) fn exams_router() -> Router<AppState> {
    Router::new()
        .route("/", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/:exam_id",
            get(exams::get_exam).patch(exams::update_exam).delete(exams::delete_exam),
        )
        .route("/:exam_id/topics", get(exams::list_topics).post(exams::create_topic))
}

pub(crate) fn topics_router() -> Router<AppState> {
    Router::new()
        .route("/:topic_id", patch(topics::update_topic).delete(topics::delete_topic))
        .route(
            "/:topic_id/questions",
            get(topics::list_questions).post(questions::create_question),
        )
        .route(
            "/:topic_id/materials",
            get(topics::list_materials).post(topics::create_material),
        )
}

pub(crate) fn questions_router() -> Router<AppState> {
    Router::new()
        .route("/:question_id", patch(questions::update_question).delete(questions::delete_question))
}

pub(crate) fn materials_router() -> Router<AppState> {
    Router::new().route("/:material_id", delete(topics::delete_material))
}
