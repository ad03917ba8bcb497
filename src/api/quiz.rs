use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::guards::{require_active_package, require_exam_entitlement, CurrentUser};
use crate::api::pagination::clamp_limit;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::exam_results::RankingRow;
use crate::schemas::content::QuizQuestionResponse;
use crate::schemas::quiz::{
    AnswerRequest, AnswerResponse, QuizPage, QuizQuery, RankingEntry, RankingQuery,
    RankingResponse, StatsQuery, StatsResponse, TopicStats,
};
use crate::schemas::ApiResponse;
use crate::services::question_rules::answer_in_bounds;
use crate::services::scoring::percentage;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/questions", get(mixed_questions))
        .route("/answer", post(submit_answer))
        .route("/stats", get(stats))
}

pub(crate) fn rankings_router() -> Router<AppState> {
    Router::new().route("/", get(rankings))
}

/// Mixed quiz over the active package's exam, skipping every question the caller has
/// already answered.
async fn mixed_questions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QuizQuery>,
) -> Result<Json<ApiResponse<QuizPage>>, ApiError> {
    let package = require_active_package(&state, &user).await?;
    let exam_id = &package.package.exam_id;

    let topic_ids = if query.topic_ids.is_empty() {
        repositories::topics::list_ids_by_exam(state.db(), exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list topics"))?
    } else {
        let mut requested = query.topic_ids;
        requested.sort();
        requested.dedup();
        let owned = repositories::topics::count_in_exam(state.db(), exam_id, &requested)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check topics"))?;
        if owned != requested.len() as i64 {
            return Err(ApiError::Forbidden("Topics outside your package were requested"));
        }
        requested
    };

    if query.offset < 0 {
        return Err(ApiError::BadRequest("offset must be non-negative".to_string()));
    }
    let quiz = state.settings().quiz();
    let limit = clamp_limit(query.limit, quiz.default_page_size, quiz.max_page_size);

    let mut questions = repositories::questions::list_unanswered_page(
        state.db(),
        &user.id,
        &topic_ids,
        limit,
        query.offset,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to load quiz questions"))?;

    let has_more = questions.len() as i64 > limit;
    questions.truncate(limit as usize);

    Ok(Json(ApiResponse::ok(QuizPage {
        questions: questions.into_iter().map(QuizQuestionResponse::from_db).collect(),
        has_more,
    })))
}

async fn submit_answer(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AnswerRequest>,
) -> Result<Json<ApiResponse<AnswerResponse>>, ApiError> {
    let scoped = repositories::questions::find_scoped(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    require_exam_entitlement(&state, &user, &scoped.exam_id).await?;

    let question = scoped.question;
    if !answer_in_bounds(&question.options.0, payload.selected_answer) {
        return Err(ApiError::BadRequest(format!(
            "selectedAnswer must be between 0 and {}",
            question.options.len().saturating_sub(1)
        )));
    }

    let is_correct = payload.selected_answer == question.correct_answer;
    repositories::exam_results::insert(
        state.db(),
        repositories::exam_results::InsertResult {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            question_id: &question.id,
            selected_answer: payload.selected_answer,
            is_correct,
            topic_id: &question.topic_id,
            exam_id: &scoped.exam_id,
            answered_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record answer"))?;
    metrics::record_answer(is_correct);

    Ok(Json(ApiResponse::ok(AnswerResponse {
        is_correct,
        correct_answer: question.correct_answer,
        explanation: question.explanation,
    })))
}

async fn stats(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    let totals = repositories::exam_results::totals_for_user(state.db(), &user.id, query.since)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load statistics"))?;
    let topics = repositories::exam_results::totals_by_topic(state.db(), &user.id, query.since)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load topic statistics"))?;

    Ok(Json(ApiResponse::ok(StatsResponse {
        total: totals.total,
        correct: totals.correct,
        wrong: totals.total - totals.correct,
        success_rate: percentage(totals.correct, totals.total),
        topics: topics
            .into_iter()
            .map(|topic| TopicStats {
                success_rate: percentage(topic.correct, topic.total),
                topic_id: topic.topic_id,
                topic_name: topic.topic_name,
                total: topic.total,
                correct: topic.correct,
            })
            .collect(),
    })))
}

async fn rankings(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RankingQuery>,
) -> Result<Json<ApiResponse<RankingResponse>>, ApiError> {
    let package = require_active_package(&state, &user).await?;
    let exam_id = package.package.exam_id;
    let max = state.settings().quiz().ranking_limit;
    let limit = clamp_limit(query.limit, max, max);

    let rows = repositories::exam_results::ranking(state.db(), &exam_id, limit, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load ranking"))?;

    let me = rows.iter().find(|row| row.user_id == user.id).map(ranking_entry);
    let entries = rows.iter().filter(|row| row.rank <= limit).map(ranking_entry).collect();

    Ok(Json(ApiResponse::ok(RankingResponse { exam_id, entries, me })))
}

fn ranking_entry(row: &RankingRow) -> RankingEntry {
    RankingEntry {
        rank: row.rank,
        user_id: row.user_id.clone(),
        full_name: row.full_name.clone(),
        city: row.city.clone(),
        correct: row.correct,
        total: row.total,
    }
}
