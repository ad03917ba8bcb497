use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::guards::{
    require_active_package, require_exam_entitlement, CurrentAdmin, CurrentStaff, CurrentUser,
};
use crate::api::validation::{non_blank, validate_payload};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::{GradedQuestion, PracticeExam, User};
use crate::repositories;
use crate::repositories::practice_exams::PracticeExamSummary;
use crate::schemas::content::QuizQuestionResponse;
use crate::schemas::practice::{
    PracticeAnswerReview, PracticeExamCreate, PracticeExamListQuery, PracticeExamResponse,
    PracticeExamStart, PracticeExamUpdate, PracticeResultDetail, PracticeResultResponse,
    PracticeSubmit,
};
use crate::schemas::ApiResponse;
use crate::services::scoring::score_attempt;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_practice_exams))
        .route("/results", get(list_results))
        .route("/results/:result_id", get(get_result))
        .route("/:practice_exam_id/start", get(start_practice_exam))
        .route("/:practice_exam_id/submit", post(submit_practice_exam))
}

pub(crate) fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list).post(admin_create))
        .route("/:practice_exam_id", patch(admin_update).delete(admin_delete))
}

async fn list_practice_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PracticeExamResponse>>>, ApiError> {
    let package = require_active_package(&state, &user).await?;
    let exams =
        repositories::practice_exams::list_by_exam(state.db(), Some(&package.package.exam_id), true)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list practice exams"))?;

    Ok(Json(ApiResponse::ok(exams.into_iter().map(PracticeExamResponse::from_summary).collect())))
}

async fn start_practice_exam(
    Path(practice_exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PracticeExamStart>>, ApiError> {
    let practice_exam = fetch_entitled_practice_exam(&state, &user, &practice_exam_id).await?;
    let questions = repositories::practice_exams::list_questions(state.db(), &practice_exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load practice exam questions"))?;

    Ok(Json(ApiResponse::ok(PracticeExamStart {
        id: practice_exam.id,
        title: practice_exam.title,
        duration_minutes: practice_exam.duration_minutes,
        questions: questions.into_iter().map(QuizQuestionResponse::from_db).collect(),
    })))
}

async fn submit_practice_exam(
    Path(practice_exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PracticeSubmit>,
) -> Result<(StatusCode, Json<ApiResponse<PracticeResultResponse>>), ApiError> {
    validate_payload(&payload)?;
    let practice_exam = fetch_entitled_practice_exam(&state, &user, &practice_exam_id).await?;
    let questions = repositories::practice_exams::list_questions(state.db(), &practice_exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load practice exam questions"))?;

    let score = score_attempt(
        questions.iter().map(|question| (question.id.as_str(), question.correct_answer)),
        &payload.answers,
    );

    // Only answers to questions of this attempt are kept.
    let question_ids: HashSet<&str> = questions.iter().map(|question| question.id.as_str()).collect();
    let mut answers = payload.answers;
    answers.retain(|question_id, _| question_ids.contains(question_id.as_str()));

    let review = questions
        .into_iter()
        .map(|question| GradedQuestion {
            selected_answer: answers.get(&question.id).copied(),
            question_id: question.id,
            text: question.text,
            options: question.options.0,
            correct_answer: question.correct_answer,
            explanation: question.explanation,
        })
        .collect();

    let result = repositories::practice_exams::insert_result(
        state.db(),
        repositories::practice_exams::InsertPracticeResult {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            practice_exam_id: &practice_exam.id,
            exam_id: &practice_exam.exam_id,
            score: score.score,
            total_questions: score.total,
            percentage: score.percentage,
            answers,
            review,
            duration_seconds: payload.duration_seconds,
            completed_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save practice exam result"))?;
    metrics::record_practice_submission(score.percentage);

    let row = repositories::practice_exams::PracticeResultRow {
        result,
        practice_exam_title: practice_exam.title,
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(PracticeResultResponse::from_row(&row)))))
}

async fn list_results(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PracticeResultResponse>>>, ApiError> {
    let rows = repositories::practice_exams::list_results_by_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list practice exam results"))?;

    Ok(Json(ApiResponse::ok(rows.iter().map(PracticeResultResponse::from_row).collect())))
}

/// Per-question review of one attempt as it was graded; visible to its owner and to admins.
async fn get_result(
    Path(result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PracticeResultDetail>>, ApiError> {
    let row = repositories::practice_exams::find_result(state.db(), &result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch practice exam result"))?
        .ok_or_else(|| ApiError::NotFound("Result not found".to_string()))?;

    if row.result.user_id != user.id && !user.is_admin() {
        return Err(ApiError::Forbidden("This result belongs to another user"));
    }

    let answers =
        row.result.review.0.iter().cloned().map(PracticeAnswerReview::from_graded).collect();

    Ok(Json(ApiResponse::ok(PracticeResultDetail {
        summary: PracticeResultResponse::from_row(&row),
        answers,
    })))
}

/// Every practice exam, inactive ones included; instructors may review them too.
async fn admin_list(
    CurrentStaff(_staff): CurrentStaff,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PracticeExamListQuery>,
) -> Result<Json<ApiResponse<Vec<PracticeExamResponse>>>, ApiError> {
    let exams = repositories::practice_exams::list_by_exam(state.db(), query.exam_id.as_deref(), false)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list practice exams"))?;

    Ok(Json(ApiResponse::ok(exams.into_iter().map(PracticeExamResponse::from_summary).collect())))
}

async fn admin_create(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PracticeExamCreate>,
) -> Result<(StatusCode, Json<ApiResponse<PracticeExamResponse>>), ApiError> {
    validate_payload(&payload)?;

    let exam = repositories::exams::find_by_id(state.db(), &payload.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    let mut seen = HashSet::new();
    let question_ids: Vec<String> =
        payload.question_ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

    let owned = repositories::questions::filter_ids_in_exam(state.db(), &exam.id, &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check questions"))?;
    if owned.len() != question_ids.len() {
        return Err(ApiError::BadRequest(
            "Every question must belong to the practice exam's exam".to_string(),
        ));
    }

    let description = non_blank(payload.description);
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let practice_exam = repositories::practice_exams::create(
        &mut tx,
        repositories::practice_exams::CreatePracticeExam {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            title: payload.title.trim(),
            description: description.as_deref(),
            duration_minutes: payload.duration_minutes,
            is_active: payload.is_active,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create practice exam"))?;

    repositories::practice_exams::insert_questions(&mut tx, &practice_exam.id, &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to attach practice exam questions"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        admin_id = %admin.id,
        practice_exam_id = %practice_exam.id,
        action = "create_practice_exam",
        "Practice exam created"
    );
    let summary = PracticeExamSummary { practice_exam, question_count: question_ids.len() as i64 };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(PracticeExamResponse::from_summary(summary)))))
}

async fn admin_update(
    Path(practice_exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PracticeExamUpdate>,
) -> Result<Json<ApiResponse<PracticeExamResponse>>, ApiError> {
    validate_payload(&payload)?;

    let summary = repositories::practice_exams::update(
        state.db(),
        &practice_exam_id,
        repositories::practice_exams::UpdatePracticeExam {
            title: non_blank(payload.title),
            description: payload.description,
            duration_minutes: payload.duration_minutes,
            is_active: payload.is_active,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update practice exam"))?
    .ok_or_else(|| ApiError::NotFound("Practice exam not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        practice_exam_id = %practice_exam_id,
        action = "update_practice_exam",
        "Practice exam updated"
    );
    Ok(Json(ApiResponse::ok(PracticeExamResponse::from_summary(summary))))
}

async fn admin_delete(
    Path(practice_exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted =
        repositories::practice_exams::delete(state.db(), &practice_exam_id).await.map_err(|e| {
            if db::is_foreign_key_violation(&e) {
                ApiError::Conflict(
                    "Submitted results reference this practice exam; deactivate it instead"
                        .to_string(),
                )
            } else {
                ApiError::internal(e, "Failed to delete practice exam")
            }
        })?;
    if !deleted {
        return Err(ApiError::NotFound("Practice exam not found".to_string()));
    }

    tracing::info!(
        admin_id = %admin.id,
        practice_exam_id = %practice_exam_id,
        action = "delete_practice_exam",
        "Practice exam deleted"
    );
    Ok(Json(ApiResponse::empty("Practice exam deleted")))
}

/// Inactive practice exams are hidden from everyone but staff.
async fn fetch_entitled_practice_exam(
    state: &AppState,
    user: &User,
    practice_exam_id: &str,
) -> Result<PracticeExam, ApiError> {
    let practice_exam = repositories::practice_exams::find_by_id(state.db(), practice_exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch practice exam"))?
        .filter(|exam| exam.is_active || user.role.is_staff())
        .ok_or_else(|| ApiError::NotFound("Practice exam not found".to_string()))?;

    require_exam_entitlement(state, user, &practice_exam.exam_id).await?;
    Ok(practice_exam)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::db::types::{PackageStatus, UserRole};
    use crate::test_support::{self, bearer_token, json_request, read_json};

    #[tokio::test]
    async fn admin_routes_require_token() {
        let (app, _guard) = test_support::lazy_app().await;

        let response = app
            .oneshot(json_request(Method::GET, "/api/v1/admin/practice-exams", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn practice_exam_round_trip_scores_missing_answers_as_wrong() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let admin = test_support::insert_user(pool, "yonetici@example.com", UserRole::Admin).await;
        let student =
            test_support::insert_user(pool, "ogrenci@example.com", UserRole::Student).await;
        let other = test_support::insert_user(pool, "baska@example.com", UserRole::Student).await;
        let exam = test_support::insert_exam(pool, "adalet-gys", true).await;
        let topic = test_support::insert_topic(pool, &exam.id, "Anayasa").await;
        let mut question_ids = Vec::new();
        for _ in 0..3 {
            question_ids.push(test_support::insert_question(pool, &topic.id).await.id);
        }
        test_support::insert_package(pool, &student.id, &exam.id, PackageStatus::Active, None)
            .await;
        let admin_token = bearer_token(&admin.id, ctx.state.settings());
        let student_token = bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/admin/practice-exams",
                Some(&admin_token),
                Some(serde_json::json!({
                    "examId": exam.id,
                    "title": "Deneme Sınavı 1",
                    "durationMinutes": 30,
                    "questionIds": question_ids
                })),
            ))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["data"]["questionCount"], 3);
        let practice_exam_id = body["data"]["id"].as_str().expect("id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::GET,
                &format!("/api/v1/practice-exams/{practice_exam_id}/start"),
                Some(&student_token),
                None,
            ))
            .await
            .expect("start");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["durationMinutes"], 30);
        assert_eq!(body["data"]["questions"].as_array().expect("questions").len(), 3);

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/practice-exams/{practice_exam_id}/submit"),
                Some(&student_token),
                Some(serde_json::json!({
                    "answers": {question_ids[0].clone(): 1, question_ids[1].clone(): 0},
                    "durationSeconds": 420
                })),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["data"]["score"], 1);
        assert_eq!(body["data"]["totalQuestions"], 3);
        assert_eq!(body["data"]["percentage"], 33);
        let result_id = body["data"]["id"].as_str().expect("result id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::GET,
                &format!("/api/v1/practice-exams/results/{result_id}"),
                Some(&student_token),
                None,
            ))
            .await
            .expect("detail");
        let body = read_json(response).await;
        let answers = body["data"]["answers"].as_array().expect("answers");
        assert_eq!(answers.len(), 3);
        assert!(answers[2]["selectedAnswer"].is_null());
        assert_eq!(body["data"]["practiceExamTitle"], "Deneme Sınavı 1");

        let other_token = bearer_token(&other.id, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::GET,
                &format!("/api/v1/practice-exams/results/{result_id}"),
                Some(&other_token),
                None,
            ))
            .await
            .expect("foreign detail");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/practice-exams/{practice_exam_id}/submit"),
                Some(&other_token),
                Some(serde_json::json!({"answers": {}})),
            ))
            .await
            .expect("unentitled submit");
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn practice_exam_questions_must_belong_to_its_exam() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let admin = test_support::insert_user(pool, "yonetici@example.com", UserRole::Admin).await;
        let exam = test_support::insert_exam(pool, "adalet-gys", true).await;
        let other = test_support::insert_exam(pool, "meb", true).await;
        let topic = test_support::insert_topic(pool, &other.id, "Eğitim").await;
        let question = test_support::insert_question(pool, &topic.id).await;
        let admin_token = bearer_token(&admin.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/admin/practice-exams",
                Some(&admin_token),
                Some(serde_json::json!({
                    "examId": exam.id,
                    "title": "Deneme",
                    "durationMinutes": 30,
                    "questionIds": [question.id]
                })),
            ))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submitted_attempt_is_unaffected_by_later_question_edits() {
        let ctx = test_support::setup_test_context().await;
        let pool = ctx.state.db();
        let admin = test_support::insert_user(pool, "yonetici@example.com", UserRole::Admin).await;
        let student =
            test_support::insert_user(pool, "ogrenci@example.com", UserRole::Student).await;
        let exam = test_support::insert_exam(pool, "adalet-gys", true).await;
        let topic = test_support::insert_topic(pool, &exam.id, "Anayasa").await;
        let mut question_ids = Vec::new();
        for _ in 0..3 {
            question_ids.push(test_support::insert_question(pool, &topic.id).await.id);
        }
        test_support::insert_package(pool, &student.id, &exam.id, PackageStatus::Active, None)
            .await;
        let admin_token = bearer_token(&admin.id, ctx.state.settings());
        let student_token = bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/admin/practice-exams",
                Some(&admin_token),
                Some(serde_json::json!({
                    "examId": exam.id,
                    "title": "Deneme Sınavı 2",
                    "durationMinutes": 20,
                    "questionIds": question_ids
                })),
            ))
            .await
            .expect("create");
        let practice_exam_id =
            read_json(response).await["data"]["id"].as_str().expect("id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/practice-exams/{practice_exam_id}/submit"),
                Some(&student_token),
                Some(serde_json::json!({
                    "answers": {question_ids[0].clone(): 1, question_ids[1].clone(): 0}
                })),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::CREATED);
        let result_id =
            read_json(response).await["data"]["id"].as_str().expect("result id").to_string();

        sqlx::query("UPDATE questions SET correct_answer = 0 WHERE id = $1")
            .bind(&question_ids[1])
            .execute(pool)
            .await
            .expect("edit question");
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(&question_ids[2])
            .execute(pool)
            .await
            .expect("delete question");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::GET,
                &format!("/api/v1/practice-exams/results/{result_id}"),
                Some(&student_token),
                None,
            ))
            .await
            .expect("detail");
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["data"]["score"], 1);
        assert_eq!(body["data"]["totalQuestions"], 3);
        let answers = body["data"]["answers"].as_array().expect("answers");
        assert_eq!(answers.len(), 3);
        let correct = answers.iter().filter(|answer| answer["isCorrect"] == true).count();
        assert_eq!(correct, 1);
        assert_eq!(answers[1]["correctAnswer"], 1);
        assert_eq!(answers[2]["text"], "Soru metni");

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                &format!("/api/v1/admin/practice-exams/{practice_exam_id}"),
                Some(&admin_token),
                None,
            ))
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ctx
            .app
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                &format!("/api/v1/admin/practice-exams/{practice_exam_id}"),
                Some(&admin_token),
                Some(serde_json::json!({"isActive": false})),
            ))
            .await
            .expect("deactivate");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["data"]["isActive"], false);

        let stored: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM practice_exam_results WHERE id = $1")
                .bind(&result_id)
                .fetch_one(pool)
                .await
                .expect("count");
        assert_eq!(stored, 1);
    }
}
