use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::{GradedQuestion, PracticeExam, PracticeExamResult, Question};

const COLUMNS: &str =
    "id, exam_id, title, description, duration_minutes, is_active, created_at, updated_at";

const RESULT_COLUMNS: &str = "\
    id, user_id, practice_exam_id, exam_id, score, total_questions, percentage, answers, \
    review, duration_seconds, completed_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PracticeExamSummary {
    #[sqlx(flatten)]
    pub(crate) practice_exam: PracticeExam,
    pub(crate) question_count: i64,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<PracticeExam>, sqlx::Error> {
    sqlx::query_as::<_, PracticeExam>(&format!("SELECT {COLUMNS} FROM practice_exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: Option<&str>,
    only_active: bool,
) -> Result<Vec<PracticeExamSummary>, sqlx::Error> {
    sqlx::query_as::<_, PracticeExamSummary>(
        "SELECT pe.id, pe.exam_id, pe.title, pe.description, pe.duration_minutes, pe.is_active,
                pe.created_at, pe.updated_at,
                (SELECT COUNT(*) FROM practice_exam_questions pq
                 WHERE pq.practice_exam_id = pe.id) AS question_count
         FROM practice_exams pe
         WHERE ($1::text IS NULL OR pe.exam_id = $1) AND (pe.is_active OR NOT $2)
         ORDER BY pe.created_at DESC",
    )
    .bind(exam_id)
    .bind(only_active)
    .fetch_all(pool)
    .await
}

/// The fixed question set in delivery order.
pub(crate) async fn list_questions(
    pool: &PgPool,
    practice_exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT q.id, q.topic_id, q.question_type, q.text, q.options, q.correct_answer,
                q.explanation, q.difficulty, q.is_previous_exam, q.order_index,
                q.created_at, q.updated_at
         FROM practice_exam_questions pq
         JOIN questions q ON q.id = pq.question_id
         WHERE pq.practice_exam_id = $1
         ORDER BY pq.order_index",
    )
    .bind(practice_exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreatePracticeExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) duration_minutes: i32,
    pub(crate) is_active: bool,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    tx: &mut Transaction<'_, Postgres>,
    params: CreatePracticeExam<'_>,
) -> Result<PracticeExam, sqlx::Error> {
    sqlx::query_as::<_, PracticeExam>(&format!(
        "INSERT INTO practice_exams (
            id, exam_id, title, description, duration_minutes, is_active, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.is_active)
    .bind(params.now)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn insert_questions(
    tx: &mut Transaction<'_, Postgres>,
    practice_exam_id: &str,
    question_ids: &[String],
) -> Result<(), sqlx::Error> {
    for (order_index, question_id) in question_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO practice_exam_questions (practice_exam_id, question_id, order_index)
             VALUES ($1,$2,$3)",
        )
        .bind(practice_exam_id)
        .bind(question_id)
        .bind(order_index as i32)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[derive(Default)]
pub(crate) struct UpdatePracticeExam {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) is_active: Option<bool>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdatePracticeExam,
    now: PrimitiveDateTime,
) -> Result<Option<PracticeExamSummary>, sqlx::Error> {
    sqlx::query_as::<_, PracticeExamSummary>(&format!(
        "WITH updated AS (
            UPDATE practice_exams SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                duration_minutes = COALESCE($3, duration_minutes),
                is_active = COALESCE($4, is_active),
                updated_at = $5
             WHERE id = $6
             RETURNING {COLUMNS}
         )
         SELECT updated.*,
                (SELECT COUNT(*) FROM practice_exam_questions pq
                 WHERE pq.practice_exam_id = updated.id) AS question_count
         FROM updated",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.duration_minutes)
    .bind(params.is_active)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fails with a foreign-key violation once any attempt has been submitted.
pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM practice_exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) struct InsertPracticeResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) practice_exam_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) answers: HashMap<String, i32>,
    pub(crate) review: Vec<GradedQuestion>,
    pub(crate) duration_seconds: Option<i32>,
    pub(crate) completed_at: PrimitiveDateTime,
}

pub(crate) async fn insert_result(
    pool: &PgPool,
    params: InsertPracticeResult<'_>,
) -> Result<PracticeExamResult, sqlx::Error> {
    sqlx::query_as::<_, PracticeExamResult>(&format!(
        "INSERT INTO practice_exam_results (
            id, user_id, practice_exam_id, exam_id, score, total_questions, percentage,
            answers, review, duration_seconds, completed_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
         RETURNING {RESULT_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.practice_exam_id)
    .bind(params.exam_id)
    .bind(params.score)
    .bind(params.total_questions)
    .bind(params.percentage)
    .bind(Json(params.answers))
    .bind(Json(params.review))
    .bind(params.duration_seconds)
    .bind(params.completed_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PracticeResultRow {
    #[sqlx(flatten)]
    pub(crate) result: PracticeExamResult,
    pub(crate) practice_exam_title: String,
}

pub(crate) async fn list_results_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<PracticeResultRow>, sqlx::Error> {
    sqlx::query_as::<_, PracticeResultRow>(
        "SELECT r.id, r.user_id, r.practice_exam_id, r.exam_id, r.score, r.total_questions,
                r.percentage, r.answers, r.review, r.duration_seconds, r.completed_at,
                pe.title AS practice_exam_title
         FROM practice_exam_results r
         JOIN practice_exams pe ON pe.id = r.practice_exam_id
         WHERE r.user_id = $1
         ORDER BY r.completed_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_result(
    pool: &PgPool,
    id: &str,
) -> Result<Option<PracticeResultRow>, sqlx::Error> {
    sqlx::query_as::<_, PracticeResultRow>(
        "SELECT r.id, r.user_id, r.practice_exam_id, r.exam_id, r.score, r.total_questions,
                r.percentage, r.answers, r.review, r.duration_seconds, r.completed_at,
                pe.title AS practice_exam_title
         FROM practice_exam_results r
         JOIN practice_exams pe ON pe.id = r.practice_exam_id
         WHERE r.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
