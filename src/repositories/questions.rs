use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::{DifficultyLevel, QuestionType};

pub(crate) const COLUMNS: &str = "\
    id, topic_id, question_type, text, options, correct_answer, explanation, \
    difficulty, is_previous_exam, order_index, created_at, updated_at";

/// A question together with the exam it belongs to, resolved through its topic.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ScopedQuestion {
    #[sqlx(flatten)]
    pub(crate) question: Question,
    pub(crate) exam_id: String,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_scoped(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ScopedQuestion>, sqlx::Error> {
    sqlx::query_as::<_, ScopedQuestion>(
        "SELECT q.id, q.topic_id, q.question_type, q.text, q.options, q.correct_answer,
                q.explanation, q.difficulty, q.is_previous_exam, q.order_index,
                q.created_at, q.updated_at, t.exam_id
         FROM questions q
         JOIN topics t ON t.id = q.topic_id
         WHERE q.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_topic(pool: &PgPool, topic_id: &str) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE topic_id = $1 ORDER BY order_index ASC, created_at ASC",
    ))
    .bind(topic_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct QuestionFields<'a> {
    pub(crate) question_type: QuestionType,
    pub(crate) text: &'a str,
    pub(crate) options: &'a [String],
    pub(crate) correct_answer: i32,
    pub(crate) explanation: Option<&'a str>,
    pub(crate) difficulty: DifficultyLevel,
    pub(crate) is_previous_exam: bool,
    pub(crate) order_index: i32,
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    topic_id: &str,
    fields: QuestionFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, topic_id, question_type, text, options, correct_answer, explanation,
            difficulty, is_previous_exam, order_index, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(topic_id)
    .bind(fields.question_type)
    .bind(fields.text)
    .bind(Json(fields.options))
    .bind(fields.correct_answer)
    .bind(fields.explanation)
    .bind(fields.difficulty)
    .bind(fields.is_previous_exam)
    .bind(fields.order_index)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Overwrites every editable field; callers merge the patch first so the shape checks run on
/// the final value.
pub(crate) async fn replace(
    pool: &PgPool,
    id: &str,
    fields: QuestionFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_type = $1,
            text = $2,
            options = $3,
            correct_answer = $4,
            explanation = $5,
            difficulty = $6,
            is_previous_exam = $7,
            order_index = $8,
            updated_at = $9
         WHERE id = $10
         RETURNING {COLUMNS}",
    ))
    .bind(fields.question_type)
    .bind(fields.text)
    .bind(Json(fields.options))
    .bind(fields.correct_answer)
    .bind(fields.explanation)
    .bind(fields.difficulty)
    .bind(fields.is_previous_exam)
    .bind(fields.order_index)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// One page of the mixed quiz: questions from `topic_ids` the user has never answered.
/// Fetches `limit + 1` rows so the caller can tell whether another page exists.
pub(crate) async fn list_unanswered_page(
    pool: &PgPool,
    user_id: &str,
    topic_ids: &[String],
    limit: i64,
    offset: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM questions q WHERE q.topic_id = ANY(",
    ));
    builder.push_bind(topic_ids);
    builder.push(
        ") AND NOT EXISTS (
            SELECT 1 FROM exam_results r WHERE r.question_id = q.id AND r.user_id = ",
    );
    builder.push_bind(user_id);
    builder.push(") ORDER BY q.topic_id, q.order_index, q.id OFFSET ");
    builder.push_bind(offset.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit + 1);

    builder.build_query_as::<Question>().fetch_all(pool).await
}

/// Question ids from `question_ids` that belong to `exam_id`.
pub(crate) async fn filter_ids_in_exam(
    pool: &PgPool,
    exam_id: &str,
    question_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT q.id FROM questions q
         JOIN topics t ON t.id = q.topic_id
         WHERE t.exam_id = $1 AND q.id = ANY($2)",
    )
    .bind(exam_id)
    .bind(question_ids)
    .fetch_all(pool)
    .await
}
