use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::ExamResult;

const COLUMNS: &str =
    "id, user_id, question_id, selected_answer, is_correct, topic_id, exam_id, answered_at";

pub(crate) struct InsertResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_answer: i32,
    pub(crate) is_correct: bool,
    pub(crate) topic_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) answered_at: PrimitiveDateTime,
}

pub(crate) async fn insert(pool: &PgPool, params: InsertResult<'_>) -> Result<ExamResult, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "INSERT INTO exam_results (
            id, user_id, question_id, selected_answer, is_correct, topic_id, exam_id, answered_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.question_id)
    .bind(params.selected_answer)
    .bind(params.is_correct)
    .bind(params.topic_id)
    .bind(params.exam_id)
    .bind(params.answered_at)
    .fetch_one(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerTotals {
    pub(crate) total: i64,
    pub(crate) correct: i64,
}

pub(crate) async fn totals_for_user(
    pool: &PgPool,
    user_id: &str,
    since: Option<PrimitiveDateTime>,
) -> Result<AnswerTotals, sqlx::Error> {
    sqlx::query_as::<_, AnswerTotals>(
        "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE is_correct) AS correct
         FROM exam_results
         WHERE user_id = $1 AND ($2::timestamp IS NULL OR answered_at >= $2)",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TopicTotals {
    pub(crate) topic_id: String,
    pub(crate) topic_name: String,
    pub(crate) total: i64,
    pub(crate) correct: i64,
}

/// Per-topic breakdown; rows whose topic was never recorded or has since been deleted are
/// left out.
pub(crate) async fn totals_by_topic(
    pool: &PgPool,
    user_id: &str,
    since: Option<PrimitiveDateTime>,
) -> Result<Vec<TopicTotals>, sqlx::Error> {
    sqlx::query_as::<_, TopicTotals>(
        "SELECT t.id AS topic_id, t.name AS topic_name,
                COUNT(*) AS total, COUNT(*) FILTER (WHERE r.is_correct) AS correct
         FROM exam_results r
         JOIN topics t ON t.id = r.topic_id
         WHERE r.user_id = $1 AND ($2::timestamp IS NULL OR r.answered_at >= $2)
         GROUP BY t.id, t.name, t.order_index
         ORDER BY t.order_index, t.name",
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exam_results").fetch_one(pool).await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RankingRow {
    pub(crate) rank: i64,
    pub(crate) user_id: String,
    pub(crate) full_name: String,
    pub(crate) city: Option<String>,
    pub(crate) correct: i64,
    pub(crate) total: i64,
}

/// Leaderboard for one exam: most correct answers first, then fewer attempts, then whoever
/// started earlier. Returns the top `limit` rows plus the row of `user_id` when it falls
/// outside them.
pub(crate) async fn ranking(
    pool: &PgPool,
    exam_id: &str,
    limit: i64,
    user_id: &str,
) -> Result<Vec<RankingRow>, sqlx::Error> {
    sqlx::query_as::<_, RankingRow>(
        "WITH scores AS (
            SELECT r.user_id,
                   COUNT(*) FILTER (WHERE r.is_correct) AS correct,
                   COUNT(*) AS total,
                   MIN(r.answered_at) AS first_answer
            FROM exam_results r
            WHERE r.exam_id = $1
            GROUP BY r.user_id
         ),
         ranked AS (
            SELECT ROW_NUMBER() OVER (
                       ORDER BY s.correct DESC, s.total ASC, s.first_answer ASC, s.user_id
                   ) AS rank,
                   s.user_id, u.full_name, u.city, s.correct, s.total
            FROM scores s
            JOIN users u ON u.id = s.user_id
            WHERE u.is_active
         )
         SELECT rank, user_id, full_name, city, correct, total
         FROM ranked
         WHERE rank <= $2 OR user_id = $3
         ORDER BY rank",
    )
    .bind(exam_id)
    .bind(limit)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UnscopedResult {
    pub(crate) id: String,
    pub(crate) question_id: Option<String>,
}

/// Results recorded before answers carried their topic and exam.
pub(crate) async fn list_missing_scope(
    pool: &PgPool,
    after_id: Option<&str>,
    limit: i64,
) -> Result<Vec<UnscopedResult>, sqlx::Error> {
    sqlx::query_as::<_, UnscopedResult>(
        "SELECT id, question_id
         FROM exam_results
         WHERE (topic_id IS NULL OR exam_id IS NULL)
           AND ($1::text IS NULL OR id > $1)
         ORDER BY id
         LIMIT $2",
    )
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Fills the scope of one result from its question. Returns `false` when the question is gone.
pub(crate) async fn fill_scope_from_question(
    pool: &PgPool,
    result_id: &str,
    question_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exam_results r
         SET topic_id = COALESCE(r.topic_id, q.topic_id),
             exam_id = COALESCE(r.exam_id, t.exam_id)
         FROM questions q
         JOIN topics t ON t.id = q.topic_id
         WHERE r.id = $1 AND q.id = $2",
    )
    .bind(result_id)
    .bind(question_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
