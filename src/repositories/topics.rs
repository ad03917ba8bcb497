use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Topic;

pub(crate) const COLUMNS: &str =
    "id, exam_id, name, description, order_index, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!("SELECT {COLUMNS} FROM topics WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_exam(pool: &PgPool, exam_id: &str) -> Result<Vec<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "SELECT {COLUMNS} FROM topics WHERE exam_id = $1 ORDER BY order_index ASC, name ASC",
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_ids_by_exam(pool: &PgPool, exam_id: &str) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM topics WHERE exam_id = $1 ORDER BY order_index")
        .bind(exam_id)
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateTopic<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) order_index: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateTopic<'_>) -> Result<Topic, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "INSERT INTO topics (id, exam_id, name, description, order_index, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.name)
    .bind(params.description)
    .bind(params.order_index)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    order_index: Option<i32>,
    now: PrimitiveDateTime,
) -> Result<Option<Topic>, sqlx::Error> {
    sqlx::query_as::<_, Topic>(&format!(
        "UPDATE topics SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            order_index = COALESCE($3, order_index),
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(name)
    .bind(description)
    .bind(order_index)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM topics WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Returns how many of `topic_ids` belong to `exam_id`.
pub(crate) async fn count_in_exam(
    pool: &PgPool,
    exam_id: &str,
    topic_ids: &[String],
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM topics WHERE exam_id = $1 AND id = ANY($2)",
    )
    .bind(exam_id)
    .bind(topic_ids)
    .fetch_one(pool)
    .await
}
