use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str =
    "id, name, code, description, price, is_active, features, badge, created_at, updated_at";

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams
         WHERE is_active OR $1
         ORDER BY name ASC",
    ))
    .bind(include_inactive)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) code: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) price: f64,
    pub(crate) is_active: bool,
    pub(crate) features: Vec<String>,
    pub(crate) badge: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, name, code, description, price, is_active, features, badge, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.code)
    .bind(params.description)
    .bind(params.price)
    .bind(params.is_active)
    .bind(Json(params.features))
    .bind(params.badge)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

#[derive(Default)]
pub(crate) struct UpdateExam {
    pub(crate) name: Option<String>,
    pub(crate) code: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) price: Option<f64>,
    pub(crate) is_active: Option<bool>,
    pub(crate) features: Option<Vec<String>>,
    pub(crate) badge: Option<String>,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
    now: PrimitiveDateTime,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            name = COALESCE($1, name),
            code = COALESCE($2, code),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            is_active = COALESCE($5, is_active),
            features = COALESCE($6, features),
            badge = COALESCE($7, badge),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.code)
    .bind(params.description)
    .bind(params.price)
    .bind(params.is_active)
    .bind(params.features.map(Json))
    .bind(params.badge)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fails with a foreign-key violation while packages or practice results reference the exam.
pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
