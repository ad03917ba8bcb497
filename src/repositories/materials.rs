use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::TopicMaterial;
use crate::db::types::MaterialKind;

const COLUMNS: &str = "id, topic_id, kind, title, content, order_index, created_at, updated_at";

pub(crate) async fn list_by_topic(
    pool: &PgPool,
    topic_id: &str,
    kind: Option<MaterialKind>,
) -> Result<Vec<TopicMaterial>, sqlx::Error> {
    sqlx::query_as::<_, TopicMaterial>(&format!(
        "SELECT {COLUMNS} FROM topic_materials
         WHERE topic_id = $1 AND ($2::materialkind IS NULL OR kind = $2)
         ORDER BY kind, order_index, created_at",
    ))
    .bind(topic_id)
    .bind(kind)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateMaterial<'a> {
    pub(crate) id: &'a str,
    pub(crate) topic_id: &'a str,
    pub(crate) kind: MaterialKind,
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) order_index: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateMaterial<'_>,
) -> Result<TopicMaterial, sqlx::Error> {
    sqlx::query_as::<_, TopicMaterial>(&format!(
        "INSERT INTO topic_materials (
            id, topic_id, kind, title, content, order_index, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.topic_id)
    .bind(params.kind)
    .bind(params.title)
    .bind(params.content)
    .bind(params.order_index)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM topic_materials WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
