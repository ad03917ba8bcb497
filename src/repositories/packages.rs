use std::borrow::Borrow;

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::UserPackage;
use crate::db::types::PackageStatus;

pub(crate) const COLUMNS: &str = "\
    id, user_id, exam_id, status, purchased_at, activated_at, expires_at, payment_date, \
    payment_amount, payment_method, transaction_id, payment_notes, admin_notes, updated_at";

const JOINED_COLUMNS: &str = "\
    p.id, p.user_id, p.exam_id, p.status, p.purchased_at, p.activated_at, p.expires_at, \
    p.payment_date, p.payment_amount, p.payment_method, p.transaction_id, p.payment_notes, \
    p.admin_notes, p.updated_at, e.name AS exam_name, e.code AS exam_code, \
    u.email AS user_email, u.full_name AS user_full_name";

/// A package row joined with the exam and owner it refers to.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PackageRow {
    #[sqlx(flatten)]
    pub(crate) package: UserPackage,
    pub(crate) exam_name: String,
    pub(crate) exam_code: String,
    pub(crate) user_email: String,
    pub(crate) user_full_name: String,
}

impl Borrow<UserPackage> for PackageRow {
    fn borrow(&self) -> &UserPackage {
        &self.package
    }
}

fn db_status(status: PackageStatus) -> &'static str {
    match status {
        PackageStatus::Pending => "pending",
        PackageStatus::Active => "active",
        PackageStatus::Expired => "expired",
        PackageStatus::Cancelled => "cancelled",
    }
}

fn joined_select() -> String {
    format!(
        "SELECT {JOINED_COLUMNS}
         FROM user_packages p
         JOIN exams e ON e.id = p.exam_id
         JOIN users u ON u.id = p.user_id"
    )
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<UserPackage>, sqlx::Error> {
    sqlx::query_as::<_, UserPackage>(&format!("SELECT {COLUMNS} FROM user_packages WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn find_row_by_id(pool: &PgPool, id: &str) -> Result<Option<PackageRow>, sqlx::Error> {
    sqlx::query_as::<_, PackageRow>(&format!("{} WHERE p.id = $1", joined_select()))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Every package of one user, newest request first.
pub(crate) async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<PackageRow>, sqlx::Error> {
    sqlx::query_as::<_, PackageRow>(&format!(
        "{} WHERE p.user_id = $1 ORDER BY p.purchased_at DESC",
        joined_select()
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Rows stored as ACTIVE for the user, optionally narrowed to one exam. Whether they are still
/// in force is decided by the caller with the read-time expiry predicate.
pub(crate) async fn list_stored_active(
    pool: &PgPool,
    user_id: &str,
    exam_id: Option<&str>,
) -> Result<Vec<PackageRow>, sqlx::Error> {
    sqlx::query_as::<_, PackageRow>(&format!(
        "{} WHERE p.user_id = $1 AND p.status = 'active' AND ($2::text IS NULL OR p.exam_id = $2)
         ORDER BY p.activated_at DESC NULLS LAST",
        joined_select()
    ))
    .bind(user_id)
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_pending(pool: &PgPool) -> Result<Vec<PackageRow>, sqlx::Error> {
    sqlx::query_as::<_, PackageRow>(&format!(
        "{} WHERE p.status = 'pending' ORDER BY p.purchased_at ASC",
        joined_select()
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct ListPackagesParams {
    pub(crate) status: Option<PackageStatus>,
    pub(crate) exam_id: Option<String>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list_all(
    pool: &PgPool,
    params: ListPackagesParams,
) -> Result<Vec<PackageRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(joined_select());
    builder.push(" WHERE TRUE");

    if let Some(status) = params.status {
        builder.push(" AND p.status::text = ");
        builder.push_bind(db_status(status));
    }
    if let Some(exam_id) = params.exam_id.as_deref().filter(|value| !value.is_empty()) {
        builder.push(" AND p.exam_id = ");
        builder.push_bind(exam_id.to_string());
    }

    builder.push(" ORDER BY p.purchased_at DESC OFFSET ");
    builder.push_bind(params.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(params.limit.clamp(1, 1000));

    builder.build_query_as::<PackageRow>().fetch_all(pool).await
}

/// The open (pending or stored-active) row for a user and exam, if any. Locked for the rest of
/// the transaction.
pub(crate) async fn find_open_for_update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    exam_id: &str,
) -> Result<Option<UserPackage>, sqlx::Error> {
    sqlx::query_as::<_, UserPackage>(&format!(
        "SELECT {COLUMNS} FROM user_packages
         WHERE user_id = $1 AND exam_id = $2 AND status IN ('pending', 'active')
         FOR UPDATE",
    ))
    .bind(user_id)
    .bind(exam_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Writes EXPIRED onto the pair's ACTIVE row once its expiry has passed, so a fresh package can
/// take its place under the open-package index.
pub(crate) async fn settle_expired(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE user_packages
         SET status = 'expired', updated_at = $3
         WHERE user_id = $1 AND exam_id = $2 AND status = 'active'
           AND expires_at IS NOT NULL AND expires_at <= $3",
    )
    .bind(user_id)
    .bind(exam_id)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) struct InsertPending<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) payment_date: Option<PrimitiveDateTime>,
    pub(crate) payment_amount: Option<f64>,
    pub(crate) payment_method: Option<&'a str>,
    pub(crate) transaction_id: Option<&'a str>,
    pub(crate) payment_notes: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn insert_pending(
    tx: &mut Transaction<'_, Postgres>,
    params: InsertPending<'_>,
) -> Result<UserPackage, sqlx::Error> {
    sqlx::query_as::<_, UserPackage>(&format!(
        "INSERT INTO user_packages (
            id, user_id, exam_id, status, purchased_at, payment_date, payment_amount,
            payment_method, transaction_id, payment_notes, updated_at
         ) VALUES ($1,$2,$3,'pending',$4,$5,$6,$7,$8,$9,$4)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exam_id)
    .bind(params.now)
    .bind(params.payment_date)
    .bind(params.payment_amount)
    .bind(params.payment_method)
    .bind(params.transaction_id)
    .bind(params.payment_notes)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) struct InsertAssigned<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    pub(crate) admin_notes: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn insert_assigned(
    tx: &mut Transaction<'_, Postgres>,
    params: InsertAssigned<'_>,
) -> Result<UserPackage, sqlx::Error> {
    sqlx::query_as::<_, UserPackage>(&format!(
        "INSERT INTO user_packages (
            id, user_id, exam_id, status, purchased_at, activated_at, expires_at,
            admin_notes, updated_at
         ) VALUES ($1,$2,$3,'active',$4,$4,$5,$6,$4)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.exam_id)
    .bind(params.now)
    .bind(params.expires_at)
    .bind(params.admin_notes)
    .fetch_one(&mut **tx)
    .await
}

/// PENDING -> ACTIVE in one conditional statement. `None` means the row was missing or no longer
/// pending.
pub(crate) async fn approve(
    pool: &PgPool,
    id: &str,
    expires_at: Option<PrimitiveDateTime>,
    admin_notes: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Option<UserPackage>, sqlx::Error> {
    sqlx::query_as::<_, UserPackage>(&format!(
        "UPDATE user_packages
         SET status = 'active', activated_at = $2, expires_at = $3,
             admin_notes = COALESCE($4, admin_notes), updated_at = $2
         WHERE id = $1 AND status = 'pending'
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(now)
    .bind(expires_at)
    .bind(admin_notes)
    .fetch_optional(pool)
    .await
}

/// Moves a package to CANCELLED when its stored status is one of `from`.
pub(crate) async fn cancel_from(
    pool: &PgPool,
    id: &str,
    from: &[PackageStatus],
    admin_notes: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Option<UserPackage>, sqlx::Error> {
    let from: Vec<&str> = from.iter().copied().map(db_status).collect();
    sqlx::query_as::<_, UserPackage>(&format!(
        "UPDATE user_packages
         SET status = 'cancelled', admin_notes = COALESCE($3, admin_notes), updated_at = $4
         WHERE id = $1 AND status::text = ANY($2)
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(from)
    .bind(admin_notes)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_by_status(
    pool: &PgPool,
    status: PackageStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_packages WHERE status::text = $1")
        .bind(db_status(status))
        .fetch_one(pool)
        .await
}

/// Stored-ACTIVE rows still in force at `now`.
pub(crate) async fn count_in_force(pool: &PgPool, now: PrimitiveDateTime) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM user_packages
         WHERE status = 'active' AND (expires_at IS NULL OR expires_at > $1)",
    )
    .bind(now)
    .fetch_one(pool)
    .await
}
