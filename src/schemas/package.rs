use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use validator::Validate;

use crate::core::time::{deserialize_option_datetime, format_optional, format_primitive};
use crate::db::types::PackageStatus;
use crate::repositories::packages::PackageRow;
use crate::services::package_lifecycle;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PackageRequest {
    #[serde(alias = "examId")]
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(default, alias = "paymentDate", deserialize_with = "deserialize_option_datetime")]
    pub(crate) payment_date: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[serde(alias = "paymentAmount")]
    #[validate(range(min = 0.0, message = "payment_amount must be non-negative"))]
    pub(crate) payment_amount: Option<f64>,
    #[serde(default)]
    #[serde(alias = "paymentMethod")]
    #[validate(length(max = 100, message = "payment_method is too long"))]
    pub(crate) payment_method: Option<String>,
    #[serde(default)]
    #[serde(alias = "transactionId")]
    #[validate(length(max = 200, message = "transaction_id is too long"))]
    pub(crate) transaction_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "paymentNotes", alias = "notes")]
    pub(crate) payment_notes: Option<String>,
}

/// Body of approve, reject and cancel. `expires_at` is only read by approve.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PackageDecision {
    #[serde(default, alias = "expiresAt", deserialize_with = "deserialize_option_datetime")]
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[serde(alias = "adminNotes")]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PackageAssign {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[serde(alias = "examId")]
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(default, alias = "expiresAt", deserialize_with = "deserialize_option_datetime")]
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    #[serde(default)]
    #[serde(alias = "adminNotes")]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PackageListQuery {
    #[serde(default)]
    pub(crate) status: Option<PackageStatus>,
    #[serde(default)]
    #[serde(alias = "examId")]
    pub(crate) exam_id: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageExam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageUser {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) full_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageResponse {
    pub(crate) id: String,
    /// Stored status with lapsed `ACTIVE` rows reported as `EXPIRED`.
    pub(crate) status: PackageStatus,
    pub(crate) is_active: bool,
    pub(crate) exam: PackageExam,
    pub(crate) user: PackageUser,
    pub(crate) purchased_at: String,
    pub(crate) activated_at: Option<String>,
    pub(crate) expires_at: Option<String>,
    pub(crate) payment_date: Option<String>,
    pub(crate) payment_amount: Option<f64>,
    pub(crate) payment_method: Option<String>,
    pub(crate) transaction_id: Option<String>,
    pub(crate) payment_notes: Option<String>,
    pub(crate) admin_notes: Option<String>,
    pub(crate) updated_at: String,
}

impl PackageResponse {
    pub(crate) fn from_row(row: PackageRow, now: PrimitiveDateTime) -> Self {
        let status = package_lifecycle::effective_status(&row.package, now);
        let is_active = package_lifecycle::package_is_active(&row.package, now);
        let package = row.package;

        Self {
            id: package.id,
            status,
            is_active,
            exam: PackageExam { id: package.exam_id, name: row.exam_name, code: row.exam_code },
            user: PackageUser {
                id: package.user_id,
                email: row.user_email,
                full_name: row.user_full_name,
            },
            purchased_at: format_primitive(package.purchased_at),
            activated_at: format_optional(package.activated_at),
            expires_at: format_optional(package.expires_at),
            payment_date: format_optional(package.payment_date),
            payment_amount: package.payment_amount,
            payment_method: package.payment_method,
            transaction_id: package.transaction_id,
            payment_notes: package.payment_notes,
            admin_notes: package.admin_notes,
            updated_at: format_primitive(package.updated_at),
        }
    }
}
