use serde::Serialize;

/// Dashboard figures. A figure that could not be loaded is `null`.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminStats {
    pub(crate) total_users: Option<i64>,
    pub(crate) total_exams: Option<i64>,
    pub(crate) pending_packages: Option<i64>,
    pub(crate) active_packages: Option<i64>,
    pub(crate) total_answers: Option<i64>,
}
