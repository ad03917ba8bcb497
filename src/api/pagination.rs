pub(crate) const fn default_limit() -> i64 {
    100
}

/// Clamps a client-supplied page size into `1..=max`, falling back to `default` when absent.
pub(crate) fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}
