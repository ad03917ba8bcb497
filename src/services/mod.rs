pub(crate) mod package_lifecycle;
pub(crate) mod question_rules;
pub(crate) mod result_backfill;
pub(crate) mod scoring;
