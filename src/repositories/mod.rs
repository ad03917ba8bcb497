pub(crate) mod exam_results;
pub(crate) mod exams;
pub(crate) mod materials;
pub(crate) mod packages;
pub(crate) mod practice_exams;
pub(crate) mod questions;
pub(crate) mod stats;
pub(crate) mod topics;
pub(crate) mod users;
