pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod content;
pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod packages;
pub(crate) mod pagination;
pub(crate) mod practice;
pub(crate) mod quiz;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
