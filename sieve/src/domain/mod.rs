//! Domain logic

pub mod filters;
pub mod sanitize;
