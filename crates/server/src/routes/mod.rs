//! HTTP route handlers.

pub mod analytics;
pub mod articles;
pub mod auth;
pub mod categories;
pub mod health;
