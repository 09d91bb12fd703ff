//! Pontigram News Server Library
//!
//! This library exposes server internals for integration testing.
//! The main entry point for running the server is the `pontigram` binary.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fallback;
pub mod models;
pub mod publication;
pub mod routes;
pub mod slug;
pub mod state;
pub mod ticker;
