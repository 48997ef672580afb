//! Request handlers.
//!
//! Handlers delegate to the batch engine or to the repositories in
//! `rbac_sync_db` and map errors via [`AppError`](crate::error::AppError).

pub mod credentials;
pub mod rbac;
pub mod sync;
