//! Local-first client for the RBAC sync bridge.
//!
//! Writes land in an embedded SQLite store and are queued as CRUD
//! transactions; the [`bridge::UploadBridge`] drains that queue to the sync
//! endpoint in the background while the [`facade::RbacFacade`] serves live
//! read models straight from the local tables.

pub mod bridge;
pub mod config;
pub mod error;
pub mod facade;
pub mod scheduler;
pub mod schema;
pub mod session;
pub mod store;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use store::LocalStore;
