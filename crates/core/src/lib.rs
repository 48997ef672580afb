//! Shared domain types for the RBAC sync bridge.
//!
//! Everything that both the server and the client need to agree on lives
//! here: identifier and timestamp conventions, the four RBAC entity records,
//! and the wire format of the batch sync protocol.

pub mod credentials;
pub mod entities;
pub mod error;
pub mod sync;
pub mod types;
