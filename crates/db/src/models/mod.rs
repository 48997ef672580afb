pub mod permission;
pub mod role;
pub mod role_permission;
pub mod timeline;
pub mod user;
