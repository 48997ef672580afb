//! One repository per table. Every write is a single autocommit statement;
//! callers must not assume consecutive calls share a connection.

pub mod permission_repo;
pub mod role_permission_repo;
pub mod role_repo;
pub mod timeline_repo;
pub mod user_repo;

pub use permission_repo::PermissionRepo;
pub use role_permission_repo::RolePermissionRepo;
pub use role_repo::RoleRepo;
pub use timeline_repo::TimelineRepo;
pub use user_repo::UserRepo;
