mod auth;
mod context;
mod key;
mod permission;
mod request_id;

pub use auth::auth_middleware;
pub use context::{Permissions, ResourceKey};
pub use key::resolve_key_middleware;
pub use permission::permission_middleware;
pub use request_id::{RequestId, request_id_middleware};
