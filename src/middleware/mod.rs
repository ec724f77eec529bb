pub mod auth;
pub mod security;

pub use auth::jwt_auth_middleware;
pub use security::{cors_policy, handle_panic, with_security_headers};
