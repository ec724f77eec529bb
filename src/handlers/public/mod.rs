// handlers/public/mod.rs - endpoints served without authentication
pub mod health;
pub mod time;

pub use health::healthz_get;
pub use time::time_get;
