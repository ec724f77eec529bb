// handlers/protected/mod.rs - endpoints behind the bearer token middleware
pub mod items;
pub mod kv;
pub mod profile;

pub use profile::profile_get;
