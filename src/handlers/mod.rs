// handlers/mod.rs - route handlers, split by authentication tier
//
// Public (no auth) → Protected (bearer token required)
pub mod public;
pub mod protected;

mod params;

pub use params::{positive_id, query_object};
