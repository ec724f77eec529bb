pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod kv;
pub mod middleware;
pub mod services;
pub mod validation;

pub use app::{app, AppState, StartupError};
