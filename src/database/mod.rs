pub mod manager;
pub mod models;
pub mod repository;
pub mod schema;

pub use manager::{connect, health_check, DatabaseError};
pub use models::{Item, ItemPatch, NewItem};
pub use repository::{ItemRepository, PageQuery, SqliteItemRepository, StoreError};
