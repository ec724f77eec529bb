pub mod item_service;
pub mod kv_service;
pub mod result;

pub use item_service::{ItemErrorCode, ItemPage, ItemService, ListItemsOptions};
pub use kv_service::{GetOptions, KeyListing, KvErrorCode, KvService, ListOptions, PutOptions, ValueType};
pub use result::{ErrorCode, ServiceError, ServiceResult};
