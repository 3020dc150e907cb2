//! Entity services for Lunar.
//!
//! Composes the path namespace, the document store, and an
//! [`EntityHandler`](lunar_model::EntityHandler) into validated CRUD:
//! - [`EntityService`] — create/get/list/update/delete for any handler
//! - [`DatasourceService`] — the datasource instance, plus component input
//! - [`FileService`] — uploads into a user's file area
//! - [`StorageContext`] — builds all of the above from a `StorageConfig`

mod context;
mod datasource;
mod entity;
mod error;
mod files;

pub use context::StorageContext;
pub use datasource::DatasourceService;
pub use entity::EntityService;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use files::FileService;
