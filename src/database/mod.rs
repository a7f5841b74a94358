pub mod dynamic;
pub mod entity;
pub mod error;
pub mod manager;
pub mod models;
pub mod record;
pub mod relation;
pub mod repository;
pub mod schema;
pub mod store;

pub use dynamic::{DynamicRepository, FinderResult};
pub use entity::Entity;
pub use error::RepositoryError;
pub use manager::Catalog;
pub use record::{Record, RecordError, RecordId};
pub use repository::Repository;
pub use schema::{Constraint, FieldDef, FieldType, Schema};
pub use store::{MemoryStore, Transaction};
