//! Loads Sparkify listening logs and the song catalog from object storage into a
//! star-schema warehouse: two staging tables, one `songplay` fact table and four
//! dimensions (`sparkify_user`, `song`, `artist`, `start_time`).

pub mod config;
pub mod duck;
pub mod error;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod sql;
pub mod transform;
pub mod warehouse;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{EtlConfig, SourceConfig, WarehouseConfig};
pub use duck::DuckDbWarehouse;
pub use error::{ErrorKind, EtlError, WarehouseError};
pub use load::BulkLoader;
pub use pipeline::{Pipeline, RunReport};
pub use schema::SchemaManager;
pub use sql::Dialect;
pub use transform::{Derivation, TransformEngine, TransformPlan};
pub use warehouse::{ScriptWarehouse, Warehouse};
