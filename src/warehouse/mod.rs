// src/warehouse/mod.rs

pub mod script;

pub use script::ScriptWarehouse;

use crate::error::WarehouseError;
use crate::sql::Dialect;

/// A connection that can run one SQL statement at a time.
///
/// Every pipeline component talks to the warehouse through this trait, so the same
/// schema, load and transform code drives an in-process DuckDB database or renders a
/// script for Redshift.
pub trait Warehouse {
    /// Dialect the statements handed to this warehouse must be written in.
    fn dialect(&self) -> Dialect;

    /// Run a single statement, returning the number of rows it changed.
    fn execute(&self, statement: &str) -> Result<usize, WarehouseError>;

    /// Run a query and return the first column of every row as text.
    fn query_text(&self, query: &str) -> Result<Vec<String>, WarehouseError>;
}
