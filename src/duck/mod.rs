// src/duck/mod.rs

pub mod rows;

pub use rows::DuckRow;

use duckdb::Connection;
use std::path::Path;
use tracing::debug;

use crate::error::WarehouseError;
use crate::schema::Table;
use crate::sql::Dialect;
use crate::warehouse::Warehouse;

/// In-process DuckDB database acting as the warehouse.
pub struct DuckDbWarehouse {
    conn: Connection,
}

impl DuckDbWarehouse {
    /// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
    pub fn open(path: &Path) -> Result<Self, WarehouseError> {
        let conn = Connection::open(path)
            .map_err(|e| WarehouseError::Connection(format!("{}: {}", path.display(), e)))?;
        Ok(Self { conn })
    }

    /// Open a DuckDB in-memory database.
    pub fn in_memory() -> Result<Self, WarehouseError> {
        let conn =
            Connection::open_in_memory().map_err(|e| WarehouseError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open from a path string; `:memory:` selects an in-memory database.
    pub fn new(path: &str) -> Result<Self, WarehouseError> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::open(Path::new(path))
        }
    }

    pub fn count_rows(&self, table: Table) -> Result<u64, WarehouseError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| WarehouseError::execution(&sql, e.to_string()))?;
        Ok(count.max(0) as u64)
    }

    /// Read every row of `R`'s table in its natural key order.
    pub fn fetch_all<R: DuckRow>(&self) -> Result<Vec<R>, WarehouseError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            R::SELECT.join(", "),
            R::TABLE.name(),
            R::ORDER_BY
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| WarehouseError::execution(&sql, e.to_string()))?;
        let rows = stmt
            .query_map([], |row| R::from_row(row))
            .map_err(|e| WarehouseError::execution(&sql, e.to_string()))?;
        rows.collect::<duckdb::Result<Vec<R>>>()
            .map_err(|e| WarehouseError::execution(&sql, e.to_string()))
    }
}

impl Warehouse for DuckDbWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&self, statement: &str) -> Result<usize, WarehouseError> {
        debug!(%statement, "duckdb execute");
        self.conn
            .execute(statement, [])
            .map_err(|e| WarehouseError::execution(statement, e.to_string()))
    }

    fn query_text(&self, query: &str) -> Result<Vec<String>, WarehouseError> {
        let mut stmt = self
            .conn
            .prepare(query)
            .map_err(|e| WarehouseError::execution(query, e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| WarehouseError::execution(query, e.to_string()))?;
        rows.collect::<duckdb::Result<Vec<String>>>()
            .map_err(|e| WarehouseError::execution(query, e.to_string()))
    }
}
