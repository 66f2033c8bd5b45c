// src/schema/mod.rs

pub mod tables;
pub mod types;

pub use tables::Table;
pub use types::{Column, ColumnType, Constraint, TableDef};

use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::error::EtlError;
use crate::sql::Dialect;
use crate::warehouse::Warehouse;

/// Drops and re-creates the fixed set of warehouse tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaManager;

impl SchemaManager {
    pub fn new() -> Self {
        Self
    }

    /// Every `DROP` statement for `dialect`, tagged with its table.
    pub fn drop_statements(&self, dialect: Dialect) -> Vec<(Table, String)> {
        Table::ALL
            .into_iter()
            .flat_map(|t| {
                t.def()
                    .render_drop(dialect)
                    .into_iter()
                    .map(move |sql| (t, sql))
            })
            .collect()
    }

    /// Every `CREATE` statement for `dialect`, tagged with its table.
    pub fn create_statements(&self, dialect: Dialect) -> Vec<(Table, String)> {
        Table::ALL
            .into_iter()
            .flat_map(|t| {
                t.def()
                    .render_create(dialect)
                    .into_iter()
                    .map(move |sql| (t, sql))
            })
            .collect()
    }

    pub fn drop_all(&self, warehouse: &dyn Warehouse) -> Result<(), EtlError> {
        self.run(warehouse, self.drop_statements(warehouse.dialect()))
    }

    pub fn create_all(&self, warehouse: &dyn Warehouse) -> Result<(), EtlError> {
        self.run(warehouse, self.create_statements(warehouse.dialect()))
    }

    /// Drop every table that exists, then create all of them empty. Safe to call on a
    /// fresh or an already populated warehouse. The first failing statement aborts.
    #[instrument(level = "info", skip_all, fields(dialect = %warehouse.dialect()))]
    pub fn reset_schema(&self, warehouse: &dyn Warehouse) -> Result<(), EtlError> {
        let start = Instant::now();
        self.drop_all(warehouse)?;
        self.create_all(warehouse)?;
        info!(tables = Table::ALL.len(), elapsed = ?start.elapsed(), "schema reset");
        Ok(())
    }

    fn run(
        &self,
        warehouse: &dyn Warehouse,
        statements: Vec<(Table, String)>,
    ) -> Result<(), EtlError> {
        for (table, sql) in statements {
            debug!(table = table.name(), %sql, "ddl");
            warehouse
                .execute(&sql)
                .map_err(|source| EtlError::Schema {
                    table: table.name(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::DuckDbWarehouse;
    use crate::error::ErrorKind;
    use crate::testing::init_test_logging;
    use crate::warehouse::ScriptWarehouse;

    fn table_names(wh: &DuckDbWarehouse) -> Vec<String> {
        wh.query_text(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )
        .unwrap()
    }

    #[test]
    fn reset_creates_all_seven_tables() {
        init_test_logging();
        let wh = DuckDbWarehouse::in_memory().unwrap();
        SchemaManager::new().reset_schema(&wh).unwrap();
        assert_eq!(
            table_names(&wh),
            vec![
                "artist",
                "song",
                "songplay",
                "sparkify_user",
                "staging_events",
                "staging_songs",
                "start_time"
            ]
        );
    }

    #[test]
    fn reset_is_idempotent_and_empties_tables() {
        init_test_logging();
        let wh = DuckDbWarehouse::in_memory().unwrap();
        let schema = SchemaManager::new();
        schema.reset_schema(&wh).unwrap();
        wh.execute("INSERT INTO sparkify_user (user_id, level) VALUES ('1', 'free')")
            .unwrap();
        assert_eq!(wh.count_rows(Table::Users).unwrap(), 1);

        schema.reset_schema(&wh).unwrap();
        assert_eq!(table_names(&wh).len(), 7);
        for t in Table::ALL {
            assert_eq!(wh.count_rows(t).unwrap(), 0, "{} not empty", t.name());
        }
    }

    #[test]
    fn songplay_ids_are_generated() {
        let wh = DuckDbWarehouse::in_memory().unwrap();
        SchemaManager::new().reset_schema(&wh).unwrap();
        wh.execute(
            "INSERT INTO songplay (start_time, song_id, artist_id) \
             VALUES (TIMESTAMP '2018-11-01 00:00:00', 'S1', 'A1'), \
                    (TIMESTAMP '2018-11-01 00:00:01', 'S2', 'A2')",
        )
        .unwrap();
        let ids = wh
            .query_text("SELECT CAST(songplay_id AS VARCHAR) FROM songplay ORDER BY songplay_id")
            .unwrap();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn failing_ddl_is_a_schema_error() {
        let wh = DuckDbWarehouse::in_memory().unwrap();
        let schema = SchemaManager::new();
        schema.create_all(&wh).unwrap();
        // Creating again without a drop collides with the existing tables.
        let err = schema.create_all(&wh).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(err, EtlError::Schema { table: "staging_events", .. }));
    }

    #[test]
    fn redshift_script_drops_before_creating() {
        let wh = ScriptWarehouse::new(Dialect::Redshift);
        SchemaManager::new().reset_schema(&wh).unwrap();
        let stmts = wh.statements();
        assert_eq!(stmts.len(), 14);
        assert!(stmts[..7].iter().all(|s| s.starts_with("DROP TABLE IF EXISTS")));
        assert!(stmts[7..].iter().all(|s| s.starts_with("CREATE TABLE")));
        assert!(stmts[9].contains("songplay_id INTEGER IDENTITY(0,1) PRIMARY KEY"));
    }
}
