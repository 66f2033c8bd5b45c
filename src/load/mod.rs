// src/load/mod.rs

pub mod jsonpaths;
pub mod source;

pub use jsonpaths::{FieldPath, FieldPathSpec};
pub use source::SourceLocation;

use std::fs;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::SourceConfig;
use crate::error::EtlError;
use crate::schema::Table;
use crate::sql::{quote_literal, Dialect, InsertSelect, Select};
use crate::warehouse::Warehouse;

/// Name of the DuckDB secret registered for S3 sources.
const SECRET_NAME: &str = "sparkify_source";

/// Rows copied into each staging table. Script backends report zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub events: u64,
    pub songs: u64,
}

/// Copies the raw listening log and song catalog into the two staging tables.
///
/// Loads are all-or-nothing per table: a malformed record or a value that does not fit
/// its column fails the statement and nothing is skipped. The loader never clears the
/// staging tables; resetting the schema first is the caller's job.
#[derive(Debug, Clone)]
pub struct BulkLoader {
    sources: SourceConfig,
}

impl BulkLoader {
    pub fn new(sources: &SourceConfig) -> Self {
        Self {
            sources: sources.clone(),
        }
    }

    #[instrument(level = "info", skip_all, fields(dialect = %warehouse.dialect()))]
    pub fn load_staging(&self, warehouse: &dyn Warehouse) -> Result<LoadReport, EtlError> {
        let start = Instant::now();
        self.prepare(warehouse)?;
        let events = self.load_events(warehouse)?;
        let songs = self.load_songs(warehouse)?;
        info!(events, songs, elapsed = ?start.elapsed(), "staging loaded");
        Ok(LoadReport { events, songs })
    }

    /// Copy the listening log into `staging_events` through the configured field path spec.
    pub fn load_events(&self, warehouse: &dyn Warehouse) -> Result<u64, EtlError> {
        let table = Table::StagingEvents;
        let sql = match warehouse.dialect() {
            Dialect::Redshift => self.redshift_copy(
                table,
                &self.sources.events_source_uri,
                &self.sources.events_field_path_spec,
            ),
            Dialect::DuckDb => {
                let spec = self.fetch_field_path_spec(warehouse)?;
                duckdb_copy(
                    table,
                    &resolve_sources(table, &self.sources.events_source_uri)?,
                    &spec,
                    &self.sources.events_field_path_spec,
                )?
            }
        };
        run_copy(warehouse, table, &sql)
    }

    /// Copy the song catalog into `staging_songs`, mapping keys onto columns by name.
    pub fn load_songs(&self, warehouse: &dyn Warehouse) -> Result<u64, EtlError> {
        let table = Table::StagingSongs;
        let sql = match warehouse.dialect() {
            Dialect::Redshift => {
                self.redshift_copy(table, &self.sources.songs_source_uri, "auto")
            }
            Dialect::DuckDb => {
                let spec = FieldPathSpec::auto(table.def().column_names());
                duckdb_copy(
                    table,
                    &resolve_sources(table, &self.sources.songs_source_uri)?,
                    &spec,
                    "auto",
                )?
            }
        };
        run_copy(warehouse, table, &sql)
    }

    /// Statements a DuckDB warehouse needs before it can read remote sources. Empty when
    /// every source is local or the warehouse is Redshift.
    pub fn setup_statements(&self, dialect: Dialect) -> Vec<String> {
        if dialect != Dialect::DuckDb {
            return Vec::new();
        }
        let locations: Vec<SourceLocation> = [
            &self.sources.events_source_uri,
            &self.sources.events_field_path_spec,
            &self.sources.songs_source_uri,
        ]
        .into_iter()
        .map(|s| SourceLocation::parse(s))
        .collect();

        let mut stmts = Vec::new();
        if locations.iter().any(SourceLocation::is_remote) {
            stmts.push("INSTALL httpfs".to_string());
            stmts.push("LOAD httpfs".to_string());
        }
        let credential = self
            .sources
            .credential_reference
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let Some(chain) = credential {
            if locations.iter().any(SourceLocation::is_s3) {
                stmts.push("INSTALL aws".to_string());
                stmts.push("LOAD aws".to_string());
                stmts.push(format!(
                    "CREATE OR REPLACE SECRET {SECRET_NAME} \
                     (TYPE S3, PROVIDER credential_chain, CHAIN {})",
                    quote_literal(chain)
                ));
            }
        }
        stmts
    }

    fn prepare(&self, warehouse: &dyn Warehouse) -> Result<(), EtlError> {
        for sql in self.setup_statements(warehouse.dialect()) {
            debug!(%sql, "source setup");
            warehouse.execute(&sql).map_err(|source| EtlError::Load {
                table: Table::StagingEvents.name(),
                source,
            })?;
        }
        Ok(())
    }

    fn redshift_copy(&self, table: Table, uri: &str, format: &str) -> String {
        let role = self.sources.credential_reference.as_deref().unwrap_or("");
        format!(
            "COPY {} FROM {} IAM_ROLE {} FORMAT AS JSON {}",
            table.name(),
            quote_literal(uri),
            quote_literal(role),
            quote_literal(format)
        )
    }

    /// Read the JSONPaths document and check it covers every `staging_events` column.
    /// Local documents are read from disk; remote ones through the warehouse, which
    /// already holds the credentials for the bucket.
    fn fetch_field_path_spec(
        &self,
        warehouse: &dyn Warehouse,
    ) -> Result<FieldPathSpec, EtlError> {
        let location = self.sources.events_field_path_spec.trim();
        let unreachable = || EtlError::SourceUnreachable {
            table: Table::StagingEvents.name(),
            location: location.to_string(),
        };

        let text = match SourceLocation::parse(location) {
            SourceLocation::Remote { uri, .. } => {
                let query = format!("SELECT content FROM read_text({})", quote_literal(&uri));
                warehouse
                    .query_text(&query)
                    .map_err(|source| EtlError::Load {
                        table: Table::StagingEvents.name(),
                        source,
                    })?
                    .into_iter()
                    .next()
                    .ok_or_else(unreachable)?
            }
            local @ SourceLocation::Local { .. } => {
                let file = local.resolve().into_iter().next().ok_or_else(unreachable)?;
                fs::read_to_string(&file).map_err(|e| EtlError::FieldPathSpec {
                    location: location.to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        let spec = FieldPathSpec::from_json(&text).map_err(|reason| EtlError::FieldPathSpec {
            location: location.to_string(),
            reason,
        })?;
        let expected = Table::StagingEvents.def().columns.len();
        if spec.len() != expected {
            return Err(EtlError::FieldPathSpec {
                location: location.to_string(),
                reason: format!("{} paths for {} columns", spec.len(), expected),
            });
        }
        debug!(%location, paths = spec.len(), "field path spec loaded");
        Ok(spec)
    }
}

/// Files or remote globs to read for `table`. A local location that matches nothing is
/// unreachable.
fn resolve_sources(table: Table, raw: &str) -> Result<Vec<String>, EtlError> {
    let files = SourceLocation::parse(raw).resolve();
    if files.is_empty() {
        warn!(table = table.name(), location = raw, "no source files matched");
        return Err(EtlError::SourceUnreachable {
            table: table.name(),
            location: raw.to_string(),
        });
    }
    Ok(files)
}

/// `INSERT INTO staging (...) SELECT CAST(json_extract_string(...) AS type), ...`
/// over every NDJSON object in `files`.
fn duckdb_copy(
    table: Table,
    files: &[String],
    spec: &FieldPathSpec,
    spec_location: &str,
) -> Result<String, EtlError> {
    let def = table.def();
    if spec.len() != def.columns.len() {
        return Err(EtlError::FieldPathSpec {
            location: spec_location.to_string(),
            reason: format!("{} paths for {} columns", spec.len(), def.columns.len()),
        });
    }

    let list = files
        .iter()
        .map(|f| quote_literal(f))
        .collect::<Vec<_>>()
        .join(", ");
    let select = Select::from_source(format!("read_ndjson_objects([{list}])")).columns(
        def.columns.iter().zip(&spec.paths).map(|(col, path)| {
            format!(
                "CAST(json_extract_string(\"json\", {}) AS {})",
                quote_literal(&path.to_duckdb()),
                col.sql_type()
            )
        }),
    );
    Ok(InsertSelect::new(def.name, def.column_names(), select).render())
}

fn run_copy(warehouse: &dyn Warehouse, table: Table, sql: &str) -> Result<u64, EtlError> {
    let start = Instant::now();
    debug!(table = table.name(), %sql, "bulk copy");
    let rows = warehouse
        .execute(sql)
        .map_err(|source| EtlError::Load {
            table: table.name(),
            source,
        })?;
    info!(table = table.name(), rows, elapsed = ?start.elapsed(), "copied");
    Ok(rows as u64)
}
