// src/pipeline.rs

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{info, instrument};

use crate::config::{EtlConfig, WarehouseConfig};
use crate::duck::DuckDbWarehouse;
use crate::error::EtlError;
use crate::load::{BulkLoader, LoadReport};
use crate::schema::SchemaManager;
use crate::transform::{TransformEngine, TransformPlan, TransformReport};
use crate::warehouse::{ScriptWarehouse, Warehouse};

/// Phases of a run, in the order a full run executes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ResetSchema,
    LoadStaging,
    Transform,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::ResetSchema, Stage::LoadStaging, Stage::Transform];
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub stages: Vec<Stage>,
    pub load: Option<LoadReport>,
    pub transform: Option<TransformReport>,
    pub elapsed: Duration,
}

/// Reset, load, transform. Every stage is fatal on error; a failed run is recovered by
/// running again from the reset.
pub struct Pipeline {
    schema: SchemaManager,
    loader: BulkLoader,
    plan: TransformPlan,
}

impl Pipeline {
    pub fn new(config: &EtlConfig) -> Self {
        Self {
            schema: SchemaManager::new(),
            loader: BulkLoader::new(&config.sources),
            plan: TransformPlan::default(),
        }
    }

    pub fn with_plan(mut self, plan: TransformPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn run(&self, warehouse: &dyn Warehouse) -> Result<RunReport, EtlError> {
        self.run_stages(warehouse, &Stage::ALL)
    }

    #[instrument(level = "info", skip_all, fields(dialect = %warehouse.dialect()))]
    pub fn run_stages(
        &self,
        warehouse: &dyn Warehouse,
        stages: &[Stage],
    ) -> Result<RunReport, EtlError> {
        let start = Instant::now();
        let mut report = RunReport::default();
        for stage in stages {
            info!(?stage, "stage start");
            match stage {
                Stage::ResetSchema => self.schema.reset_schema(warehouse)?,
                Stage::LoadStaging => report.load = Some(self.loader.load_staging(warehouse)?),
                Stage::Transform => {
                    report.transform =
                        Some(TransformEngine::new(warehouse).run_plan(&self.plan)?)
                }
            }
            report.stages.push(*stage);
        }
        report.elapsed = start.elapsed();
        info!(stages = report.stages.len(), elapsed = ?report.elapsed, "run complete");
        Ok(report)
    }
}

/// Open the configured warehouse and run `stages` against it. A script backend writes
/// its recorded statements to the configured output once every stage has rendered.
pub fn open_and_run(config: &EtlConfig, stages: &[Stage]) -> Result<RunReport> {
    config.validate()?;
    let pipeline = Pipeline::new(config);
    match &config.warehouse {
        WarehouseConfig::DuckDb { path } => {
            let warehouse = DuckDbWarehouse::new(path)
                .with_context(|| format!("opening duckdb warehouse `{path}`"))?;
            pipeline
                .run_stages(&warehouse, stages)
                .context("ETL run against duckdb failed")
        }
        WarehouseConfig::Script { dialect, output } => {
            let warehouse = ScriptWarehouse::new(*dialect);
            let report = pipeline
                .run_stages(&warehouse, stages)
                .with_context(|| format!("rendering {dialect} script failed"))?;
            warehouse.write_to(output)?;
            info!(
                output = %output.display(),
                statements = warehouse.statements().len(),
                "script written"
            );
            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::error::ErrorKind;
    use crate::model::{SongPlay, User};
    use crate::schema::Table;
    use crate::sql::Dialect;
    use crate::testing::{self, catalog_song, init_test_logging, next_song_event};
    use crate::transform::Derivation;
    use std::fs;
    use tempfile::tempdir;

    fn duckdb_config(sources: SourceConfig, path: &str) -> EtlConfig {
        EtlConfig {
            warehouse: WarehouseConfig::DuckDb { path: path.into() },
            sources,
        }
    }

    #[test]
    fn full_run_against_duckdb() {
        init_test_logging();
        let tmp = tempdir().unwrap();
        let sources = testing::write_sources(
            tmp.path(),
            &[next_song_event("10", 1541105830796)],
            &[catalog_song("SOXXX", "ARXXX", 2008)],
        );
        let wh = DuckDbWarehouse::in_memory().unwrap();
        let pipeline = Pipeline::new(&duckdb_config(sources, ":memory:"));

        let report = pipeline.run(&wh).unwrap();
        assert_eq!(report.stages, Stage::ALL.to_vec());
        assert_eq!(report.load, Some(LoadReport { events: 1, songs: 1 }));
        let transform = report.transform.unwrap();
        assert_eq!(transform.rows_for(Derivation::SongPlays), Some(1));

        let plays: Vec<SongPlay> = wh.fetch_all().unwrap();
        assert_eq!(plays[0].song_id, "SOXXX");
        let users: Vec<User> = wh.fetch_all().unwrap();
        assert_eq!(users[0].user_id, "10");
    }

    #[test]
    fn rerun_starts_from_empty_tables() {
        let tmp = tempdir().unwrap();
        let sources = testing::write_sources(
            tmp.path(),
            &[next_song_event("10", 1541105830796)],
            &[catalog_song("SOXXX", "ARXXX", 2008)],
        );
        let wh = DuckDbWarehouse::in_memory().unwrap();
        let pipeline = Pipeline::new(&duckdb_config(sources, ":memory:"));
        pipeline.run(&wh).unwrap();
        pipeline.run(&wh).unwrap();
        assert_eq!(wh.count_rows(Table::SongPlay).unwrap(), 1);
        assert_eq!(wh.count_rows(Table::StagingEvents).unwrap(), 1);
    }

    #[test]
    fn load_failure_stops_before_transform() {
        let tmp = tempdir().unwrap();
        let mut sources = testing::write_sources(
            tmp.path(),
            &[next_song_event("10", 1541105830796)],
            &[catalog_song("SOXXX", "ARXXX", 2008)],
        );
        sources.songs_source_uri = tmp.path().join("gone").to_string_lossy().into_owned();
        let wh = DuckDbWarehouse::in_memory().unwrap();

        let err = Pipeline::new(&duckdb_config(sources, ":memory:"))
            .run(&wh)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert_eq!(wh.count_rows(Table::SongPlay).unwrap(), 0);
    }

    #[test]
    fn open_and_run_persists_duckdb_file() {
        let tmp = tempdir().unwrap();
        let sources = testing::write_sources(
            tmp.path(),
            &[next_song_event("10", 1541105830796)],
            &[catalog_song("SOXXX", "ARXXX", 2008)],
        );
        let db = tmp.path().join("sparkify.duckdb");
        let config = duckdb_config(sources, &db.to_string_lossy());

        open_and_run(&config, &Stage::ALL).unwrap();
        let wh = DuckDbWarehouse::open(&db).unwrap();
        assert_eq!(wh.count_rows(Table::Time).unwrap(), 1);
    }

    #[test]
    fn redshift_script_is_written() {
        let tmp = tempdir().unwrap();
        let output = tmp.path().join("out").join("etl.sql");
        let config = EtlConfig {
            warehouse: WarehouseConfig::Script {
                dialect: Dialect::Redshift,
                output: output.clone(),
            },
            sources: SourceConfig {
                events_source_uri: "s3://udacity-dend/log_data".into(),
                events_field_path_spec: "s3://udacity-dend/log_json_path.json".into(),
                songs_source_uri: "s3://udacity-dend/song_data".into(),
                credential_reference: Some("arn:aws:iam::123456789012:role/dwhRole".into()),
            },
        };

        let report = open_and_run(&config, &Stage::ALL).unwrap();
        assert_eq!(report.load, Some(LoadReport::default()));

        let script = fs::read_to_string(&output).unwrap();
        assert!(script.starts_with("-- sparkify-dwh script (redshift)"));
        assert!(script.contains("DROP TABLE IF EXISTS staging_events;"));
        assert!(script.contains("IAM_ROLE 'arn:aws:iam::123456789012:role/dwhRole'"));
        assert!(script.contains("FORMAT AS JSON 'auto';"));
        let create = script.find("CREATE TABLE start_time").unwrap();
        let copy = script.find("COPY staging_events").unwrap();
        let time = script.find("INSERT INTO start_time").unwrap();
        assert!(create < copy && copy < time);
    }

    #[test]
    fn duckdb_script_with_remote_field_paths_is_a_config_error() {
        let tmp = tempdir().unwrap();
        let output = tmp.path().join("etl.sql");
        let mut sources = testing::write_sources(
            tmp.path(),
            &[next_song_event("10", 1541105830796)],
            &[catalog_song("SOXXX", "ARXXX", 2008)],
        );
        let script = |sources: SourceConfig| EtlConfig {
            warehouse: WarehouseConfig::Script {
                dialect: Dialect::DuckDb,
                output: output.clone(),
            },
            sources,
        };

        open_and_run(&script(sources.clone()), &Stage::ALL).unwrap();
        let rendered = fs::read_to_string(&output).unwrap();
        assert!(rendered.contains("read_ndjson_objects"));
        fs::remove_file(&output).unwrap();

        sources.events_field_path_spec = "s3://udacity-dend/log_json_path.json".into();
        let err = open_and_run(&script(sources), &Stage::ALL).unwrap_err();
        let etl = err.downcast_ref::<EtlError>().unwrap();
        assert_eq!(etl.kind(), ErrorKind::Config);
        assert!(!output.exists());
    }

    #[test]
    fn invalid_config_fails_before_opening_warehouse() {
        let tmp = tempdir().unwrap();
        let db = tmp.path().join("never.duckdb");
        let mut sources = testing::write_sources(tmp.path(), &[], &[]);
        sources.events_source_uri = " ".into();

        let err = open_and_run(&duckdb_config(sources, &db.to_string_lossy()), &Stage::ALL)
            .unwrap_err();
        let etl = err.downcast_ref::<EtlError>().unwrap();
        assert_eq!(etl.kind(), ErrorKind::Config);
        assert!(!db.exists());
    }
}
