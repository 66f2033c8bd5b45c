// src/config/mod.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::error::EtlError;
use crate::load::SourceLocation;
use crate::sql::Dialect;

/// Env var naming the config file when no path is given on the command line.
pub const CONFIG_PATH_VAR: &str = "SPARKIFY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "dwh.yaml";

/// Where the raw data lives and how the warehouse may read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listening-log objects (`s3://bucket/log_data`, a local directory, or a glob).
    pub events_source_uri: String,
    /// JSONPaths document mapping log keys onto `staging_events` columns.
    pub events_field_path_spec: String,
    /// Song-catalog objects.
    pub songs_source_uri: String,
    /// Redshift: the IAM role ARN used by `COPY`. DuckDB: the credential chain used for
    /// S3 sources. Local sources need none.
    #[serde(default)]
    pub credential_reference: Option<String>,
}

/// Which warehouse a run talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum WarehouseConfig {
    /// Execute against a DuckDB database file (or `:memory:`).
    DuckDb {
        #[serde(default = "default_duckdb_path")]
        path: String,
    },
    /// Render statements for `dialect` into a script at `output` instead of executing.
    Script { dialect: Dialect, output: PathBuf },
}

fn default_duckdb_path() -> String {
    "sparkify.duckdb".to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        WarehouseConfig::DuckDb {
            path: default_duckdb_path(),
        }
    }
}

impl WarehouseConfig {
    pub fn dialect(&self) -> Dialect {
        match self {
            WarehouseConfig::DuckDb { .. } => Dialect::DuckDb,
            WarehouseConfig::Script { dialect, .. } => *dialect,
        }
    }
}

/// Everything a run needs, built once by the binary and handed to each component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    pub sources: SourceConfig,
}

/// Source options that can be overridden from the environment.
const SOURCE_OVERRIDES: [&str; 4] = [
    "SPARKIFY_EVENTS_SOURCE_URI",
    "SPARKIFY_EVENTS_FIELD_PATH_SPEC",
    "SPARKIFY_SONGS_SOURCE_URI",
    "SPARKIFY_CREDENTIAL_REFERENCE",
];

impl EtlConfig {
    /// Resolve the config path: explicit argument, then `SPARKIFY_CONFIG`, then `dwh.yaml`.
    pub fn resolve_path(arg: Option<String>) -> PathBuf {
        arg.or_else(|| std::env::var(CONFIG_PATH_VAR).ok())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Read a YAML config file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::read(path)?;
        config.validate()?;
        info!(
            path = %path.display(),
            dialect = %config.warehouse.dialect(),
            "loaded config"
        );
        Ok(config)
    }

    /// Like [`EtlConfig::load`] but leaves validation to the caller, for binaries that
    /// swap the warehouse before checking.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::from_yaml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid YAML config")
    }

    /// Replace source options with any value `lookup` returns for the matching
    /// `SPARKIFY_*` variable.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let [events, spec, songs, credential] = SOURCE_OVERRIDES;
        let s = &mut self.sources;
        if let Some(v) = lookup(events) {
            s.events_source_uri = v;
        }
        if let Some(v) = lookup(spec) {
            s.events_field_path_spec = v;
        }
        if let Some(v) = lookup(songs) {
            s.songs_source_uri = v;
        }
        if let Some(v) = lookup(credential) {
            s.credential_reference = Some(v);
        }
    }

    /// Reject configs that cannot possibly run, before touching the warehouse.
    pub fn validate(&self) -> Result<(), EtlError> {
        match &self.warehouse {
            WarehouseConfig::DuckDb { .. } => self.validate_sources(Dialect::DuckDb),
            WarehouseConfig::Script { dialect, .. } => self.validate_script(*dialect),
        }
    }

    /// Checks for rendering a `dialect` script from these sources with no live warehouse.
    /// A duckdb script inlines the JSONPaths mapping, so the document must be readable
    /// from disk at render time.
    pub fn validate_script(&self, dialect: Dialect) -> Result<(), EtlError> {
        self.validate_sources(dialect)?;
        let spec = &self.sources.events_field_path_spec;
        if dialect == Dialect::DuckDb && SourceLocation::parse(spec).is_remote() {
            return Err(EtlError::Config(format!(
                "a duckdb script cannot fetch the JSONPaths document `{spec}` while rendering; \
                 point `events_field_path_spec` at a local copy or use the duckdb backend"
            )));
        }
        Ok(())
    }

    fn validate_sources(&self, dialect: Dialect) -> Result<(), EtlError> {
        let s = &self.sources;
        for (name, value) in [
            ("events_source_uri", &s.events_source_uri),
            ("events_field_path_spec", &s.events_field_path_spec),
            ("songs_source_uri", &s.songs_source_uri),
        ] {
            if value.trim().is_empty() {
                return Err(EtlError::Config(format!("`{name}` must not be empty")));
            }
        }

        if dialect == Dialect::Redshift {
            let has_credential = s
                .credential_reference
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty());
            if !has_credential {
                return Err(EtlError::Config(
                    "`credential_reference` (an IAM role ARN) is required for redshift".into(),
                ));
            }
            for (name, value) in [
                ("events_source_uri", &s.events_source_uri),
                ("events_field_path_spec", &s.events_field_path_spec),
                ("songs_source_uri", &s.songs_source_uri),
            ] {
                if !value.trim().starts_with("s3://") {
                    return Err(EtlError::Config(format!(
                        "redshift COPY reads from S3; `{name}` is `{value}`"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const REDSHIFT_YAML: &str = r#"
warehouse:
  backend: script
  dialect: redshift
  output: out/etl.sql
sources:
  events_source_uri: s3://udacity-dend/log_data
  events_field_path_spec: s3://udacity-dend/log_json_path.json
  songs_source_uri: s3://udacity-dend/song_data
  credential_reference: arn:aws:iam::123456789012:role/dwhRole
"#;

    #[test]
    fn parses_script_backend() {
        let cfg = EtlConfig::from_yaml(REDSHIFT_YAML).unwrap();
        assert_eq!(cfg.warehouse.dialect(), Dialect::Redshift);
        assert_eq!(
            cfg.warehouse,
            WarehouseConfig::Script {
                dialect: Dialect::Redshift,
                output: PathBuf::from("out/etl.sql")
            }
        );
        cfg.validate().unwrap();
    }

    #[test]
    fn warehouse_defaults_to_duckdb_file() {
        let cfg = EtlConfig::from_yaml(
            "sources:\n  events_source_uri: data/log_data\n  \
             events_field_path_spec: data/log_json_path.json\n  \
             songs_source_uri: data/song_data\n",
        )
        .unwrap();
        assert_eq!(cfg.warehouse, WarehouseConfig::default());
        assert_eq!(cfg.sources.credential_reference, None);
        cfg.validate().unwrap();
    }

    #[test]
    fn env_overrides_replace_sources() {
        let mut cfg = EtlConfig::from_yaml(REDSHIFT_YAML).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("SPARKIFY_SONGS_SOURCE_URI", "s3://other/song_data"),
            ("SPARKIFY_CREDENTIAL_REFERENCE", "arn:aws:iam::1:role/other"),
        ]);
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.sources.songs_source_uri, "s3://other/song_data");
        assert_eq!(
            cfg.sources.credential_reference.as_deref(),
            Some("arn:aws:iam::1:role/other")
        );
        assert_eq!(cfg.sources.events_source_uri, "s3://udacity-dend/log_data");
    }

    #[test]
    fn redshift_requires_credential_and_s3() {
        let mut cfg = EtlConfig::from_yaml(REDSHIFT_YAML).unwrap();
        cfg.sources.credential_reference = Some("  ".into());
        assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::Config);

        let mut cfg = EtlConfig::from_yaml(REDSHIFT_YAML).unwrap();
        cfg.sources.songs_source_uri = "data/song_data".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("songs_source_uri"));
    }

    #[test]
    fn empty_source_is_rejected() {
        let mut cfg = EtlConfig::from_yaml(REDSHIFT_YAML).unwrap();
        cfg.sources.events_field_path_spec = String::new();
        assert!(matches!(cfg.validate(), Err(EtlError::Config(_))));
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("dwh.yaml");
        fs::write(&path, REDSHIFT_YAML).unwrap();
        let cfg = EtlConfig::load(&path).unwrap();
        assert!(!cfg.sources.songs_source_uri.is_empty());
        assert!(EtlConfig::load(&tmp.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn duckdb_script_needs_a_local_field_path_spec() {
        let mut cfg = EtlConfig::from_yaml(REDSHIFT_YAML).unwrap();
        cfg.warehouse = WarehouseConfig::Script {
            dialect: Dialect::DuckDb,
            output: PathBuf::from("out/etl.sql"),
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("s3://udacity-dend/log_json_path.json"));

        cfg.validate_script(Dialect::Redshift).unwrap();
        cfg.sources.events_field_path_spec = "data/log_json_path.json".into();
        cfg.validate_script(Dialect::DuckDb).unwrap();

        // A live duckdb warehouse reads the remote document itself.
        cfg.sources.events_field_path_spec = "s3://udacity-dend/log_json_path.json".into();
        cfg.warehouse = WarehouseConfig::default();
        cfg.validate().unwrap();
    }

    #[test]
    fn read_leaves_validation_to_the_caller() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("dwh.yaml");
        fs::write(&path, REDSHIFT_YAML.replace("  credential_reference:", "  unused:")).unwrap();

        let cfg = EtlConfig::read(&path).unwrap();
        assert_eq!(cfg.sources.credential_reference, None);
        let err = cfg.validate_script(Dialect::Redshift).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(cfg.validate_script(Dialect::DuckDb).is_err());
        assert!(EtlConfig::load(&path).is_err());
    }

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            EtlConfig::resolve_path(Some("custom.yaml".into())),
            PathBuf::from("custom.yaml")
        );
    }
}
