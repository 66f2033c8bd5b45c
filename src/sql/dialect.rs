// src/sql/dialect.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// SQL dialects the pipeline can render statements for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Amazon Redshift, the production warehouse. Bulk loads use `COPY ... FROM 's3://'`.
    Redshift,
    /// DuckDB, used in-process for local runs and tests.
    #[serde(alias = "duck")]
    DuckDb,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Redshift => "redshift",
            Dialect::DuckDb => "duckdb",
        }
    }

    /// Expression turning an epoch-milliseconds integer into a `TIMESTAMP`, keeping the
    /// millisecond part.
    pub fn epoch_millis_to_timestamp(&self, expr: &str) -> String {
        match self {
            Dialect::Redshift => {
                format!("TIMESTAMP 'epoch' + {expr} / 1000.0 * INTERVAL '1 second'")
            }
            Dialect::DuckDb => format!("epoch_ms({expr})"),
        }
    }

    /// Name of the sequence backing an identity column, when the dialect needs one.
    pub fn identity_sequence(&self, table: &str, column: &str) -> Option<String> {
        match self {
            Dialect::Redshift => None,
            Dialect::DuckDb => Some(format!("{table}_{column}_seq")),
        }
    }

    /// Column type for an auto-numbered surrogate key.
    pub fn identity_type(&self, table: &str, column: &str) -> String {
        match self.identity_sequence(table, column) {
            Some(seq) => format!("BIGINT DEFAULT nextval('{seq}')"),
            None => "INTEGER IDENTITY(0,1)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dialect `{0}` (expected redshift or duckdb)")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redshift" => Ok(Dialect::Redshift),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            _ => Err(UnknownDialect(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
