// src/error.rs

use thiserror::Error;

/// Statements quoted in errors are cut to this many characters.
const STATEMENT_PREVIEW_CHARS: usize = 200;

/// Failure reported by a warehouse backend.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("could not open warehouse: {0}")]
    Connection(String),

    #[error("{message}: {statement}")]
    Execution { statement: String, message: String },

    #[error("{backend} cannot run: {statement}")]
    Unsupported {
        backend: &'static str,
        statement: String,
    },
}

impl WarehouseError {
    /// Build an `Execution` error, truncating the statement text for readability.
    pub fn execution(statement: &str, message: impl Into<String>) -> Self {
        WarehouseError::Execution {
            statement: preview(statement),
            message: message.into(),
        }
    }

    pub fn unsupported(backend: &'static str, statement: &str) -> Self {
        WarehouseError::Unsupported {
            backend,
            statement: preview(statement),
        }
    }
}

fn preview(statement: &str) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(STATEMENT_PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &flat[..end]),
        None => flat,
    }
}

/// Coarse classification of an [`EtlError`], one per pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Schema,
    Load,
    Transform,
}

/// Every failure a run can end with. All of them are fatal: nothing is retried and the
/// recovery path is a schema reset followed by a full re-run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("DDL failed for table `{table}`")]
    Schema {
        table: &'static str,
        #[source]
        source: WarehouseError,
    },

    #[error("bulk load into `{table}` failed")]
    Load {
        table: &'static str,
        #[source]
        source: WarehouseError,
    },

    #[error("source for `{table}` is unreachable: nothing matches `{location}`")]
    SourceUnreachable {
        table: &'static str,
        location: String,
    },

    #[error("field path spec `{location}` is unusable: {reason}")]
    FieldPathSpec { location: String, reason: String },

    #[error("derivation `{derivation}` failed")]
    Transform {
        derivation: &'static str,
        #[source]
        source: WarehouseError,
    },

    #[error("invalid transform plan: {0}")]
    Plan(String),
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Config(_) => ErrorKind::Config,
            EtlError::Schema { .. } => ErrorKind::Schema,
            EtlError::Load { .. }
            | EtlError::SourceUnreachable { .. }
            | EtlError::FieldPathSpec { .. } => ErrorKind::Load,
            EtlError::Transform { .. } | EtlError::Plan(_) => ErrorKind::Transform,
        }
    }
}
