// src/transform/mod.rs

pub mod derivation;
pub mod plan;

pub use derivation::Derivation;
pub use plan::TransformPlan;

use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::error::EtlError;
use crate::warehouse::Warehouse;

/// Rows inserted by each derivation that completed, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub rows: Vec<(Derivation, u64)>,
}

impl TransformReport {
    pub fn rows_for(&self, derivation: Derivation) -> Option<u64> {
        self.rows
            .iter()
            .find(|(d, _)| *d == derivation)
            .map(|(_, n)| *n)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

/// Fills the fact and dimension tables from staging.
pub struct TransformEngine<'w> {
    warehouse: &'w dyn Warehouse,
}

impl<'w> TransformEngine<'w> {
    pub fn new(warehouse: &'w dyn Warehouse) -> Self {
        Self { warehouse }
    }

    pub fn derive_song_plays(&self) -> Result<u64, EtlError> {
        self.run(Derivation::SongPlays)
    }

    pub fn derive_users(&self) -> Result<u64, EtlError> {
        self.run(Derivation::Users)
    }

    pub fn derive_songs(&self) -> Result<u64, EtlError> {
        self.run(Derivation::Songs)
    }

    pub fn derive_artists(&self) -> Result<u64, EtlError> {
        self.run(Derivation::Artists)
    }

    /// Needs `songplay` to be filled already.
    pub fn derive_time(&self) -> Result<u64, EtlError> {
        self.run(Derivation::Time)
    }

    #[instrument(level = "debug", skip(self), fields(table = derivation.target().name()))]
    pub fn run(&self, derivation: Derivation) -> Result<u64, EtlError> {
        let start = Instant::now();
        let sql = derivation.statement(self.warehouse.dialect());
        debug!(%sql, "derive");
        let rows = self
            .warehouse
            .execute(&sql)
            .map_err(|source| EtlError::Transform {
                derivation: derivation.name(),
                source,
            })?;
        info!(
            derivation = derivation.name(),
            rows,
            elapsed = ?start.elapsed(),
            "derived"
        );
        Ok(rows as u64)
    }

    /// Run `plan` in dependency order, stopping at the first failure. An invalid plan
    /// fails before any statement runs.
    #[instrument(level = "info", skip_all, fields(dialect = %self.warehouse.dialect()))]
    pub fn run_plan(&self, plan: &TransformPlan) -> Result<TransformReport, EtlError> {
        let order = plan.order()?;
        let start = Instant::now();
        let mut report = TransformReport::default();
        for derivation in order {
            let rows = self.run(derivation)?;
            report.rows.push((derivation, rows));
        }
        info!(
            derivations = report.rows.len(),
            rows = report.total(),
            elapsed = ?start.elapsed(),
            "transform complete"
        );
        Ok(report)
    }

    pub fn run_all(&self) -> Result<TransformReport, EtlError> {
        self.run_plan(&TransformPlan::default())
    }
}
