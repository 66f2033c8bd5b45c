// src/warehouse/script.rs

use anyhow::{Context, Result};
use std::{
    cell::RefCell,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use super::Warehouse;
use crate::error::WarehouseError;
use crate::sql::Dialect;

/// Records statements instead of executing them, so a run can be replayed later by an
/// external client (e.g. `psql` against a Redshift cluster).
#[derive(Debug)]
pub struct ScriptWarehouse {
    dialect: Dialect,
    statements: RefCell<Vec<String>>,
}

impl ScriptWarehouse {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            statements: RefCell::new(Vec::new()),
        }
    }

    /// Statements recorded so far, in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// The recorded statements as one `;`-terminated script.
    pub fn script(&self) -> String {
        let mut out = format!("-- sparkify-dwh script ({})\n", self.dialect);
        for stmt in self.statements.borrow().iter() {
            out.push('\n');
            out.push_str(stmt.trim_end());
            out.push_str(";\n");
        }
        out
    }

    /// Write the script to `path`, going through a `.tmp` file so readers never see a
    /// half-written script.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let tmp_path = path.with_extension("sql.tmp");
        let file = File::create(&tmp_path)
            .with_context(|| format!("could not create `{}`", tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.script().as_bytes())
            .context("writing script")?;
        writer.flush().context("flushing script")?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "failed to rename `{}` to `{}`",
                tmp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }
}

impl Warehouse for ScriptWarehouse {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn execute(&self, statement: &str) -> Result<usize, WarehouseError> {
        self.statements.borrow_mut().push(statement.to_string());
        Ok(0)
    }

    fn query_text(&self, query: &str) -> Result<Vec<String>, WarehouseError> {
        Err(WarehouseError::unsupported("script warehouse", query))
    }
}
