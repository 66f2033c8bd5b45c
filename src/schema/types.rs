// src/schema/types.rs

use crate::sql::Dialect;

/// Warehouse column types used by the seven tables.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum ColumnType {
    Varchar(u16),
    Integer,
    BigInt,
    Decimal(u8, u8),
    Timestamp,
    /// Auto-numbered surrogate key; rendered per dialect.
    Identity,
}

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum Constraint {
    Nullable,
    NotNull,
    PrimaryKey,
}

/// A single column definition.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub constraint: Constraint,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            constraint: Constraint::Nullable,
        }
    }

    pub const fn not_null(self) -> Self {
        Self {
            constraint: Constraint::NotNull,
            ..self
        }
    }

    pub const fn primary_key(self) -> Self {
        Self {
            constraint: Constraint::PrimaryKey,
            ..self
        }
    }

    /// SQL type name without the identity special-case.
    pub fn sql_type(&self) -> String {
        match self.ty {
            ColumnType::Varchar(n) => format!("VARCHAR({n})"),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::BigInt => "BIGINT".into(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::Timestamp => "TIMESTAMP".into(),
            ColumnType::Identity => "BIGINT".into(),
        }
    }

    fn render(&self, table: &str, dialect: Dialect) -> String {
        let ty = match self.ty {
            ColumnType::Identity => dialect.identity_type(table, self.name),
            _ => self.sql_type(),
        };
        match self.constraint {
            Constraint::Nullable => format!("{} {}", self.name, ty),
            Constraint::NotNull => format!("{} {} NOT NULL", self.name, ty),
            Constraint::PrimaryKey => format!("{} {} PRIMARY KEY", self.name, ty),
        }
    }
}

/// Fixed definition of one warehouse table.
#[derive(Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableDef {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Columns an insert has to supply (everything but the identity key).
    pub fn insert_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter(|c| c.ty != ColumnType::Identity)
            .map(|c| c.name)
    }

    fn identity_sequences(&self, dialect: Dialect) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.ty == ColumnType::Identity)
            .filter_map(|c| dialect.identity_sequence(self.name, c.name))
            .collect()
    }

    /// `DROP TABLE IF EXISTS`, followed by any sequence the table owned.
    pub fn render_drop(&self, dialect: Dialect) -> Vec<String> {
        let mut stmts = vec![format!("DROP TABLE IF EXISTS {}", self.name)];
        stmts.extend(
            self.identity_sequences(dialect)
                .into_iter()
                .map(|seq| format!("DROP SEQUENCE IF EXISTS {seq}")),
        );
        stmts
    }

    /// Any sequence the table needs, followed by `CREATE TABLE`.
    pub fn render_create(&self, dialect: Dialect) -> Vec<String> {
        let mut stmts: Vec<String> = self
            .identity_sequences(dialect)
            .into_iter()
            .map(|seq| format!("CREATE SEQUENCE {seq} START 1"))
            .collect();
        let cols = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(self.name, dialect)))
            .collect::<Vec<_>>()
            .join(",\n");
        stmts.push(format!("CREATE TABLE {} (\n{}\n)", self.name, cols));
        stmts
    }
}
