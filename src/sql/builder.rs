// src/sql/builder.rs
//! Just enough of a query builder to express the warehouse's insert-select statements.

/// A `SELECT` statement under construction.
#[derive(Clone, Debug)]
pub struct Select {
    distinct: bool,
    projections: Vec<String>,
    from: String,
    joins: Vec<String>,
    filters: Vec<String>,
}

impl Select {
    /// Start a select over `source`, which may be a table with alias (`staging_events se`)
    /// or a rendered subquery.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            distinct: false,
            projections: Vec::new(),
            from: source.into(),
            joins: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn column(mut self, expr: impl Into<String>) -> Self {
        self.projections.push(expr.into());
        self
    }

    pub fn columns<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projections.extend(exprs.into_iter().map(Into::into));
        self
    }

    pub fn column_as(mut self, expr: impl Into<String>, alias: &str) -> Self {
        self.projections.push(format!("{} AS {}", expr.into(), alias));
        self
    }

    /// `INNER JOIN table ON l1 = r1 AND l2 = r2 ...`
    pub fn inner_join(mut self, table: &str, on: &[(&str, &str)]) -> Self {
        let cond = on
            .iter()
            .map(|(l, r)| format!("{l} = {r}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        self.joins.push(format!("INNER JOIN {table} ON {cond}"));
        self
    }

    /// Add a predicate; multiple filters are AND-ed.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filters.push(predicate.into());
        self
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Render as a parenthesized derived table named `alias`.
    pub fn subquery(&self, alias: &str) -> String {
        let inner = self.render().replace('\n', "\n    ");
        format!("(\n    {inner}\n) {alias}")
    }

    pub fn render(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.projections.join(",\n       "));
        sql.push_str("\nFROM ");
        sql.push_str(&self.from);
        for join in &self.joins {
            sql.push('\n');
            sql.push_str(join);
        }
        if !self.filters.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&self.filters.join("\n  AND "));
        }
        sql
    }
}

/// `INSERT INTO table (columns) SELECT ...`
#[derive(Clone, Debug)]
pub struct InsertSelect {
    table: String,
    columns: Vec<String>,
    select: Select,
}

impl InsertSelect {
    pub fn new<I, S>(table: &str, columns: I, select: Select) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        debug_assert_eq!(
            columns.len(),
            select.projection_count(),
            "insert into {table} lists {} columns but selects {}",
            columns.len(),
            select.projection_count()
        );
        Self {
            table: table.to_string(),
            columns,
            select,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "INSERT INTO {} ({})\n{}",
            self.table,
            self.columns.join(", "),
            self.select.render()
        )
    }
}

/// `ROW_NUMBER() OVER (PARTITION BY ... ORDER BY ...)`
pub fn row_number_over(partition_by: &str, order_by: &[&str]) -> String {
    format!(
        "ROW_NUMBER() OVER (PARTITION BY {} ORDER BY {})",
        partition_by,
        order_by.join(", ")
    )
}

/// `EXTRACT(part FROM expr)`
pub fn extract(part: &str, expr: &str) -> String {
    format!("EXTRACT({part} FROM {expr})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_join_and_filters() {
        let sql = Select::from_source("a x")
            .column("x.id")
            .column_as("y.name", "label")
            .inner_join("b y", &[("x.k1", "y.k1"), ("x.k2", "y.k2")])
            .filter("x.page = 'NextSong'")
            .filter("y.id IS NOT NULL")
            .render();
        assert_eq!(
            sql,
            "SELECT x.id,\n       y.name AS label\nFROM a x\n\
             INNER JOIN b y ON x.k1 = y.k1 AND x.k2 = y.k2\n\
             WHERE x.page = 'NextSong'\n  AND y.id IS NOT NULL"
        );
    }

    #[test]
    fn renders_insert_over_distinct_subquery() {
        let inner = Select::from_source("songplay").distinct().column("start_time");
        let outer = Select::from_source(inner.subquery("sp"))
            .column("sp.start_time")
            .column(extract("hour", "sp.start_time"));
        let sql = InsertSelect::new("start_time", ["start_time", "hour"], outer).render();
        assert!(sql.starts_with("INSERT INTO start_time (start_time, hour)\nSELECT "));
        assert!(sql.contains("EXTRACT(hour FROM sp.start_time)"));
        assert!(sql.contains("(\n    SELECT DISTINCT start_time\n    FROM songplay\n) sp"));
    }

    #[test]
    fn row_number_clause() {
        assert_eq!(
            row_number_over("ss.artist_id", &["ss.year DESC NULLS LAST", "ss.song_id"]),
            "ROW_NUMBER() OVER (PARTITION BY ss.artist_id ORDER BY ss.year DESC NULLS LAST, ss.song_id)"
        );
    }
}
