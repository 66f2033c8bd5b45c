// src/sql/mod.rs

pub mod builder;
pub mod dialect;

pub use builder::{extract, row_number_over, InsertSelect, Select};
pub use dialect::{Dialect, UnknownDialect};

/// Render `value` as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_literal_doubles_single_quotes() {
        assert_eq!(quote_literal("Nothin' On You"), "'Nothin'' On You'");
        assert_eq!(quote_literal(""), "''");
    }
}
