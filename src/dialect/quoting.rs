//! Identifier quoting strategies.

use std::fmt;

/// Quotes a single identifier (table, column or alias name)
pub trait IdentifierQuoter: Send + Sync + fmt::Debug {
    /// Quote one identifier part, escaping embedded quote characters
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Quote a possibly qualified name (`schema.table.column`) part by part
    ///
    /// `*` is never quoted.
    fn quote_path(&self, path: &str) -> String {
        path.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Leaves identifiers untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl IdentifierQuoter for Passthrough {
    fn quote_identifier(&self, identifier: &str) -> String {
        identifier.to_string()
    }
}

/// `` `name` `` (MySQL, MariaDB)
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktickQuoter;

impl IdentifierQuoter for BacktickQuoter {
    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }
}

/// `"name"` (Postgres, Oracle, SQLite)
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleQuoteQuoter;

impl IdentifierQuoter for DoubleQuoteQuoter {
    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }
}

/// `[name]` (SQL Server)
#[derive(Debug, Clone, Copy, Default)]
pub struct BracketQuoter;

impl IdentifierQuoter for BracketQuoter {
    fn quote_identifier(&self, identifier: &str) -> String {
        format!("[{}]", identifier.replace(']', "]]"))
    }
}
