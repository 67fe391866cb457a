//! Join clauses appended to a mapper's base `SELECT`.

use crate::mapper::error::MapperError;
use std::fmt;
use std::str::FromStr;

/// Type of join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    /// SQL keyword sequence introducing the join
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

impl FromStr for JoinType {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INNER" => Ok(JoinType::Inner),
            "LEFT" => Ok(JoinType::Left),
            "RIGHT" => Ok(JoinType::Right),
            "FULL" => Ok(JoinType::Full),
            "CROSS" => Ok(JoinType::Cross),
            _ => Err(MapperError::Construction(format!(
                "invalid join type '{}' (expected INNER, LEFT, RIGHT, FULL or CROSS)",
                s
            ))),
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_keyword())
    }
}

/// A validated join clause
///
/// The `on` condition is raw SQL and is emitted verbatim. `CROSS` joins
/// carry a condition like every other join but do not render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    join_type: JoinType,
    table: String,
    on: String,
    alias: Option<String>,
}

impl Join {
    /// # Errors
    ///
    /// Returns `MapperError::Construction` when `table` or `on` is empty.
    pub fn new(
        join_type: JoinType,
        table: impl Into<String>,
        on: impl Into<String>,
    ) -> Result<Self, MapperError> {
        let table = table.into();
        let on = on.into();
        if table.trim().is_empty() {
            return Err(MapperError::Construction("join table cannot be empty".to_string()));
        }
        if on.trim().is_empty() {
            return Err(MapperError::Construction(format!(
                "join on '{}' requires a condition",
                table
            )));
        }
        Ok(Self {
            join_type,
            table,
            on,
            alias: None,
        })
    }

    /// Build from a textual join type
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Construction` for an unknown type or empty table/condition.
    pub fn parse(join_type: &str, table: impl Into<String>, on: impl Into<String>) -> Result<Self, MapperError> {
        Self::new(join_type.parse::<JoinType>()?, table, on)
    }

    /// Builder-style alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(Some(alias.into()));
        self
    }

    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias.filter(|a| !a.trim().is_empty());
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn on(&self) -> &str {
        &self.on
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}
