//! Ordering directives.

use crate::mapper::error::MapperError;
use std::fmt;
use std::str::FromStr;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(MapperError::Construction(format!(
                "invalid sort direction '{}' (expected ASC or DESC)",
                s
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A validated `ORDER BY` directive for one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    property: String,
    direction: Direction,
}

impl Sort {
    /// # Errors
    ///
    /// Returns `MapperError::Construction` for an empty property name.
    pub fn new(property: impl Into<String>, direction: Direction) -> Result<Self, MapperError> {
        let property = property.into();
        if property.trim().is_empty() {
            return Err(MapperError::Construction(
                "sort property cannot be empty".to_string(),
            ));
        }
        Ok(Self { property, direction })
    }

    /// Build from a textual direction; `"asc"`, `" Desc "` etc. are normalized
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Construction` for anything other than ASC/DESC.
    pub fn parse(property: impl Into<String>, direction: &str) -> Result<Self, MapperError> {
        let direction = direction.parse::<Direction>()?;
        Self::new(property, direction)
    }

    pub fn asc(property: impl Into<String>) -> Result<Self, MapperError> {
        Self::new(property, Direction::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Result<Self, MapperError> {
        Self::new(property, Direction::Desc)
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
