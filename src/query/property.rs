//! Column mapping for a single entity attribute.
//!
//! A `Property` couples a column expression with its storage type and two
//! derived flags: whether the column is a SQL aggregate (and therefore has to
//! be filtered through `HAVING`) and whether it may be written by
//! `INSERT`/`UPDATE`.

use crate::mapper::error::MapperError;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static AGGREGATE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(COUNT|SUM|AVG|MIN|MAX)\(").expect("aggregate prefix pattern is valid")
});

/// Storage type of a mapped column
///
/// The set is closed: parsing any other name fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Date,
    Time,
    Text,
    Binary,
}

impl PropertyType {
    /// Canonical lower-case name
    pub const fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Float => "float",
            PropertyType::Boolean => "boolean",
            PropertyType::DateTime => "datetime",
            PropertyType::Date => "date",
            PropertyType::Time => "time",
            PropertyType::Text => "text",
            PropertyType::Binary => "binary",
        }
    }

    /// `true` for `datetime`, `date` and `time`
    ///
    /// Values of temporal properties are routed through the dialect's
    /// temporal formatter before they are bound.
    pub const fn is_temporal(&self) -> bool {
        matches!(self, PropertyType::DateTime | PropertyType::Date | PropertyType::Time)
    }
}

impl FromStr for PropertyType {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(PropertyType::String),
            "integer" => Ok(PropertyType::Integer),
            "float" => Ok(PropertyType::Float),
            "boolean" => Ok(PropertyType::Boolean),
            "datetime" => Ok(PropertyType::DateTime),
            "date" => Ok(PropertyType::Date),
            "time" => Ok(PropertyType::Time),
            "text" => Ok(PropertyType::Text),
            "binary" => Ok(PropertyType::Binary),
            other => Err(MapperError::Construction(format!(
                "unsupported property type '{}' (expected one of string, integer, float, boolean, datetime, date, time, text, binary)",
                other
            ))),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column mapping for one entity attribute
///
/// # Example
///
/// ```
/// use dbmapper::{Property, PropertyType};
///
/// let name = Property::new("name", PropertyType::String).unwrap();
/// assert!(name.is_writeable());
///
/// let orders = Property::new("COUNT(orders.id)", PropertyType::Integer).unwrap();
/// assert!(orders.is_aggregate());
/// assert!(!orders.is_writeable());
/// ```
#[derive(Debug, Clone)]
pub struct Property {
    column: String,
    kind: PropertyType,
    aggregate: OnceCell<bool>,
    writeable: OnceCell<bool>,
}

impl Property {
    /// Create a property mapped to `column`
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Construction` if the column expression is empty.
    pub fn new(column: impl Into<String>, kind: PropertyType) -> Result<Self, MapperError> {
        let column = column.into();
        if column.trim().is_empty() {
            return Err(MapperError::Construction(
                "property column cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            column,
            kind,
            aggregate: OnceCell::new(),
            writeable: OnceCell::new(),
        })
    }

    /// Create a property from a textual type name
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Construction` for an empty column or a type
    /// outside the supported set.
    pub fn parse(column: impl Into<String>, kind: &str) -> Result<Self, MapperError> {
        let kind = kind.parse::<PropertyType>()?;
        Self::new(column, kind)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn kind(&self) -> PropertyType {
        self.kind
    }

    /// `true` when the column is a `COUNT(`, `SUM(`, `AVG(`, `MIN(` or `MAX(` expression
    pub fn is_aggregate(&self) -> bool {
        *self
            .aggregate
            .get_or_init(|| AGGREGATE_PREFIX.is_match(self.column.trim_start()))
    }

    /// `true` unless the column is an aggregate or references another table
    pub fn is_writeable(&self) -> bool {
        *self
            .writeable
            .get_or_init(|| !self.is_aggregate() && !self.column.contains('.'))
    }

    /// `true` when the column is a parenthesised sub-select
    pub fn is_subquery(&self) -> bool {
        self.column.trim_start().starts_with('(')
    }

    /// `true` when the column already names its table (`orders.id`)
    pub(crate) fn is_qualified(&self) -> bool {
        !self.is_aggregate() && !self.is_subquery() && self.column.contains('.')
    }

    /// Whether predicates on this property belong in `HAVING` rather than `WHERE`
    pub(crate) fn is_having(&self) -> bool {
        self.is_aggregate() || self.is_subquery()
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column && self.kind == other.kind
    }
}

impl Eq for Property {}
