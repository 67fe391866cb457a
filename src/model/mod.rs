//! Entities consumed by mappers.
//!
//! A mapper never looks inside an entity beyond the [`Entity`] trait: it
//! reads all property values (for `INSERT`), the modified subset (for
//! `UPDATE`), asks whether a property is declared (for `HAVING` routing of
//! entity-only properties) and writes values back when hydrating rows or
//! back-filling a generated id.
//!
//! [`Record`] is a ready-made property-bag entity.

pub mod record;

pub use record::{Record, RecordBuilder};

use crate::mapper::error::MapperError;
use sea_query::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A mutable, dirty-tracking entity
///
/// Implementors are cloned from a prototype for every row a mapper
/// returns, so cloning should be cheap.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Whether the entity declares `name`
    fn has_property(&self, name: &str) -> bool;

    /// Current value of a declared property
    fn get(&self, name: &str) -> Option<Value>;

    /// Assign a declared property, marking it modified
    ///
    /// # Errors
    ///
    /// Returns `MapperError::InvalidArgument` when `name` is not declared.
    fn set(&mut self, name: &str, value: Value) -> Result<(), MapperError>;

    /// Value as last loaded or saved, ignoring pending modifications
    ///
    /// Entities without dirty tracking may keep the default, which reports
    /// the current value.
    fn stored(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    /// Every declared property with its current value, in declaration order
    fn values(&self) -> Vec<(String, Value)>;

    /// Properties assigned since the entity was last marked clean
    fn modified_values(&self) -> Vec<(String, Value)>;

    /// Check the entity before it is written
    ///
    /// # Errors
    ///
    /// Returns the per-property validation messages.
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }

    /// Forget pending modifications; current values become the baseline
    fn mark_clean(&mut self);

    /// Load values fetched from the database and mark the entity clean
    ///
    /// # Errors
    ///
    /// Propagates the first `set` failure.
    fn hydrate(&mut self, values: Vec<(String, Value)>) -> Result<(), MapperError> {
        for (name, value) in values {
            self.set(&name, value)?;
        }
        self.mark_clean();
        Ok(())
    }
}

/// Validation messages keyed by property name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `property`
    pub fn add(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(property.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Messages recorded for one property
    pub fn get(&self, property: &str) -> Option<&[String]> {
        self.errors.get(property).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `Ok(())` when nothing was recorded
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one message was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (property, messages) in &self.errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", property, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
