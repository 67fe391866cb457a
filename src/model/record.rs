//! Property-bag entity.
//!
//! A `Record` keeps three disjoint layers:
//!
//! - **declared**: property names and their default values, shared by every
//!   clone of a prototype
//! - **values**: the clean baseline (what was loaded or last saved)
//! - **modified**: assignments since the record was last marked clean
//!
//! Reads resolve `modified`, then `values`, then the declared default.

use super::{Entity, ValidationErrors};
use crate::mapper::error::MapperError;
use crate::query::value::is_null;
use sea_query::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Validator = Arc<dyn Fn(&Record, &mut ValidationErrors) + Send + Sync>;

struct Schema {
    declared: Vec<(String, Value)>,
    required: Vec<String>,
    validators: Vec<Validator>,
}

/// Property-bag entity with dirty tracking
///
/// # Example
///
/// ```
/// use dbmapper::{Entity, Record};
/// use sea_query::Value;
///
/// let prototype = Record::builder()
///     .property("Id", Value::Int(None))
///     .property("Name", Value::String(None))
///     .required("Name")
///     .build();
///
/// let mut widget = prototype.clone();
/// assert!(widget.validate().is_err());
///
/// widget.set("Name", Value::from("sprocket")).unwrap();
/// assert!(widget.validate().is_ok());
/// assert_eq!(widget.modified_values().len(), 1);
/// ```
#[derive(Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: HashMap<String, Value>,
    modified: HashMap<String, Value>,
}

impl Record {
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// Whether `name` has a pending modification
    pub fn is_modified(&self, name: &str) -> bool {
        self.modified.contains_key(name)
    }

    /// Whether any property has a pending modification
    pub fn is_dirty(&self) -> bool {
        !self.modified.is_empty()
    }

    /// Declared property names, in declaration order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.schema.declared.iter().map(|(n, _)| n.as_str())
    }

    fn default_of(&self, name: &str) -> Option<&Value> {
        self.schema
            .declared
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl Entity for Record {
    fn has_property(&self, name: &str) -> bool {
        self.default_of(name).is_some()
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.modified
            .get(name)
            .or_else(|| self.values.get(name))
            .or_else(|| self.default_of(name))
            .cloned()
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), MapperError> {
        if !self.has_property(name) {
            return Err(MapperError::InvalidArgument(format!(
                "record has no property '{}'",
                name
            )));
        }
        self.modified.insert(name.to_string(), value);
        Ok(())
    }

    fn stored(&self, name: &str) -> Option<Value> {
        self.values.get(name).or_else(|| self.default_of(name)).cloned()
    }

    fn values(&self) -> Vec<(String, Value)> {
        self.schema
            .declared
            .iter()
            .filter_map(|(name, _)| self.get(name).map(|v| (name.clone(), v)))
            .collect()
    }

    fn modified_values(&self) -> Vec<(String, Value)> {
        self.schema
            .declared
            .iter()
            .filter_map(|(name, _)| self.modified.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for name in &self.schema.required {
            let missing = match self.get(name) {
                None => true,
                Some(Value::String(Some(s))) => s.trim().is_empty(),
                Some(v) => is_null(&v),
            };
            if missing {
                errors.add(name.clone(), "is required");
            }
        }
        for validator in &self.schema.validators {
            validator(self, &mut errors);
        }
        errors.into_result()
    }

    fn mark_clean(&mut self) {
        self.values.extend(self.modified.drain());
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.values() {
            map.entry(&name, &value);
        }
        map.finish()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.values() == other.values()
    }
}

/// Declares the properties and validation rules of a [`Record`] prototype
#[derive(Default)]
pub struct RecordBuilder {
    declared: Vec<(String, Value)>,
    required: Vec<String>,
    validators: Vec<Validator>,
}

impl RecordBuilder {
    /// Declare a property with its default value
    ///
    /// Declaring the same name twice replaces the default.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, default: Value) -> Self {
        let name = name.into();
        match self.declared.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = default,
            None => self.declared.push((name, default)),
        }
        self
    }

    /// Fail validation when `name` is null or blank
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Add a custom validation rule
    #[must_use]
    pub fn validator<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Record, &mut ValidationErrors) + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(rule));
        self
    }

    pub fn build(self) -> Record {
        Record {
            schema: Arc::new(Schema {
                declared: self.declared,
                required: self.required,
                validators: self.validators,
            }),
            values: HashMap::new(),
            modified: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Record {
        Record::builder()
            .property("Id", Value::Int(None))
            .property("Name", Value::String(None))
            .property("Price", Value::Double(Some(0.0)))
            .required("Name")
            .validator(|r, errors| {
                if let Some(Value::Double(Some(p))) = r.get("Price") {
                    if p < 0.0 {
                        errors.add("Price", "must not be negative");
                    }
                }
            })
            .build()
    }

    #[test]
    fn test_reads_fall_back_to_defaults() {
        let w = widget();
        assert_eq!(w.get("Price"), Some(Value::Double(Some(0.0))));
        assert_eq!(w.get("Missing"), None);
        assert!(!w.is_dirty());
    }

    #[test]
    fn test_set_tracks_modifications_until_clean() {
        let mut w = widget();
        w.set("Name", Value::from("bolt")).unwrap();
        assert!(w.is_modified("Name"));
        assert_eq!(w.modified_values(), vec![("Name".to_string(), Value::from("bolt"))]);

        w.mark_clean();
        assert!(!w.is_dirty());
        assert_eq!(w.get("Name"), Some(Value::from("bolt")));
        assert!(w.modified_values().is_empty());
    }

    #[test]
    fn test_set_rejects_undeclared() {
        let mut w = widget();
        let err = w.set("Colour", Value::from("red")).unwrap_err();
        assert!(matches!(err, MapperError::InvalidArgument(_)));
    }

    #[test]
    fn test_values_follow_declaration_order() {
        let w = widget();
        let names: Vec<String> = w.values().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Id", "Name", "Price"]);
    }

    #[test]
    fn test_validation_rules() {
        let mut w = widget();
        w.set("Name", Value::from("   ")).unwrap();
        w.set("Price", Value::Double(Some(-1.0))).unwrap();
        let errors = w.validate().unwrap_err();
        assert_eq!(errors.get("Name").map(|m| m.len()), Some(1));
        assert_eq!(errors.get("Price").map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_hydrate_leaves_record_clean() {
        let mut w = widget();
        w.hydrate(vec![
            ("Id".to_string(), Value::Int(Some(4))),
            ("Name".to_string(), Value::from("nut")),
        ])
        .unwrap();
        assert!(!w.is_dirty());
        assert_eq!(w.get("Id"), Some(Value::Int(Some(4))));
    }

    #[test]
    fn test_stored_ignores_pending_modifications() {
        let mut w = widget();
        assert_eq!(w.stored("Id"), Some(Value::Int(None)));
        w.hydrate(vec![("Id".to_string(), Value::Int(Some(4)))]).unwrap();
        w.set("Id", Value::Int(Some(9))).unwrap();
        assert_eq!(w.stored("Id"), Some(Value::Int(Some(4))));
        assert_eq!(w.get("Id"), Some(Value::Int(Some(9))));
    }

    #[test]
    fn test_clones_share_schema_not_values() {
        let prototype = widget();
        let mut a = prototype.clone();
        a.set("Name", Value::from("a")).unwrap();
        assert_eq!(prototype.get("Name"), Some(Value::String(None)));
    }
}
