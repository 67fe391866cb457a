//! Mapper definitions and their normalization.
//!
//! A definition may describe properties in three forms:
//!
//! - a bare column (`"price"`), typed as `string`
//! - a `(column, type)` pair (`("price", "float")`)
//! - a ready [`Property`]
//!
//! [`MapperDefinition::normalize`] turns every form into a [`Property`]
//! once. Compilation only ever sees the normalized [`Mapping`].

use crate::mapper::error::MapperError;
use crate::query::join::Join;
use crate::query::property::{Property, PropertyType};

/// A property as written in a definition
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDef {
    /// Column only; typed `string`
    Column(String),
    /// Column and textual type name
    Typed(String, String),
    /// Already-built property
    Property(Property),
}

impl From<&str> for PropertyDef {
    fn from(column: &str) -> Self {
        PropertyDef::Column(column.to_string())
    }
}

impl From<String> for PropertyDef {
    fn from(column: String) -> Self {
        PropertyDef::Column(column)
    }
}

impl From<(&str, &str)> for PropertyDef {
    fn from((column, kind): (&str, &str)) -> Self {
        PropertyDef::Typed(column.to_string(), kind.to_string())
    }
}

impl From<(&str, PropertyType)> for PropertyDef {
    fn from((column, kind): (&str, PropertyType)) -> Self {
        PropertyDef::Typed(column.to_string(), kind.as_str().to_string())
    }
}

impl From<Property> for PropertyDef {
    fn from(property: Property) -> Self {
        PropertyDef::Property(property)
    }
}

impl PropertyDef {
    fn into_property(self) -> Result<Property, MapperError> {
        match self {
            PropertyDef::Column(column) => Property::new(column, PropertyType::String),
            PropertyDef::Typed(column, kind) => Property::parse(column, &kind),
            PropertyDef::Property(property) => Ok(property),
        }
    }
}

/// Declarative description of one entity's table mapping
///
/// # Example
///
/// ```
/// use dbmapper::{Join, JoinType, MapperDefinition};
///
/// let definition = MapperDefinition::new("widgets", "Id")
///     .property("Id", ("id", "integer"))
///     .property("Name", "name")
///     .property("OrderCount", ("COUNT(orders.id)", "integer"))
///     .join(Join::new(JoinType::Left, "orders", "orders.widget_id = widgets.id").unwrap());
///
/// let mapping = definition.normalize().unwrap();
/// assert!(mapping.has_aggregate());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MapperDefinition {
    table: String,
    id_property: String,
    properties: Vec<(String, PropertyDef)>,
    joins: Vec<Join>,
}

impl MapperDefinition {
    pub fn new(table: impl Into<String>, id_property: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            id_property: id_property.into(),
            properties: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Map a property name to a column, in any accepted form
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, def: impl Into<PropertyDef>) -> Self {
        self.properties.push((name.into(), def.into()));
        self
    }

    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    /// Validate the definition and normalize every property
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Configuration` when the table or id property is
    /// empty, a property is defined twice, a property definition is invalid,
    /// or the id property is not among the mapped properties.
    pub fn normalize(&self) -> Result<Mapping, MapperError> {
        if self.table.trim().is_empty() {
            return Err(MapperError::Configuration("table name cannot be empty".to_string()));
        }
        if self.id_property.trim().is_empty() {
            return Err(MapperError::Configuration(format!(
                "mapper for '{}' has no id property",
                self.table
            )));
        }

        let mut properties: Vec<(String, Property)> = Vec::with_capacity(self.properties.len());
        for (name, def) in &self.properties {
            if name.trim().is_empty() {
                return Err(MapperError::Configuration(format!(
                    "mapper for '{}' has a property without a name",
                    self.table
                )));
            }
            if properties.iter().any(|(n, _)| n == name) {
                return Err(MapperError::Configuration(format!(
                    "property '{}' is mapped twice on '{}'",
                    name, self.table
                )));
            }
            let property = def.clone().into_property().map_err(|e| {
                MapperError::Configuration(format!("property '{}' on '{}': {}", name, self.table, e))
            })?;
            properties.push((name.clone(), property));
        }

        let id_index = properties
            .iter()
            .position(|(n, _)| *n == self.id_property)
            .ok_or_else(|| {
                MapperError::Configuration(format!(
                    "id property '{}' is not mapped on '{}'",
                    self.id_property, self.table
                ))
            })?;

        Ok(Mapping {
            table: self.table.clone(),
            id_property: self.id_property.clone(),
            id_index,
            properties,
            joins: self.joins.clone(),
        })
    }
}

/// A normalized, validated table mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    table: String,
    id_property: String,
    id_index: usize,
    properties: Vec<(String, Property)>,
    joins: Vec<Join>,
}

impl Mapping {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    /// The id property's mapping
    pub fn id(&self) -> &Property {
        &self.properties[self.id_index].1
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Mapped property name matching `name` ignoring ASCII case
    pub fn property_name_ignore_case(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, _)| n.as_str())
    }

    /// Properties in definition order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn has_aggregate(&self) -> bool {
        self.properties.iter().any(|(_, p)| p.is_aggregate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_forms_normalize() {
        let mapping = MapperDefinition::new("widgets", "Id")
            .property("Id", ("id", "integer"))
            .property("Name", "name")
            .property("Price", ("price", PropertyType::Float))
            .property("Notes", Property::new("notes", PropertyType::Text).unwrap())
            .normalize()
            .unwrap();

        assert_eq!(mapping.property("Id").map(Property::kind), Some(PropertyType::Integer));
        assert_eq!(mapping.property("Name").map(Property::kind), Some(PropertyType::String));
        assert_eq!(mapping.property("Price").map(Property::kind), Some(PropertyType::Float));
        assert_eq!(mapping.property("Notes").map(Property::column), Some("notes"));
        assert_eq!(mapping.id().column(), "id");

        let names: Vec<&str> = mapping.properties().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Id", "Name", "Price", "Notes"]);
    }

    #[test]
    fn test_missing_id_property_is_rejected() {
        let err = MapperDefinition::new("widgets", "Id")
            .property("Name", "name")
            .normalize()
            .unwrap_err();
        assert!(matches!(err, MapperError::Configuration(_)));
        assert!(err.to_string().contains("id property 'Id'"));
    }

    #[test]
    fn test_invalid_type_is_a_configuration_error() {
        let err = MapperDefinition::new("widgets", "Id")
            .property("Id", ("id", "uuid-ish"))
            .normalize()
            .unwrap_err();
        assert!(matches!(err, MapperError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_and_empty_names_are_rejected() {
        assert!(MapperDefinition::new("widgets", "Id")
            .property("Id", "id")
            .property("Id", "other_id")
            .normalize()
            .is_err());
        assert!(MapperDefinition::new("", "Id").property("Id", "id").normalize().is_err());
        assert!(MapperDefinition::new("widgets", "").normalize().is_err());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mapping = MapperDefinition::new("widgets", "Id")
            .property("Id", "id")
            .property("OrderCount", ("COUNT(orders.id)", "integer"))
            .normalize()
            .unwrap();
        assert_eq!(mapping.property_name_ignore_case("ordercount"), Some("OrderCount"));
        assert!(mapping.has_aggregate());
    }
}
