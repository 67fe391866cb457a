//! Self-validating predicates.
//!
//! A `Filter` pairs a property name with an operator and a value. The
//! operator/value shape is checked when the filter is built, so a malformed
//! predicate can never reach SQL compilation:
//!
//! | operator | value |
//! |---|---|
//! | `IS`, `IS NOT` | `FilterValue::Null` |
//! | `IN`, `NOT IN` | `FilterValue::List` |
//! | `BETWEEN` | `FilterValue::List` of exactly two values |
//! | everything else | `FilterValue::Scalar` |

use crate::mapper::error::MapperError;
use crate::query::value::is_null;
use sea_query::Value;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    NotIn,
    Between,
    Is,
    IsNot,
}

impl Operator {
    /// SQL spelling of the operator
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        }
    }
}

impl FromStr for Operator {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        match normalized.as_str() {
            "=" => Ok(Operator::Eq),
            "!=" => Ok(Operator::NotEq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "LIKE" => Ok(Operator::Like),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "BETWEEN" => Ok(Operator::Between),
            "IS" => Ok(Operator::Is),
            "IS NOT" => Ok(Operator::IsNot),
            _ => Err(MapperError::Construction(format!(
                "unsupported filter operator '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Right-hand side of a [`Filter`]
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// SQL `NULL`, only valid for `IS` / `IS NOT`
    Null,
    /// A single bound value
    Scalar(Value),
    /// A list of bound values (`IN`, `NOT IN`, `BETWEEN`)
    List(Vec<Value>),
}

impl FilterValue {
    fn shape(&self) -> &'static str {
        match self {
            FilterValue::Null => "null",
            FilterValue::Scalar(_) => "a scalar",
            FilterValue::List(_) => "an array",
        }
    }
}

impl From<Value> for FilterValue {
    /// A typed `NULL` value becomes `FilterValue::Null`
    fn from(value: Value) -> Self {
        if is_null(&value) {
            FilterValue::Null
        } else {
            FilterValue::Scalar(value)
        }
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(values: Vec<Value>) -> Self {
        FilterValue::List(values)
    }
}

macro_rules! filter_value_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FilterValue {
                fn from(value: $t) -> Self {
                    FilterValue::Scalar(Value::from(value))
                }
            }

            impl From<Vec<$t>> for FilterValue {
                fn from(values: Vec<$t>) -> Self {
                    FilterValue::List(values.into_iter().map(Value::from).collect())
                }
            }

            impl<const N: usize> From<[$t; N]> for FilterValue {
                fn from(values: [$t; N]) -> Self {
                    FilterValue::List(values.into_iter().map(Value::from).collect())
                }
            }
        )*
    };
}

filter_value_from!(
    bool,
    i16,
    i32,
    i64,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    &str,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
);

/// A validated predicate over one property
///
/// # Example
///
/// ```
/// use dbmapper::{Filter, FilterValue, Operator};
///
/// let price = Filter::new("Price", Operator::Between, [10, 20]).unwrap();
/// assert_eq!(price.value(), &FilterValue::from([10, 20]));
///
/// // BETWEEN needs exactly two bounds
/// assert!(Filter::new("Price", Operator::Between, [10]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    property: String,
    operator: Operator,
    value: FilterValue,
}

impl Filter {
    /// Build a filter, validating the operator/value shape
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Construction` when the property name is empty or
    /// the value does not have the shape the operator requires.
    pub fn new(
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<Self, MapperError> {
        let property = property.into();
        if property.trim().is_empty() {
            return Err(MapperError::Construction(
                "filter property cannot be empty".to_string(),
            ));
        }
        let value = value.into();
        Self::check_shape(&property, operator, &value)?;
        Ok(Self {
            property,
            operator,
            value,
        })
    }

    /// Equivalent factory taking the operator as text (`"NOT IN"`, `"between"`, `">="`)
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Construction` for an unknown operator or an
    /// invalid operator/value shape.
    pub fn create(
        property: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Self, MapperError> {
        let operator = operator.parse::<Operator>()?;
        Self::new(property, operator, value)
    }

    /// Shorthand for an equality filter
    pub fn eq(property: impl Into<String>, value: impl Into<FilterValue>) -> Result<Self, MapperError> {
        Self::new(property, Operator::Eq, value)
    }

    fn check_shape(property: &str, operator: Operator, value: &FilterValue) -> Result<(), MapperError> {
        let ok = match operator {
            Operator::Is | Operator::IsNot => matches!(value, FilterValue::Null),
            Operator::In | Operator::NotIn => matches!(value, FilterValue::List(_)),
            Operator::Between => matches!(value, FilterValue::List(v) if v.len() == 2),
            _ => matches!(value, FilterValue::Scalar(_)),
        };
        if ok {
            return Ok(());
        }
        let expected = match operator {
            Operator::Is | Operator::IsNot => "null",
            Operator::In | Operator::NotIn => "an array",
            Operator::Between => "an array of exactly two values",
            _ => "a scalar",
        };
        let actual = match value {
            FilterValue::List(v) if operator == Operator::Between => {
                format!("an array of {} values", v.len())
            }
            other => other.shape().to_string(),
        };
        Err(MapperError::Construction(format!(
            "filter on '{}': operator {} requires {}, got {}",
            property, operator, expected, actual
        )))
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_requires_array() {
        let err = Filter::new("Id", Operator::In, 5).unwrap_err();
        assert!(matches!(err, MapperError::Construction(_)));

        let err = Filter::create("Id", "NOT IN", "x").unwrap_err();
        assert!(err.to_string().contains("requires an array"));
    }

    #[test]
    fn test_in_returns_array_unchanged() {
        let f = Filter::new("Id", Operator::In, vec![1, 2, 3]).unwrap();
        assert_eq!(
            f.value(),
            &FilterValue::List(vec![Value::Int(Some(1)), Value::Int(Some(2)), Value::Int(Some(3))])
        );
    }

    #[test]
    fn test_between_requires_two_values() {
        assert!(Filter::new("Price", Operator::Between, Vec::<i32>::new()).is_err());
        assert!(Filter::new("Price", Operator::Between, [1]).is_err());
        assert!(Filter::new("Price", Operator::Between, [1, 2, 3]).is_err());
        assert!(Filter::new("Price", Operator::Between, 10).is_err());

        let f = Filter::new("Price", Operator::Between, [10, 20]).unwrap();
        assert_eq!(
            f.value(),
            &FilterValue::List(vec![Value::Int(Some(10)), Value::Int(Some(20))])
        );
    }

    #[test]
    fn test_is_requires_null() {
        assert!(Filter::new("DeletedAt", Operator::Is, FilterValue::Null).is_ok());
        assert!(Filter::new("DeletedAt", Operator::IsNot, Value::String(None)).is_ok());
        assert!(Filter::new("DeletedAt", Operator::Is, 0).is_err());
        assert!(Filter::new("DeletedAt", Operator::IsNot, vec![1]).is_err());
    }

    #[test]
    fn test_comparison_requires_scalar() {
        assert!(Filter::new("Name", Operator::Like, "wid%").is_ok());
        assert!(Filter::new("Name", Operator::Eq, FilterValue::Null).is_err());
        assert!(Filter::new("Name", Operator::Gt, vec![1, 2]).is_err());
    }

    #[test]
    fn test_operator_text_is_normalized() {
        assert_eq!("not   in".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!("is not".parse::<Operator>().unwrap(), Operator::IsNot);
        assert_eq!("like".parse::<Operator>().unwrap(), Operator::Like);
        assert!("<>".parse::<Operator>().is_err());
        assert!("CONTAINS".parse::<Operator>().is_err());
    }

    #[test]
    fn test_create_matches_new() {
        let a = Filter::create("Name", "=", "widget").unwrap();
        let b = Filter::new("Name", Operator::Eq, "widget").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.property(), "Name");
        assert_eq!(a.operator(), Operator::Eq);
    }

    #[test]
    fn test_empty_property_rejected() {
        assert!(Filter::eq("", 1).is_err());
    }
}
