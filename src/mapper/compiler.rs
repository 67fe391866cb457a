//! SQL compilation for one mapping.
//!
//! Every statement is built from the normalized [`Mapping`] and the three
//! dialect seams. Values are never inlined: each one is bound to a named
//! placeholder in the statement's [`Params`].
//!
//! Predicate routing:
//!
//! | property | clause | left-hand side |
//! |---|---|---|
//! | mapped column | `WHERE` | table-qualified column |
//! | mapped aggregate or sub-select | `HAVING` | property alias |
//! | declared by the entity only | `HAVING` | property alias |
//! | anything else | rejected | |

use crate::dialect::Dialect;
use crate::mapper::definition::Mapping;
use crate::mapper::error::MapperError;
use crate::query::filter::{Filter, FilterValue, Operator};
use crate::query::join::{Join, JoinType};
use crate::query::property::Property;
use crate::query::sort::Sort;
use crate::query::statement::{Params, Statement};
use crate::query::value::is_unassigned_id;
use sea_query::Value;

/// Where a compiled predicate belongs
enum Clause {
    Where(String),
    Having(String),
}

pub(crate) struct Compiler<'a> {
    mapping: &'a Mapping,
    dialect: &'a Dialect,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(mapping: &'a Mapping, dialect: &'a Dialect) -> Self {
        Self { mapping, dialect }
    }

    fn table(&self) -> String {
        self.dialect.quote_path(self.mapping.table())
    }

    fn alias(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    /// Column as it appears in `SELECT`, `WHERE`, `GROUP BY` and `ORDER BY`
    ///
    /// Aggregates, sub-selects and other expressions are emitted verbatim;
    /// plain identifiers are qualified with the mapper's table.
    fn column_expr(&self, property: &Property) -> String {
        let column = property.column();
        if property.is_having() {
            column.to_string()
        } else if property.is_qualified() {
            if is_simple_path(column) {
                self.dialect.quote_path(column)
            } else {
                column.to_string()
            }
        } else if is_identifier(column) {
            format!("{}.{}", self.table(), self.dialect.quote_identifier(column))
        } else {
            column.to_string()
        }
    }

    /// Unqualified column for `INSERT` / `UPDATE` / `DELETE` targets
    fn target_column(&self, property: &Property) -> String {
        self.dialect.quote_identifier(property.column())
    }

    fn join_clause(&self, join: &Join) -> String {
        let mut clause = format!(
            "{} {}",
            join.join_type().sql_keyword(),
            self.dialect.quote_path(join.table())
        );
        if let Some(alias) = join.alias() {
            clause.push(' ');
            clause.push_str(&self.dialect.quote_identifier(alias));
        }
        if join.join_type() != JoinType::Cross {
            clause.push_str(" ON ");
            clause.push_str(join.on());
        }
        clause
    }

    /// `SELECT <columns> FROM <table> <joins>`
    pub(crate) fn base_select(&self) -> String {
        let columns = self
            .mapping
            .properties()
            .map(|(name, property)| format!("{} AS {}", self.column_expr(property), self.alias(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM {}", columns, self.table());
        for join in self.mapping.joins() {
            sql.push(' ');
            sql.push_str(&self.join_clause(join));
        }
        sql
    }

    fn predicate(&self, lhs: &str, filter: &Filter, base: &str, params: &mut Params) -> Result<String, MapperError> {
        let op = filter.operator();
        let fragment = match (op, filter.value()) {
            (Operator::Is, _) => format!("{} IS NULL", lhs),
            (Operator::IsNot, _) => format!("{} IS NOT NULL", lhs),
            (Operator::In | Operator::NotIn, FilterValue::List(values)) if values.is_empty() => {
                // IN () is not valid SQL; an empty set matches nothing
                if op == Operator::In {
                    "1 = 0".to_string()
                } else {
                    "1 = 1".to_string()
                }
            }
            (Operator::In | Operator::NotIn, FilterValue::List(values)) => {
                let placeholders = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!(":{}", params.bind(&format!("{}_{}", base, i), v.clone())))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {} ({})", lhs, op.as_sql(), placeholders)
            }
            (Operator::Between, FilterValue::List(values)) if values.len() == 2 => {
                let min = params.bind(&format!("{}_min", base), values[0].clone());
                let max = params.bind(&format!("{}_max", base), values[1].clone());
                format!("{} BETWEEN :{} AND :{}", lhs, min, max)
            }
            (_, FilterValue::Scalar(value)) => {
                let name = params.bind(base, value.clone());
                format!("{} {} :{}", lhs, op.as_sql(), name)
            }
            (op, value) => {
                return Err(MapperError::Construction(format!(
                    "operator {} cannot compare '{}' with {:?}",
                    op,
                    filter.property(),
                    value
                )))
            }
        };
        Ok(fragment)
    }

    fn route(
        &self,
        filter: &Filter,
        declared: &dyn Fn(&str) -> bool,
        params: &mut Params,
    ) -> Result<Clause, MapperError> {
        let name = filter.property();
        match self.mapping.property(name) {
            Some(property) if property.is_having() => {
                Ok(Clause::Having(self.predicate(&self.alias(name), filter, name, params)?))
            }
            Some(property) => Ok(Clause::Where(self.predicate(
                &self.column_expr(property),
                filter,
                name,
                params,
            )?)),
            None if declared(name) => Ok(Clause::Having(self.predicate(&self.alias(name), filter, name, params)?)),
            None => Err(MapperError::Query(format!(
                "filter references unknown property '{}' on '{}'",
                name,
                self.mapping.table()
            ))),
        }
    }

    /// Split filters into `WHERE` and `HAVING` fragments
    fn filter_clauses(
        &self,
        filters: &[Filter],
        declared: &dyn Fn(&str) -> bool,
        params: &mut Params,
    ) -> Result<(Vec<String>, Vec<String>), MapperError> {
        let mut wheres = Vec::new();
        let mut havings = Vec::new();
        for filter in filters {
            match self.route(filter, declared, params)? {
                Clause::Where(fragment) => wheres.push(fragment),
                Clause::Having(fragment) => havings.push(fragment),
            }
        }
        Ok((wheres, havings))
    }

    /// Every non-aggregate, non-sub-select column when the mapping selects an aggregate
    fn group_by(&self) -> Vec<String> {
        if !self.mapping.has_aggregate() {
            return Vec::new();
        }
        let mut columns: Vec<String> = Vec::new();
        for (_, property) in self.mapping.properties() {
            if property.is_having() {
                continue;
            }
            let column = self.column_expr(property);
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    fn order_by(&self, sorts: &[Sort]) -> Vec<String> {
        sorts
            .iter()
            .filter_map(|sort| match self.mapping.property(sort.property()) {
                Some(property) => {
                    let target = if property.is_having() {
                        self.alias(sort.property())
                    } else {
                        self.column_expr(property)
                    };
                    Some(format!("{} {}", target, sort.direction().as_sql()))
                }
                None => {
                    log::warn!(
                        "ignoring sort on unmapped property '{}' for '{}'",
                        sort.property(),
                        self.mapping.table()
                    );
                    None
                }
            })
            .collect()
    }

    /// `SELECT` with `WHERE`, `GROUP BY` and `HAVING` but no ordering
    fn filtered_select(
        &self,
        base: &str,
        filters: &[Filter],
        declared: &dyn Fn(&str) -> bool,
        params: &mut Params,
    ) -> Result<String, MapperError> {
        let (wheres, havings) = self.filter_clauses(filters, declared, params)?;
        let mut sql = base.to_string();
        if !wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
        }
        let group_by = self.group_by();
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }
        if !havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&havings.join(" AND "));
        }
        Ok(sql)
    }

    pub(crate) fn select(
        &self,
        base: &str,
        filters: &[Filter],
        sorts: &[Sort],
        page: u64,
        page_size: u64,
        declared: &dyn Fn(&str) -> bool,
    ) -> Result<Statement, MapperError> {
        if page < 1 {
            return Err(MapperError::InvalidArgument(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        let mut params = Params::new();
        let mut sql = self.filtered_select(base, filters, declared, &mut params)?;
        let order_by = self.order_by(sorts);
        if !order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_by.join(", "));
        }
        let sql = self.dialect.paginate(sql, page, page_size)?;
        Ok(Statement::new(sql, params))
    }

    pub(crate) fn count(
        &self,
        base: &str,
        filters: &[Filter],
        declared: &dyn Fn(&str) -> bool,
    ) -> Result<Statement, MapperError> {
        let mut params = Params::new();
        let inner = self.filtered_select(base, filters, declared, &mut params)?;
        Ok(Statement::new(
            format!("SELECT COUNT(*) AS total FROM ({}) counted", inner),
            params,
        ))
    }

    pub(crate) fn select_by_id(&self, base: &str, id: Value) -> Statement {
        let property = self.mapping.id();
        let mut params = Params::new();
        let name = params.bind(placeholder_base(property.column()), id);
        Statement::new(
            format!("{} WHERE {} = :{}", base, self.column_expr(property), name),
            params,
        )
    }

    fn bind_column(
        &self,
        property: &Property,
        value: &Value,
        params: &mut Params,
    ) -> Result<String, MapperError> {
        let value = if property.kind().is_temporal() {
            self.dialect.format_temporal(property.kind(), value)?
        } else {
            value.clone()
        };
        Ok(params.bind(placeholder_base(property.column()), value))
    }

    /// `INSERT` of every writeable property; an unassigned id is left to the database
    pub(crate) fn insert(&self, values: &[(String, Value)]) -> Result<Statement, MapperError> {
        let mut params = Params::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        for (name, property) in self.mapping.properties() {
            if !property.is_writeable() || property.is_subquery() {
                continue;
            }
            let Some(value) = lookup(values, name) else {
                continue;
            };
            if name == self.mapping.id_property() && is_unassigned_id(value) {
                continue;
            }
            let placeholder = self.bind_column(property, value, &mut params)?;
            columns.push(self.target_column(property));
            placeholders.push(format!(":{}", placeholder));
        }
        if columns.is_empty() {
            return Err(MapperError::InvalidArgument(format!(
                "nothing to insert into '{}': no writeable properties have values",
                self.mapping.table()
            )));
        }
        Ok(Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table(),
                columns.join(", "),
                placeholders.join(", ")
            ),
            params,
        ))
    }

    /// `UPDATE` of the modified writeable properties, keyed by id
    pub(crate) fn update(&self, modified: &[(String, Value)], id: Value) -> Result<Statement, MapperError> {
        let mut params = Params::new();
        let mut assignments = Vec::new();
        for (name, property) in self.mapping.properties() {
            if name == self.mapping.id_property() || !property.is_writeable() || property.is_subquery() {
                continue;
            }
            let Some(value) = lookup(modified, name) else {
                continue;
            };
            let placeholder = self.bind_column(property, value, &mut params)?;
            assignments.push(format!("{} = :{}", self.target_column(property), placeholder));
        }
        if assignments.is_empty() {
            return Err(MapperError::InvalidArgument(format!(
                "nothing to update in '{}': no writeable properties were modified",
                self.mapping.table()
            )));
        }
        let id_property = self.mapping.id();
        let id_name = params.bind(placeholder_base(id_property.column()), id);
        Ok(Statement::new(
            format!(
                "UPDATE {} SET {} WHERE {} = :{}",
                self.table(),
                assignments.join(", "),
                self.target_column(id_property),
                id_name
            ),
            params,
        ))
    }

    pub(crate) fn delete_by_id(&self, id: Value) -> Statement {
        let property = self.mapping.id();
        let mut params = Params::new();
        let name = params.bind(placeholder_base(property.column()), id);
        Statement::new(
            format!(
                "DELETE FROM {} WHERE {} = :{}",
                self.table(),
                self.target_column(property),
                name
            ),
            params,
        )
    }

    /// `DELETE` restricted by filters on the mapper's own columns
    pub(crate) fn delete_where(
        &self,
        filters: &[Filter],
        declared: &dyn Fn(&str) -> bool,
    ) -> Result<Statement, MapperError> {
        if filters.is_empty() {
            return Err(MapperError::InvalidArgument(format!(
                "refusing to delete from '{}' without a filter",
                self.mapping.table()
            )));
        }
        let mut params = Params::new();
        let mut wheres = Vec::with_capacity(filters.len());
        for filter in filters {
            if let Some(property) = self.mapping.property(filter.property()) {
                if property.is_qualified() {
                    return Err(MapperError::Query(format!(
                        "cannot delete from '{}' by joined column '{}'",
                        self.mapping.table(),
                        filter.property()
                    )));
                }
            }
            match self.route(filter, declared, &mut params)? {
                Clause::Where(fragment) => wheres.push(fragment),
                Clause::Having(_) => {
                    return Err(MapperError::Query(format!(
                        "cannot delete from '{}' by computed property '{}'",
                        self.mapping.table(),
                        filter.property()
                    )))
                }
            }
        }
        Ok(Statement::new(
            format!("DELETE FROM {} WHERE {}", self.table(), wheres.join(" AND ")),
            params,
        ))
    }
}

fn lookup<'v>(values: &'v [(String, Value)], name: &str) -> Option<&'v Value> {
    values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Last segment of a column path, used to name its placeholder
fn placeholder_base(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_simple_path(s: &str) -> bool {
    s.split('.').all(|part| part == "*" || is_identifier(part))
}
