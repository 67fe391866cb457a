//! Compiled statements: SQL text plus named parameters.
//!
//! Every statement a mapper compiles uses named placeholders (`:name`).
//! Executors for drivers with positional placeholders rewrite them with
//! [`Statement::to_positional`].

use crate::query::value::value_to_sql_string;
use sea_query::Value;
use std::fmt;

/// Ordered set of named parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Insert or replace a parameter under an exact name
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Bind `value` under a placeholder derived from `base` and return the name used
    ///
    /// The base is reduced to `[A-Za-z0-9_]`; if the name is taken, `_2`,
    /// `_3`, ... is appended so that two predicates on the same property
    /// never overwrite each other.
    pub(crate) fn bind(&mut self, base: &str, value: Value) -> String {
        let base = sanitize_placeholder(base);
        let mut name = base.clone();
        let mut n = 2;
        while self.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        self.entries.push((name.clone(), value));
        name
    }
}

fn sanitize_placeholder(base: &str) -> String {
    let mut out: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'p');
    }
    out
}

/// SQL text with its named parameters
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Rewrite `:name` placeholders into positional ones
    ///
    /// `placeholder` receives the 1-based position of each distinct name
    /// (`|i| format!("${}", i)` for Postgres, `|_| "?".into()` for engines
    /// that repeat values per occurrence). Quoted literals, quoted
    /// identifiers and `::` casts are left untouched.
    ///
    /// Returns the rewritten SQL and the values in binding order.
    ///
    /// # Errors
    ///
    /// Returns the placeholder name when the SQL references a parameter that
    /// was never bound.
    pub fn to_positional<F>(&self, placeholder: F) -> Result<(String, Vec<&Value>), String>
    where
        F: Fn(usize) -> String,
    {
        let chars: Vec<char> = self.sql.chars().collect();
        let mut sql = String::with_capacity(self.sql.len());
        let mut order: Vec<&str> = Vec::new();
        let mut values: Vec<&Value> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\'' | '"' => {
                    // copy quoted section verbatim, doubled quote is an escape
                    sql.push(c);
                    i += 1;
                    while i < chars.len() {
                        sql.push(chars[i]);
                        if chars[i] == c {
                            if i + 1 < chars.len() && chars[i + 1] == c {
                                sql.push(c);
                                i += 2;
                                continue;
                            }
                            break;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                ':' if i + 1 < chars.len() && chars[i + 1] == ':' => {
                    sql.push_str("::");
                    i += 2;
                }
                ':' if i + 1 < chars.len()
                    && (chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_') =>
                {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    let (stored_name, value) = self
                        .params
                        .entries
                        .iter()
                        .find(|(n, _)| *n == name)
                        .map(|(n, v)| (n.as_str(), v))
                        .ok_or_else(|| name.clone())?;
                    let position = match order.iter().position(|n| *n == stored_name) {
                        Some(p) => p + 1,
                        None => {
                            order.push(stored_name);
                            values.push(value);
                            order.len()
                        }
                    };
                    sql.push_str(&placeholder(position));
                    i = end;
                }
                _ => {
                    sql.push(c);
                    i += 1;
                }
            }
        }

        Ok((sql, values))
    }

    /// SQL with parameters inlined, for logs only
    pub fn to_debug_sql(&self) -> String {
        match self.to_positional(|i| format!("\u{0}{}\u{0}", i)) {
            Ok((sql, values)) => {
                let mut out = sql;
                for (idx, value) in values.iter().enumerate().rev() {
                    out = out.replace(&format!("\u{0}{}\u{0}", idx + 1), &value_to_sql_string(value));
                }
                out
            }
            Err(_) => self.sql.clone(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
