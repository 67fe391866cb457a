//! SQL dialects.
//!
//! Engines differ in exactly three places the mapper cares about, each an
//! independently injectable strategy:
//!
//! - **Identifier quoting** ([`IdentifierQuoter`])
//! - **Pagination clause syntax** ([`Paginator`])
//! - **Temporal value formatting** ([`TemporalFormatter`])
//!
//! A [`Dialect`] bundles one of each. The same `Mapper` type is
//! reparameterized per engine by handing it a different `Dialect`, and any
//! single seam can be swapped without touching the other two:
//!
//! ```
//! use dbmapper::dialect::{Dialect, quoting::BracketQuoter};
//!
//! let dialect = Dialect::postgres().with_quoter(BracketQuoter);
//! assert_eq!(dialect.quote_identifier("widgets"), "[widgets]");
//! ```

pub mod pagination;
pub mod quoting;
pub mod temporal;

pub use pagination::{LimitOffset, OffsetFetch, Paginator, RownumWrap};
pub use quoting::{BacktickQuoter, BracketQuoter, DoubleQuoteQuoter, IdentifierQuoter, Passthrough};
pub use temporal::{LenientTemporal, StructuredTemporal, TemporalFormats, TemporalFormatter};

use crate::mapper::error::MapperError;
use crate::query::property::PropertyType;
use sea_query::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Target database engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Generic ANSI-like SQL: no quoting, `LIMIT`/`OFFSET`, structured temporal values
    Generic,
    MySql,
    MariaDb,
    Postgres,
    Oracle,
    Sqlite,
    SqlServer,
}

impl Engine {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Engine::Generic => "generic",
            Engine::MySql => "mysql",
            Engine::MariaDb => "mariadb",
            Engine::Postgres => "postgres",
            Engine::Oracle => "oracle",
            Engine::Sqlite => "sqlite",
            Engine::SqlServer => "sqlsrv",
        }
    }
}

impl FromStr for Engine {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generic" | "ansi" | "base" => Ok(Engine::Generic),
            "mysql" => Ok(Engine::MySql),
            "mariadb" => Ok(Engine::MariaDb),
            "postgres" | "postgresql" | "pgsql" => Ok(Engine::Postgres),
            "oracle" | "oci" => Ok(Engine::Oracle),
            "sqlite" => Ok(Engine::Sqlite),
            "sqlsrv" | "sqlserver" | "mssql" => Ok(Engine::SqlServer),
            other => Err(MapperError::Configuration(format!(
                "unknown SQL dialect '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategy per dialect seam
#[derive(Debug, Clone)]
pub struct Dialect {
    engine: Engine,
    quoter: Arc<dyn IdentifierQuoter>,
    paginator: Arc<dyn Paginator>,
    temporal: Arc<dyn TemporalFormatter>,
}

impl Dialect {
    /// Assemble a dialect from explicit strategies
    pub fn new(
        engine: Engine,
        quoter: impl IdentifierQuoter + 'static,
        paginator: impl Paginator + 'static,
        temporal: impl TemporalFormatter + 'static,
    ) -> Self {
        Self {
            engine,
            quoter: Arc::new(quoter),
            paginator: Arc::new(paginator),
            temporal: Arc::new(temporal),
        }
    }

    /// Preset strategies for an engine
    pub fn for_engine(engine: Engine) -> Self {
        match engine {
            Engine::Generic => Self::new(engine, Passthrough, LimitOffset, StructuredTemporal::default()),
            Engine::MySql | Engine::MariaDb => {
                Self::new(engine, BacktickQuoter, LimitOffset, StructuredTemporal::default())
            }
            Engine::Postgres => Self::new(
                engine,
                DoubleQuoteQuoter,
                LimitOffset,
                LenientTemporal {
                    formats: TemporalFormats::FRACTIONAL,
                },
            ),
            Engine::Oracle => Self::new(engine, DoubleQuoteQuoter, RownumWrap, LenientTemporal::default()),
            Engine::Sqlite => Self::new(engine, DoubleQuoteQuoter, LimitOffset, StructuredTemporal::default()),
            Engine::SqlServer => Self::new(engine, BracketQuoter, OffsetFetch, StructuredTemporal::default()),
        }
    }

    pub fn generic() -> Self {
        Self::for_engine(Engine::Generic)
    }

    pub fn mysql() -> Self {
        Self::for_engine(Engine::MySql)
    }

    pub fn mariadb() -> Self {
        Self::for_engine(Engine::MariaDb)
    }

    pub fn postgres() -> Self {
        Self::for_engine(Engine::Postgres)
    }

    pub fn oracle() -> Self {
        Self::for_engine(Engine::Oracle)
    }

    pub fn sqlite() -> Self {
        Self::for_engine(Engine::Sqlite)
    }

    pub fn sql_server() -> Self {
        Self::for_engine(Engine::SqlServer)
    }

    /// Look a dialect up by name (`mysql`, `pgsql`, `sqlsrv`, ...)
    ///
    /// # Errors
    ///
    /// Returns `MapperError::Configuration` for an unknown name.
    pub fn from_name(name: &str) -> Result<Self, MapperError> {
        Ok(Self::for_engine(name.parse::<Engine>()?))
    }

    #[must_use]
    pub fn with_quoter(mut self, quoter: impl IdentifierQuoter + 'static) -> Self {
        self.quoter = Arc::new(quoter);
        self
    }

    #[must_use]
    pub fn with_paginator(mut self, paginator: impl Paginator + 'static) -> Self {
        self.paginator = Arc::new(paginator);
        self
    }

    #[must_use]
    pub fn with_temporal(mut self, temporal: impl TemporalFormatter + 'static) -> Self {
        self.temporal = Arc::new(temporal);
        self
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn quote_identifier(&self, identifier: &str) -> String {
        self.quoter.quote_identifier(identifier)
    }

    pub fn quote_path(&self, path: &str) -> String {
        self.quoter.quote_path(path)
    }

    /// Limit `sql` to one page; `page_size == 0` returns it unchanged
    ///
    /// # Errors
    ///
    /// Returns `MapperError::InvalidArgument` when `page < 1` or when the
    /// page's last row number does not fit in a `u64`.
    pub fn paginate(&self, sql: String, page: u64, page_size: u64) -> Result<String, MapperError> {
        if page < 1 {
            return Err(MapperError::InvalidArgument(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        if page_size == 0 {
            return Ok(sql);
        }
        let offset = page_size.checked_mul(page - 1).ok_or_else(|| {
            MapperError::InvalidArgument(format!(
                "page {} with page size {} overflows the row offset",
                page, page_size
            ))
        })?;
        offset.checked_add(page_size).ok_or_else(|| {
            MapperError::InvalidArgument(format!(
                "page {} with page size {} overflows the last row number",
                page, page_size
            ))
        })?;
        Ok(self.paginator.paginate(&sql, page_size, offset))
    }

    /// Route a value of a `datetime`/`date`/`time` property through the temporal seam
    pub fn format_temporal(&self, kind: PropertyType, value: &Value) -> Result<Value, MapperError> {
        self.temporal.format_temporal(kind, value)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::generic()
    }
}
