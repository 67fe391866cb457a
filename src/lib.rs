//! # dbmapper
//!
//! Per-entity SQL mapper. Callers describe what they want with property
//! names, [`Filter`]s and [`Sort`]s; a [`Mapper`] compiles that into
//! dialect-correct SQL with named `:placeholders`, runs it through a
//! [`MapperExecutor`] and hydrates [`Entity`] values from the rows.
//!
//! - `query`: filter, sort, join and property vocabulary; compiled [`Statement`]s
//! - `dialect`: identifier quoting, pagination and temporal formatting per engine
//! - `mapper`: definitions, compilation and the entity access operations
//! - `model`: the [`Entity`] trait and the [`Record`] property bag
//! - `executor`: the connection seam and its `may_postgres` implementation
//! - `factory`: name-based mapper wiring from shared connections
//! - `config`: `config/config.toml` + `DBMAPPER__*` settings

pub mod config;
pub mod connection;
pub mod dialect;
pub mod executor;
pub mod factory;
pub mod mapper;
pub mod metrics;
pub mod model;
pub mod query;
#[doc(hidden)]
pub mod test_helpers;

pub use config::MapperConfig;
pub use dialect::{Dialect, Engine};
pub use executor::{DriverError, MapperExecutor, MayPostgresExecutor, Row};
pub use factory::{BuildOptions, FactoryError, MapperFactory, ModelSource};
pub use mapper::definition::{MapperDefinition, Mapping, PropertyDef};
pub use mapper::error::MapperError;
pub use mapper::{Mapper, StatementKind};
pub use model::{Entity, Record, RecordBuilder, ValidationErrors};
pub use query::{
    Direction, Filter, FilterValue, Join, JoinType, Operator, Params, Property, PropertyType, Sort,
    Statement,
};
