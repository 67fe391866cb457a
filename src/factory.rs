//! Name-based mapper construction.
//!
//! A [`MapperFactory`] holds named model prototypes and named mapper
//! definitions plus the shared reader/writer connections and dialect, and
//! wires them into a [`Mapper`] on request:
//!
//! ```
//! use std::sync::Arc;
//! use dbmapper::factory::{BuildOptions, MapperFactory};
//! use dbmapper::test_helpers::RecordingExecutor;
//! use dbmapper::{MapperDefinition, Record};
//! use sea_query::Value;
//!
//! let mut factory = MapperFactory::new().with_reader(Arc::new(RecordingExecutor::new()));
//! factory.register_model("Widget", Record::builder().property("Id", Value::Int(None)).build());
//! factory.register_mapper::<Record>(
//!     "WidgetMapper",
//!     MapperDefinition::new("widgets", "Id").property("Id", ("id", "integer")),
//! );
//!
//! // "Widget" resolves to "WidgetMapper"; the model name is inferred
//! let widgets = factory.build::<Record>("Widget", BuildOptions::default()).unwrap();
//! assert_eq!(widgets.table(), "widgets");
//! ```

use crate::config::MapperConfig;
use crate::connection::ConnectionError;
use crate::dialect::Dialect;
use crate::executor::{MapperExecutor, MayPostgresExecutor};
use crate::mapper::definition::MapperDefinition;
use crate::mapper::error::MapperError;
use crate::mapper::{Mapper, DEFAULT_PAGE_SIZE};
use crate::model::Entity;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const MAPPER_SUFFIX: &str = "Mapper";

/// Error type for factory operations
#[derive(Debug)]
pub enum FactoryError {
    /// No model is registered under the name
    ModelNotFound(String),
    /// The registered model is not of the requested entity type
    ModelType {
        name: String,
        expected: &'static str,
    },
    /// Neither `name` nor `name + "Mapper"` is registered
    MapperNotFound(String),
    /// The registered mapper was declared for another entity type
    MapperContract {
        name: String,
        expected: &'static str,
        declared: &'static str,
    },
    /// The mapper definition or wiring is invalid
    Mapper(MapperError),
    /// Opening a configured connection failed
    Connection(ConnectionError),
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryError::ModelNotFound(name) => write!(f, "Model not found: {}", name),
            FactoryError::ModelType { name, expected } => {
                write!(f, "Model '{}' is not a {}", name, expected)
            }
            FactoryError::MapperNotFound(name) => write!(f, "Mapper not found: {}", name),
            FactoryError::MapperContract {
                name,
                expected,
                declared,
            } => write!(
                f,
                "Mapper '{}' maps {}, requested for {}",
                name, declared, expected
            ),
            FactoryError::Mapper(e) => write!(f, "{}", e),
            FactoryError::Connection(e) => write!(f, "Connection error: {}", e),
        }
    }
}

impl std::error::Error for FactoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FactoryError::Mapper(e) => Some(e),
            FactoryError::Connection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapperError> for FactoryError {
    fn from(err: MapperError) -> Self {
        FactoryError::Mapper(err)
    }
}

impl From<ConnectionError> for FactoryError {
    fn from(err: ConnectionError) -> Self {
        FactoryError::Connection(err)
    }
}

/// Where the prototype entity for a build comes from
pub enum ModelSource<E> {
    /// Use this prototype
    Explicit(E),
    /// Look up a registered model by name
    Named(String),
    /// Registered model named after the mapper, minus a trailing `Mapper`
    Inferred,
}

/// Per-build overrides
pub struct BuildOptions<E> {
    pub model: ModelSource<E>,
    pub reader: Option<Arc<dyn MapperExecutor>>,
    pub writer: Option<Arc<dyn MapperExecutor>>,
    pub dialect: Option<Dialect>,
}

impl<E> Default for BuildOptions<E> {
    fn default() -> Self {
        Self {
            model: ModelSource::Inferred,
            reader: None,
            writer: None,
            dialect: None,
        }
    }
}

impl<E> BuildOptions<E> {
    #[must_use]
    pub fn model(mut self, prototype: E) -> Self {
        self.model = ModelSource::Explicit(prototype);
        self
    }

    #[must_use]
    pub fn model_named(mut self, name: impl Into<String>) -> Self {
        self.model = ModelSource::Named(name.into());
        self
    }

    #[must_use]
    pub fn reader(mut self, reader: Arc<dyn MapperExecutor>) -> Self {
        self.reader = Some(reader);
        self
    }

    #[must_use]
    pub fn writer(mut self, writer: Arc<dyn MapperExecutor>) -> Self {
        self.writer = Some(writer);
        self
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }
}

struct RegisteredMapper {
    definition: MapperDefinition,
    entity: TypeId,
    entity_name: &'static str,
}

/// Registry of models and mapper definitions sharing connections and a dialect
pub struct MapperFactory {
    models: HashMap<String, Box<dyn Any + Send + Sync>>,
    mappers: HashMap<String, RegisteredMapper>,
    reader: Option<Arc<dyn MapperExecutor>>,
    writer: Option<Arc<dyn MapperExecutor>>,
    dialect: Dialect,
    default_page_size: u64,
}

impl Default for MapperFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperFactory {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            mappers: HashMap::new(),
            reader: None,
            writer: None,
            dialect: Dialect::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Open the configured connections and select the configured dialect
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Mapper` for an unknown dialect name and
    /// `FactoryError::Connection` when a connection cannot be opened.
    pub fn from_config(config: &MapperConfig) -> Result<Self, FactoryError> {
        let dialect = Dialect::from_name(&config.dialect)?;
        let reader: Arc<dyn MapperExecutor> = Arc::new(MayPostgresExecutor::connect(&config.reader_url)?);
        let writer: Arc<dyn MapperExecutor> = match config.writer_url.as_deref() {
            Some(url) if url != config.reader_url => Arc::new(MayPostgresExecutor::connect(url)?),
            _ => Arc::clone(&reader),
        };
        log::info!(
            "mapper factory ready: dialect {}, page size {}",
            dialect.engine(),
            config.default_page_size
        );
        Ok(Self::new()
            .with_reader(reader)
            .with_writer(writer)
            .with_dialect(dialect)
            .with_default_page_size(config.default_page_size))
    }

    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn MapperExecutor>) -> Self {
        self.reader = Some(reader);
        self
    }

    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn MapperExecutor>) -> Self {
        self.writer = Some(writer);
        self
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_default_page_size(mut self, page_size: u64) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Register a prototype entity under `name`, replacing any previous one
    pub fn register_model<E: Entity>(&mut self, name: impl Into<String>, prototype: E) {
        self.models.insert(name.into(), Box::new(prototype));
    }

    /// Register a mapper definition for entities of type `E`
    pub fn register_mapper<E: Entity>(&mut self, name: impl Into<String>, definition: MapperDefinition) {
        self.mappers.insert(
            name.into(),
            RegisteredMapper {
                definition,
                entity: TypeId::of::<E>(),
                entity_name: type_name::<E>(),
            },
        );
    }

    pub fn has_mapper(&self, name: &str) -> bool {
        self.resolve_mapper(name).is_some()
    }

    /// Build the mapper registered as `name` (or `name` + `Mapper`)
    ///
    /// # Errors
    ///
    /// See [`FactoryError`]. A missing reader (neither on the factory nor in
    /// `options`) is `FactoryError::Mapper(MapperError::Configuration)`.
    pub fn build<E: Entity>(&self, name: &str, options: BuildOptions<E>) -> Result<Mapper<E>, FactoryError> {
        let (mapper_name, registered) = self
            .resolve_mapper(name)
            .ok_or_else(|| FactoryError::MapperNotFound(name.to_string()))?;

        if registered.entity != TypeId::of::<E>() {
            return Err(FactoryError::MapperContract {
                name: mapper_name.to_string(),
                expected: type_name::<E>(),
                declared: registered.entity_name,
            });
        }

        let prototype = match options.model {
            ModelSource::Explicit(prototype) => prototype,
            ModelSource::Named(model) => self.model::<E>(&model)?,
            ModelSource::Inferred => self.model::<E>(name.strip_suffix(MAPPER_SUFFIX).unwrap_or(name))?,
        };

        let reader = options
            .reader
            .or_else(|| self.reader.clone())
            .ok_or_else(|| MapperError::Configuration(format!("no reader connection for '{}'", mapper_name)))?;
        let writer = options
            .writer
            .or_else(|| self.writer.clone())
            .unwrap_or_else(|| Arc::clone(&reader));
        let dialect = options.dialect.unwrap_or_else(|| self.dialect.clone());

        log::debug!("building {} on {} ({})", mapper_name, registered.definition.table(), dialect.engine());
        let mapper = Mapper::new(&registered.definition, prototype, reader)?
            .with_writer(writer)
            .with_dialect(dialect)
            .with_default_page_size(self.default_page_size);
        Ok(mapper)
    }

    fn resolve_mapper(&self, name: &str) -> Option<(String, &RegisteredMapper)> {
        if let Some(registered) = self.mappers.get(name) {
            return Some((name.to_string(), registered));
        }
        let suffixed = format!("{}{}", name, MAPPER_SUFFIX);
        self.mappers.get(&suffixed).map(|registered| (suffixed, registered))
    }

    fn model<E: Entity>(&self, name: &str) -> Result<E, FactoryError> {
        let model = self
            .models
            .get(name)
            .ok_or_else(|| FactoryError::ModelNotFound(name.to_string()))?;
        model
            .downcast_ref::<E>()
            .cloned()
            .ok_or_else(|| FactoryError::ModelType {
                name: name.to_string(),
                expected: type_name::<E>(),
            })
    }
}

impl fmt::Debug for MapperFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mappers: Vec<&str> = self.mappers.keys().map(String::as_str).collect();
        mappers.sort_unstable();
        f.debug_struct("MapperFactory")
            .field("mappers", &mappers)
            .field("models", &self.models.len())
            .field("dialect", &self.dialect.engine())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Row;
    use crate::model::{Record, ValidationErrors};
    use crate::test_helpers::RecordingExecutor;
    use sea_query::Value;

    #[derive(Clone)]
    struct Other;

    impl Entity for Other {
        fn has_property(&self, _name: &str) -> bool {
            false
        }
        fn get(&self, _name: &str) -> Option<Value> {
            None
        }
        fn set(&mut self, name: &str, _value: Value) -> Result<(), MapperError> {
            Err(MapperError::InvalidArgument(name.to_string()))
        }
        fn values(&self) -> Vec<(String, Value)> {
            Vec::new()
        }
        fn modified_values(&self) -> Vec<(String, Value)> {
            Vec::new()
        }
        fn validate(&self) -> Result<(), ValidationErrors> {
            Ok(())
        }
        fn mark_clean(&mut self) {}
    }

    fn widget() -> Record {
        Record::builder()
            .property("Id", Value::Int(None))
            .property("Name", Value::String(None))
            .build()
    }

    fn factory(reader: Arc<RecordingExecutor>) -> MapperFactory {
        let mut factory = MapperFactory::new().with_reader(reader);
        factory.register_model("Widget", widget());
        factory.register_model("Gadget", Other);
        factory.register_mapper::<Record>(
            "WidgetMapper",
            MapperDefinition::new("widgets", "Id")
                .property("Id", ("id", "integer"))
                .property("Name", "name"),
        );
        factory
    }

    #[test]
    fn test_resolves_suffixed_mapper_and_inferred_model() {
        let f = factory(Arc::new(RecordingExecutor::new()));
        let by_short = f.build::<Record>("Widget", BuildOptions::default()).unwrap();
        let by_full = f.build::<Record>("WidgetMapper", BuildOptions::default()).unwrap();
        assert_eq!(by_short.table(), "widgets");
        assert_eq!(by_full.get_new(), widget());
        assert!(f.has_mapper("Widget"));
    }

    #[test]
    fn test_unknown_mapper() {
        let f = factory(Arc::new(RecordingExecutor::new()));
        let err = f.build::<Record>("Sprocket", BuildOptions::default()).unwrap_err();
        assert!(matches!(err, FactoryError::MapperNotFound(name) if name == "Sprocket"));
    }

    #[test]
    fn test_unknown_and_mistyped_models() {
        let f = factory(Arc::new(RecordingExecutor::new()));
        let missing = f
            .build::<Record>("Widget", BuildOptions::default().model_named("Thing"))
            .unwrap_err();
        assert!(matches!(missing, FactoryError::ModelNotFound(_)));

        let mistyped = f
            .build::<Record>("Widget", BuildOptions::default().model_named("Gadget"))
            .unwrap_err();
        assert!(matches!(mistyped, FactoryError::ModelType { .. }));
    }

    #[test]
    fn test_mapper_declared_for_another_entity() {
        let f = factory(Arc::new(RecordingExecutor::new()));
        let err = f.build::<Other>("Widget", BuildOptions::default()).unwrap_err();
        assert!(matches!(err, FactoryError::MapperContract { .. }));
        assert!(err.to_string().contains("WidgetMapper"));
    }

    #[test]
    fn test_missing_reader_is_a_configuration_error() {
        let mut f = MapperFactory::new();
        f.register_mapper::<Record>("Widget", MapperDefinition::new("widgets", "Id").property("Id", "id"));
        let err = f
            .build::<Record>("Widget", BuildOptions::default().model(widget()))
            .unwrap_err();
        assert!(matches!(err, FactoryError::Mapper(MapperError::Configuration(_))));
    }

    #[test]
    fn test_invalid_definition_surfaces_as_mapper_error() {
        let mut f = MapperFactory::new().with_reader(Arc::new(RecordingExecutor::new()));
        f.register_mapper::<Record>("Broken", MapperDefinition::new("widgets", "Id").property("Name", "name"));
        let err = f
            .build::<Record>("Broken", BuildOptions::default().model(widget()))
            .unwrap_err();
        assert!(matches!(err, FactoryError::Mapper(MapperError::Configuration(_))));
    }

    #[test]
    fn test_build_overrides_wiring() {
        let shared = Arc::new(RecordingExecutor::new());
        let writer = Arc::new(RecordingExecutor::new());
        let f = factory(Arc::clone(&shared)).with_dialect(Dialect::mysql());
        let mapper = f
            .build::<Record>(
                "Widget",
                BuildOptions::default()
                    .writer(writer.clone())
                    .dialect(Dialect::sql_server()),
            )
            .unwrap();

        assert!(mapper.base_select().contains("[widgets].[id]"));
        shared.push_rows(vec![Row::new().with("Id", 1)]);
        assert_eq!(mapper.get_set(&[], &[], 1, 0).unwrap().len(), 1);
        mapper.delete_by_id(1).unwrap();
        assert_eq!(shared.statements().len(), 1);
        assert_eq!(writer.statements().len(), 1);
    }
}
