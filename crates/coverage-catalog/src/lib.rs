//! Coverage identifier catalog.
//!
//! Coverage configurations are templates over enumerated configuration
//! parameters. This crate generates and parses the identifiers of every
//! legal parameter combination, resolves an identifier to its THREDDS
//! dataset path, and derives uncertainty-bound and related coverages.

pub mod catalog;
pub mod configuration;
pub mod error;
pub mod identifier;
pub mod loader;
pub mod parameter;
pub mod pattern;
pub mod relations;
pub mod settings;
pub mod thredds;

pub use catalog::{
    Catalog, CatalogIssue, Coverage, CoverageIdentifierPage, CoverageListFilter, Season,
};
pub use configuration::{
    ConfigurationId, CoverageConfiguration, CoverageConfigurationCreate, PossibleValue,
    PossibleValueCreate, RenderingMetadata,
};
pub use error::{CatalogError, CatalogResult};
pub use identifier::{
    Assignment, Axis, CoverageIdentifiers, IdentifierEngine, ValueConstraints,
    IDENTIFIER_SEPARATOR,
};
pub use loader::load_catalog_from_dir;
pub use parameter::{
    ConfigurationParameter, ConfigurationParameterCreate, ConfigurationParameterValue,
    ConfigurationParameterValueCreate, ConfigurationParameterValueUpdate, DisplayMetadata,
    ParameterId, ParameterValueId,
};
pub use pattern::{CompiledPattern, PlaceholderValues};
pub use relations::{CoverageRelations, RelatedCoverage, RelationResolver, UncertaintyBounds};
pub use settings::{CatalogSettings, IdentifierOrder, ThreddsSettings};
pub use thredds::{DatasetUrls, ThreddsService, ThreddsUrlBuilder};
