//! Coverage configurations.
//!
//! A coverage configuration describes one family of datasets: a THREDDS URL
//! pattern plus the set of `(parameter, value)` pairs that are legal for it.
//! The same parameter may appear several times with different values,
//! meaning any one of them is legal.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::parameter::{DisplayMetadata, ParameterId, ParameterValueId};
use crate::pattern::CompiledPattern;
use crate::settings::IdentifierOrder;

/// Unique identifier for a coverage configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigurationId(pub Uuid);

impl ConfigurationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConfigurationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Junction row declaring one legal `(parameter, value)` pair.
///
/// Names are stored next to the ids so identifier work never has to go back
/// to the parameter catalog; the catalog keeps them in sync on edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossibleValue {
    pub parameter_id: ParameterId,
    pub value_id: ParameterValueId,
    pub parameter_name: String,
    pub internal_value: String,
}

/// Reference to a `(parameter, value)` pair by name, as found in YAML files
/// and creation requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PossibleValueCreate {
    pub parameter: String,
    pub value: String,
}

impl PossibleValueCreate {
    pub fn new(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

/// Rendering hints used by the map proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingMetadata {
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub palette: String,
    #[serde(default)]
    pub color_scale_min: f64,
    #[serde(default = "default_color_scale_max")]
    pub color_scale_max: f64,
}

fn default_color_scale_max() -> f64 {
    1.0
}

impl Default for RenderingMetadata {
    fn default() -> Self {
        Self {
            unit: String::new(),
            palette: String::new(),
            color_scale_min: 0.0,
            color_scale_max: default_color_scale_max(),
        }
    }
}

/// Input for creating a coverage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageConfigurationCreate {
    pub name: String,
    #[serde(flatten)]
    pub metadata: DisplayMetadata,
    pub netcdf_main_dataset_name: String,
    pub thredds_url_pattern: String,
    #[serde(default)]
    pub wms_main_layer_name: Option<String>,
    #[serde(default)]
    pub wms_secondary_layer_name: Option<String>,
    #[serde(flatten)]
    pub rendering: RenderingMetadata,
    #[serde(default)]
    pub possible_values: Vec<PossibleValueCreate>,
}

/// A named coverage template.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageConfiguration {
    pub id: ConfigurationId,
    pub name: String,
    pub metadata: DisplayMetadata,
    pub netcdf_main_dataset_name: String,
    pub thredds_url_pattern: CompiledPattern,
    pub wms_main_layer_name: Option<String>,
    pub wms_secondary_layer_name: Option<String>,
    pub rendering: RenderingMetadata,
    /// Legal pairs, in declaration order
    pub possible_values: Vec<PossibleValue>,
    pub uncertainty_lower_bounds: Option<ConfigurationId>,
    pub uncertainty_upper_bounds: Option<ConfigurationId>,
    /// Directed references to sibling configurations
    pub related: Vec<ConfigurationId>,
}

/// Check a configuration name against `^[a-z][a-z0-9_]*$`.
pub fn validate_configuration_name(name: &str) -> CatalogResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CatalogError::InvalidConfigurationName(name.to_string()))
    }
}

impl CoverageConfiguration {
    /// Parameter names that make up identifiers of this configuration, in
    /// identifier order.
    pub fn identifier_parameters(&self, order: IdentifierOrder) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.thredds_url_pattern.placeholder_names() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        for pv in &self.possible_values {
            if !names.contains(&pv.parameter_name.as_str()) {
                names.push(&pv.parameter_name);
            }
        }
        if order == IdentifierOrder::Alphabetical {
            names.sort_unstable();
        }
        names
    }

    /// Canonical identifier template, e.g. `{name}-{scenario}-{year_period}`.
    pub fn coverage_id_pattern(&self, order: IdentifierOrder) -> String {
        std::iter::once("{name}".to_string())
            .chain(
                self.identifier_parameters(order)
                    .into_iter()
                    .map(|p| format!("{{{}}}", p)),
            )
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Legal values of a parameter, sorted lexicographically and deduplicated.
    pub fn legal_values(&self, parameter: &str) -> Vec<&str> {
        let mut values: Vec<&str> = self
            .possible_values
            .iter()
            .filter(|pv| pv.parameter_name == parameter)
            .map(|pv| pv.internal_value.as_str())
            .collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// The junction row for a legal pair, if any.
    pub fn possible_value(&self, parameter: &str, value: &str) -> Option<&PossibleValue> {
        self.possible_values
            .iter()
            .find(|pv| pv.parameter_name == parameter && pv.internal_value == value)
    }

    pub fn is_legal(&self, parameter: &str, value: &str) -> bool {
        self.possible_value(parameter, value).is_some()
    }

    /// Whether any possible value is declared for the parameter.
    pub fn declares_parameter(&self, parameter: &str) -> bool {
        self.possible_values
            .iter()
            .any(|pv| pv.parameter_name == parameter)
    }

    /// The first legal value of a parameter in sorted order.
    pub fn first_legal_value(&self, parameter: &str) -> Option<&PossibleValue> {
        self.possible_values
            .iter()
            .filter(|pv| pv.parameter_name == parameter)
            .min_by(|a, b| a.internal_value.cmp(&b.internal_value))
    }

    /// Whether the configuration holds any reference to `other`.
    pub fn references(&self, other: ConfigurationId) -> bool {
        self.uncertainty_lower_bounds == Some(other)
            || self.uncertainty_upper_bounds == Some(other)
            || self.related.contains(&other)
    }

    /// Drop every reference to `other`. Returns true if something was removed.
    pub(crate) fn forget(&mut self, other: ConfigurationId) -> bool {
        let mut changed = false;
        if self.uncertainty_lower_bounds == Some(other) {
            self.uncertainty_lower_bounds = None;
            changed = true;
        }
        if self.uncertainty_upper_bounds == Some(other) {
            self.uncertainty_upper_bounds = None;
            changed = true;
        }
        let before = self.related.len();
        self.related.retain(|id| *id != other);
        changed || self.related.len() != before
    }
}
