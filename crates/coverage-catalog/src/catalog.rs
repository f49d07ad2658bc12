//! The catalog arena.
//!
//! Owns every configuration parameter and coverage configuration, keyed by
//! id with name indices for registry lookup. All cross-references between
//! entities are ids into this arena; deletions cascade explicitly.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::configuration::{
    validate_configuration_name, ConfigurationId, CoverageConfiguration,
    CoverageConfigurationCreate, PossibleValue,
};
use crate::error::{CatalogError, CatalogResult};
use crate::identifier::{
    Assignment, CoverageIdentifiers, IdentifierEngine, ValueConstraints, IDENTIFIER_SEPARATOR,
};
use crate::parameter::{
    ConfigurationParameter, ConfigurationParameterCreate, ConfigurationParameterValue,
    ConfigurationParameterValueCreate, ConfigurationParameterValueUpdate, ParameterId,
    ParameterValueId,
};
use crate::pattern::{CompiledPattern, PlaceholderValues};
use crate::relations::RelationResolver;
use crate::settings::CatalogSettings;

// ============================================================================
// Coverage
// ============================================================================

/// Seasonal aggregation carried by a coverage's year period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Parse a season code (`DJF`, `MAM`, `JJA`, `SON`) or name, ignoring case.
    pub fn from_year_period(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "djf" | "winter" => Some(Season::Winter),
            "mam" | "spring" => Some(Season::Spring),
            "jja" | "summer" => Some(Season::Summer),
            "son" | "autumn" => Some(Season::Autumn),
            _ => None,
        }
    }

    /// Three-month code.
    pub fn code(&self) -> &'static str {
        match self {
            Season::Winter => "DJF",
            Season::Spring => "MAM",
            Season::Summer => "JJA",
            Season::Autumn => "SON",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A resolved coverage identifier.
#[derive(Debug, Clone)]
pub struct Coverage<'a> {
    pub configuration: &'a CoverageConfiguration,
    pub identifier: String,
    pub assignment: Assignment,
    season_parameter: &'a str,
}

impl<'a> Coverage<'a> {
    pub(crate) fn new(
        configuration: &'a CoverageConfiguration,
        identifier: String,
        assignment: Assignment,
        season_parameter: &'a str,
    ) -> Self {
        Self {
            configuration,
            identifier,
            assignment,
            season_parameter,
        }
    }

    /// The dataset path obtained by rendering the THREDDS URL pattern.
    pub fn url_fragment(&self) -> CatalogResult<String> {
        self.configuration.thredds_url_pattern.render(&self.assignment)
    }

    /// The season this coverage aggregates over, if it is a seasonal one.
    pub fn season(&self) -> Option<Season> {
        let value = match self.assignment.get(self.season_parameter) {
            Some(value) => value,
            None => {
                debug!(
                    coverage = %self.identifier,
                    parameter = %self.season_parameter,
                    "Coverage has no year period"
                );
                return None;
            }
        };
        let season = Season::from_year_period(value);
        if season.is_none() {
            warn!(
                coverage = %self.identifier,
                year_period = %value,
                "Year period is not a season"
            );
        }
        season
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Filter for [`Catalog::list_coverage_identifiers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageListFilter {
    /// Only list identifiers of this configuration
    pub configuration: Option<String>,
    /// Every substring must occur in the configuration name
    pub name_contains: Vec<String>,
    /// `(parameter, value)` pairs; alternatives within a parameter, all parameters required
    pub possible_values: Vec<(String, String)>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// One page of coverage identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageIdentifierPage {
    pub items: Vec<String>,
    /// Identifiers matching the filter, before pagination
    pub filtered_total: usize,
    /// Identifiers of every configuration considered, before filtering by value
    pub unfiltered_total: usize,
}

// ============================================================================
// Validation
// ============================================================================

/// A consistency problem found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogIssue {
    /// A URL placeholder has no declared possible value, so the
    /// configuration produces no identifiers.
    PlaceholderWithoutValues {
        configuration: String,
        placeholder: String,
    },
    /// An uncertainty-bound target declares no uncertainty parameter values.
    UncertaintyBoundWithoutType {
        configuration: String,
        target: String,
        parameter: String,
    },
    SelfReference { configuration: String },
    /// `configuration` lists `target` as related but not the other way around.
    AsymmetricRelation {
        configuration: String,
        target: String,
    },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::PlaceholderWithoutValues {
                configuration,
                placeholder,
            } => write!(
                f,
                "{}: placeholder '{}' has no possible values",
                configuration, placeholder
            ),
            CatalogIssue::UncertaintyBoundWithoutType {
                configuration,
                target,
                parameter,
            } => write!(
                f,
                "{}: uncertainty bound '{}' declares no '{}' values",
                configuration, target, parameter
            ),
            CatalogIssue::SelfReference { configuration } => {
                write!(f, "{}: references itself", configuration)
            }
            CatalogIssue::AsymmetricRelation {
                configuration,
                target,
            } => write!(
                f,
                "{}: related to '{}' but not the other way around",
                configuration, target
            ),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// In-memory registry of configuration parameters and coverage configurations.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    settings: CatalogSettings,
    engine: IdentifierEngine,
    parameters: HashMap<ParameterId, ConfigurationParameter>,
    parameter_names: BTreeMap<String, ParameterId>,
    configurations: HashMap<ConfigurationId, CoverageConfiguration>,
    configuration_names: BTreeMap<String, ConfigurationId>,
}

impl Catalog {
    pub fn new(settings: CatalogSettings) -> Self {
        Self {
            engine: IdentifierEngine::new(settings.identifier_order),
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub fn engine(&self) -> &IdentifierEngine {
        &self.engine
    }

    pub fn relations(&self) -> RelationResolver<'_> {
        RelationResolver::new(self)
    }

    // === Parameters ===

    /// Register a parameter with its values. Fails without side effects if
    /// the name or any value is invalid.
    pub fn create_parameter(
        &mut self,
        create: ConfigurationParameterCreate,
    ) -> CatalogResult<ParameterId> {
        if self.parameter_names.contains_key(&create.name) {
            return Err(CatalogError::DuplicateParameter(create.name));
        }
        let parameter = ConfigurationParameter::new(create)?;
        let id = parameter.id;
        info!(
            parameter = %parameter.name,
            values = parameter.allowed_values.len(),
            "Created configuration parameter"
        );
        self.parameter_names.insert(parameter.name.clone(), id);
        self.parameters.insert(id, parameter);
        Ok(id)
    }

    pub fn add_parameter_value(
        &mut self,
        parameter: &str,
        create: ConfigurationParameterValueCreate,
    ) -> CatalogResult<ParameterValueId> {
        let parameter = self.parameter_mut(parameter)?;
        let value = parameter.add_value(create)?;
        debug!(value = %value.internal_value, "Added configuration parameter value");
        Ok(value.id)
    }

    /// Edit a value. A new internal value is propagated to every
    /// configuration that declares it.
    pub fn update_parameter_value(
        &mut self,
        parameter: &str,
        internal_value: &str,
        update: ConfigurationParameterValueUpdate,
    ) -> CatalogResult<()> {
        let parameter = self.parameter_mut(parameter)?;
        let value_id = parameter
            .value(internal_value)
            .map(|v| v.id)
            .ok_or_else(|| CatalogError::UnknownParameterValue {
                parameter: parameter.name.clone(),
                value: internal_value.to_string(),
            })?;
        let renamed = parameter.update_value(value_id, update)?;

        if let Some(previous) = renamed {
            let current = parameter
                .value_by_id(value_id)
                .map(|v| v.internal_value.clone())
                .unwrap_or_default();
            let mut rows = 0;
            for configuration in self.configurations.values_mut() {
                for pv in configuration
                    .possible_values
                    .iter_mut()
                    .filter(|pv| pv.value_id == value_id)
                {
                    pv.internal_value = current.clone();
                    rows += 1;
                }
            }
            info!(
                from = %previous,
                to = %current,
                possible_values = rows,
                "Renamed configuration parameter value"
            );
        }
        Ok(())
    }

    pub fn get_parameter(&self, name: &str) -> Option<&ConfigurationParameter> {
        self.parameter_names
            .get(name)
            .and_then(|id| self.parameters.get(id))
    }

    pub fn get_parameter_by_id(&self, id: ParameterId) -> Option<&ConfigurationParameter> {
        self.parameters.get(&id)
    }

    /// Look up a value by parameter name and internal value.
    pub fn get_value(
        &self,
        parameter: &str,
        internal_value: &str,
    ) -> Option<&ConfigurationParameterValue> {
        self.get_parameter(parameter)?.value(internal_value)
    }

    /// All parameters, in name order.
    pub fn parameters(&self) -> impl Iterator<Item = &ConfigurationParameter> {
        self.parameter_names
            .values()
            .filter_map(|id| self.parameters.get(id))
    }

    /// Delete a parameter, its values and every possible-value row using them.
    pub fn delete_parameter(&mut self, name: &str) -> CatalogResult<ConfigurationParameter> {
        let id = self
            .parameter_names
            .remove(name)
            .ok_or_else(|| CatalogError::UnknownParameter(name.to_string()))?;
        let parameter = self
            .parameters
            .remove(&id)
            .ok_or_else(|| CatalogError::UnknownParameter(name.to_string()))?;

        let rows = self.remove_possible_values(|pv| pv.parameter_id == id);
        info!(
            parameter = %name,
            values = parameter.allowed_values.len(),
            possible_values = rows,
            "Deleted configuration parameter"
        );
        Ok(parameter)
    }

    /// Delete one value and every possible-value row using it.
    pub fn delete_parameter_value(
        &mut self,
        parameter: &str,
        internal_value: &str,
    ) -> CatalogResult<ConfigurationParameterValue> {
        let param = self.parameter_mut(parameter)?;
        let value_id = param
            .value(internal_value)
            .map(|v| v.id)
            .ok_or_else(|| CatalogError::UnknownParameterValue {
                parameter: parameter.to_string(),
                value: internal_value.to_string(),
            })?;
        let value = param
            .remove_value(value_id)
            .ok_or_else(|| CatalogError::UnknownParameterValue {
                parameter: parameter.to_string(),
                value: internal_value.to_string(),
            })?;

        let rows = self.remove_possible_values(|pv| pv.value_id == value_id);
        info!(
            parameter = %parameter,
            value = %internal_value,
            possible_values = rows,
            "Deleted configuration parameter value"
        );
        Ok(value)
    }

    fn parameter_mut(&mut self, name: &str) -> CatalogResult<&mut ConfigurationParameter> {
        self.parameter_names
            .get(name)
            .and_then(|id| self.parameters.get_mut(id))
            .ok_or_else(|| CatalogError::UnknownParameter(name.to_string()))
    }

    fn remove_possible_values<F>(&mut self, doomed: F) -> usize
    where
        F: Fn(&PossibleValue) -> bool,
    {
        let mut removed = 0;
        for configuration in self.configurations.values_mut() {
            let before = configuration.possible_values.len();
            configuration.possible_values.retain(|pv| !doomed(pv));
            let dropped = before - configuration.possible_values.len();
            if dropped > 0 {
                debug!(
                    configuration = %configuration.name,
                    possible_values = dropped,
                    "Removed possible values"
                );
            }
            removed += dropped;
        }
        removed
    }

    // === Configurations ===

    /// Register a coverage configuration.
    ///
    /// Every URL placeholder must name a known parameter and every
    /// possible-value pair must resolve to an existing value. Repeated
    /// pairs are kept once.
    pub fn create_configuration(
        &mut self,
        create: CoverageConfigurationCreate,
    ) -> CatalogResult<ConfigurationId> {
        validate_configuration_name(&create.name)?;
        if self.configuration_names.contains_key(&create.name) {
            return Err(CatalogError::DuplicateConfiguration(create.name));
        }

        let pattern = CompiledPattern::compile(&create.thredds_url_pattern)?;
        if let Some(unknown) = pattern
            .placeholder_names()
            .iter()
            .find(|name| !self.parameter_names.contains_key(name.as_str()))
        {
            return Err(CatalogError::UnknownParameter(unknown.clone()));
        }

        let mut possible_values: Vec<PossibleValue> =
            Vec::with_capacity(create.possible_values.len());
        for pair in &create.possible_values {
            let parameter = self
                .get_parameter(&pair.parameter)
                .ok_or_else(|| CatalogError::UnknownParameter(pair.parameter.clone()))?;
            let value =
                parameter
                    .value(&pair.value)
                    .ok_or_else(|| CatalogError::UnknownParameterValue {
                        parameter: pair.parameter.clone(),
                        value: pair.value.clone(),
                    })?;
            if possible_values.iter().any(|pv| pv.value_id == value.id) {
                continue;
            }
            possible_values.push(PossibleValue {
                parameter_id: parameter.id,
                value_id: value.id,
                parameter_name: parameter.name.clone(),
                internal_value: value.internal_value.clone(),
            });
        }

        let configuration = CoverageConfiguration {
            id: ConfigurationId::new(),
            name: create.name,
            metadata: create.metadata,
            netcdf_main_dataset_name: create.netcdf_main_dataset_name,
            thredds_url_pattern: pattern,
            wms_main_layer_name: create.wms_main_layer_name,
            wms_secondary_layer_name: create.wms_secondary_layer_name,
            rendering: create.rendering,
            possible_values,
            uncertainty_lower_bounds: None,
            uncertainty_upper_bounds: None,
            related: Vec::new(),
        };
        let id = configuration.id;
        info!(
            configuration = %configuration.name,
            possible_values = configuration.possible_values.len(),
            identifiers = ?self.engine.count(&configuration).ok(),
            "Created coverage configuration"
        );
        self.configuration_names
            .insert(configuration.name.clone(), id);
        self.configurations.insert(id, configuration);
        Ok(id)
    }

    /// Point a configuration at its uncertainty-bound siblings. `None` clears a bound.
    pub fn set_uncertainty_bounds(
        &mut self,
        configuration: &str,
        lower: Option<&str>,
        upper: Option<&str>,
    ) -> CatalogResult<()> {
        let lower = lower.map(|name| self.configuration_id(name)).transpose()?;
        let upper = upper.map(|name| self.configuration_id(name)).transpose()?;
        let target = self.configuration_mut(configuration)?;
        target.uncertainty_lower_bounds = lower;
        target.uncertainty_upper_bounds = upper;
        debug!(configuration = %configuration, "Set uncertainty bounds");
        Ok(())
    }

    /// Replace the related configurations of a configuration.
    pub fn set_related<I, S>(&mut self, configuration: &str, related: I) -> CatalogResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = Vec::new();
        for name in related {
            let id = self.configuration_id(name.as_ref())?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let target = self.configuration_mut(configuration)?;
        debug!(configuration = %configuration, related = ids.len(), "Set related configurations");
        target.related = ids;
        Ok(())
    }

    pub fn get_configuration(&self, name: &str) -> Option<&CoverageConfiguration> {
        self.configuration_names
            .get(name)
            .and_then(|id| self.configurations.get(id))
    }

    pub fn get_configuration_by_id(&self, id: ConfigurationId) -> Option<&CoverageConfiguration> {
        self.configurations.get(&id)
    }

    /// All configurations, in name order.
    pub fn configurations(&self) -> impl Iterator<Item = &CoverageConfiguration> {
        self.configuration_names
            .values()
            .filter_map(|id| self.configurations.get(id))
    }

    pub fn configuration_count(&self) -> usize {
        self.configurations.len()
    }

    /// Delete a configuration and its possible-value rows, and drop every
    /// reference other configurations hold to it. Parameters are untouched.
    pub fn delete_configuration(&mut self, name: &str) -> CatalogResult<CoverageConfiguration> {
        let id = self
            .configuration_names
            .remove(name)
            .ok_or_else(|| CatalogError::UnknownConfiguration(name.to_string()))?;
        let removed = self
            .configurations
            .remove(&id)
            .ok_or_else(|| CatalogError::UnknownConfiguration(name.to_string()))?;

        let mut referrers = 0;
        for other in self.configurations.values_mut() {
            if other.forget(id) {
                debug!(
                    configuration = %other.name,
                    removed = %name,
                    "Cleared reference to deleted configuration"
                );
                referrers += 1;
            }
        }
        info!(
            configuration = %name,
            possible_values = removed.possible_values.len(),
            referrers,
            "Deleted coverage configuration"
        );
        Ok(removed)
    }

    fn configuration_id(&self, name: &str) -> CatalogResult<ConfigurationId> {
        self.configuration_names
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::UnknownConfiguration(name.to_string()))
    }

    fn configuration_mut(&mut self, name: &str) -> CatalogResult<&mut CoverageConfiguration> {
        self.configuration_names
            .get(name)
            .and_then(|id| self.configurations.get_mut(id))
            .ok_or_else(|| CatalogError::UnknownConfiguration(name.to_string()))
    }

    fn require_configuration(&self, name: &str) -> CatalogResult<&CoverageConfiguration> {
        self.get_configuration(name)
            .ok_or_else(|| CatalogError::UnknownConfiguration(name.to_string()))
    }

    // === Identifiers ===

    /// Every identifier of a configuration, lazily.
    pub fn coverage_identifiers(&self, configuration: &str) -> CatalogResult<CoverageIdentifiers<'_>> {
        self.engine.generate(self.require_configuration(configuration)?)
    }

    pub fn count_coverage_identifiers(&self, configuration: &str) -> CatalogResult<usize> {
        self.engine.count(self.require_configuration(configuration)?)
    }

    pub fn coverage_id_pattern(&self, configuration: &str) -> CatalogResult<String> {
        Ok(self
            .require_configuration(configuration)?
            .coverage_id_pattern(self.engine.order()))
    }

    /// Build an identifier of a configuration from explicit parameter values.
    pub fn build_identifier<V>(&self, configuration: &str, values: &V) -> CatalogResult<String>
    where
        V: PlaceholderValues + ?Sized,
    {
        self.engine
            .build(self.require_configuration(configuration)?, values)
    }

    /// Resolve an identifier to its configuration and parameter values.
    ///
    /// The configuration name is everything before the first `-`; it must
    /// match a registered name exactly.
    pub fn get_coverage(&self, identifier: &str) -> CatalogResult<Coverage<'_>> {
        let name = identifier
            .split_once(IDENTIFIER_SEPARATOR)
            .map_or(identifier, |(name, _)| name);
        let configuration = self
            .get_configuration(name)
            .ok_or_else(|| CatalogError::UnknownConfiguration(name.to_string()))?;
        let assignment = self.engine.parse(identifier, configuration)?;
        Ok(Coverage::new(
            configuration,
            identifier.to_string(),
            assignment,
            &self.settings.season_parameter_name,
        ))
    }

    /// Resolve an identifier straight to its THREDDS dataset path.
    pub fn resolve_url_fragment(&self, identifier: &str) -> CatalogResult<String> {
        self.get_coverage(identifier)?.url_fragment()
    }

    /// List identifiers across configurations, in configuration name order.
    ///
    /// Fails when a selected configuration's identifiers cannot be counted.
    pub fn list_coverage_identifiers(
        &self,
        filter: &CoverageListFilter,
    ) -> CatalogResult<CoverageIdentifierPage> {
        let mut constraints = ValueConstraints::new();
        for (parameter, value) in &filter.possible_values {
            if self.get_value(parameter, value).is_some() {
                constraints.allow(parameter.as_str(), value.as_str());
            } else {
                debug!(
                    parameter = %parameter,
                    value = %value,
                    "Ignoring unknown possible value in listing filter"
                );
            }
        }

        let selected: Vec<&CoverageConfiguration> = self
            .configurations()
            .filter(|c| {
                filter
                    .configuration
                    .as_deref()
                    .map_or(true, |name| c.name == name)
            })
            .filter(|c| {
                filter
                    .name_contains
                    .iter()
                    .all(|fragment| c.name.contains(fragment.as_str()))
            })
            .collect();

        let unfiltered_total = selected.iter().try_fold(0usize, |acc, c| {
            acc.checked_add(self.engine.count(c)?)
                .ok_or_else(|| CatalogError::IdentifierSpaceTooLarge(c.name.clone()))
        })?;

        let mut filtered_total = 0usize;
        let mut skip = filter.offset;
        let mut items = Vec::new();
        let limit = filter.limit.unwrap_or(usize::MAX);

        for configuration in selected {
            let mut identifiers = self.engine.generate_filtered(configuration, &constraints)?;
            let len = identifiers.len();
            filtered_total += len;

            if skip >= len {
                skip -= len;
                continue;
            }
            if skip > 0 {
                // Position the iterator without materializing the skipped items.
                identifiers.nth(skip - 1);
                skip = 0;
            }
            let room = limit - items.len();
            items.extend(identifiers.take(room));
        }

        Ok(CoverageIdentifierPage {
            items,
            filtered_total,
            unfiltered_total,
        })
    }

    // === Validation ===

    /// Collect every consistency problem of the catalog.
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let uncertainty = &self.settings.uncertainty_parameter_name;

        for configuration in self.configurations() {
            for placeholder in configuration.thredds_url_pattern.placeholder_names() {
                if !configuration.declares_parameter(placeholder) {
                    issues.push(CatalogIssue::PlaceholderWithoutValues {
                        configuration: configuration.name.clone(),
                        placeholder: placeholder.clone(),
                    });
                }
            }

            if configuration.references(configuration.id) {
                issues.push(CatalogIssue::SelfReference {
                    configuration: configuration.name.clone(),
                });
            }

            for bound in [
                configuration.uncertainty_lower_bounds,
                configuration.uncertainty_upper_bounds,
            ]
            .into_iter()
            .flatten()
            {
                if let Some(target) = self.configurations.get(&bound) {
                    if !target.declares_parameter(uncertainty) {
                        issues.push(CatalogIssue::UncertaintyBoundWithoutType {
                            configuration: configuration.name.clone(),
                            target: target.name.clone(),
                            parameter: uncertainty.clone(),
                        });
                    }
                }
            }

            for related in &configuration.related {
                if let Some(target) = self.configurations.get(related) {
                    if target.id != configuration.id && !target.related.contains(&configuration.id)
                    {
                        issues.push(CatalogIssue::AsymmetricRelation {
                            configuration: configuration.name.clone(),
                            target: target.name.clone(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            debug!("Catalog is consistent");
        } else {
            warn!(issues = issues.len(), "Catalog has consistency issues");
        }
        issues
    }
}
