//! Uncertainty-bound and related coverages.
//!
//! Both relations project a source coverage onto a target configuration.
//! An identifier parameter the source does not assign takes the target's
//! first legal value in sorted order. A source value that is not legal in
//! the target also falls back for related coverages, but omits an
//! uncertainty bound: a bound always describes the same coverage as its
//! source. A relation whose projection cannot be completed is omitted,
//! never reported as an error.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Catalog, Coverage};
use crate::configuration::{ConfigurationId, CoverageConfiguration};
use crate::error::{CatalogError, CatalogResult};
use crate::identifier::Assignment;

/// Identifiers of the lower and upper uncertainty siblings of a coverage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UncertaintyBounds {
    pub lower: Option<String>,
    pub upper: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedCoverage {
    pub configuration: String,
    pub identifier: String,
}

/// Everything reachable from one coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageRelations {
    pub identifier: String,
    pub uncertainty: UncertaintyBounds,
    pub related: Vec<RelatedCoverage>,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

impl Bound {
    fn as_str(&self) -> &'static str {
        match self {
            Bound::Lower => "lower",
            Bound::Upper => "upper",
        }
    }
}

/// What a projection does with a source value the target does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    /// Give up on the target.
    Strict,
    /// Use the target's first legal value instead.
    Lenient,
}

/// Computes relations against the configurations of a catalog.
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> RelationResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolve an identifier and compute all its relations.
    pub fn resolve(&self, identifier: &str) -> CatalogResult<CoverageRelations> {
        let coverage = self.catalog.get_coverage(identifier)?;
        Ok(CoverageRelations {
            identifier: coverage.identifier.clone(),
            uncertainty: self.uncertainty_bounds(&coverage)?,
            related: self.related(&coverage),
        })
    }

    /// The uncertainty siblings of a coverage.
    ///
    /// An undeclared bound is `None`. A declared bound whose configuration
    /// has no uncertainty parameter values is a catalog error.
    pub fn uncertainty_bounds(&self, coverage: &Coverage<'_>) -> CatalogResult<UncertaintyBounds> {
        let configuration = coverage.configuration;
        Ok(UncertaintyBounds {
            lower: self.bound(
                coverage,
                configuration.uncertainty_lower_bounds,
                Bound::Lower,
            )?,
            upper: self.bound(
                coverage,
                configuration.uncertainty_upper_bounds,
                Bound::Upper,
            )?,
        })
    }

    fn bound(
        &self,
        coverage: &Coverage<'_>,
        target: Option<ConfigurationId>,
        bound: Bound,
    ) -> CatalogResult<Option<String>> {
        let Some(target_id) = target else {
            return Ok(None);
        };
        let Some(target) = self.catalog.get_configuration_by_id(target_id) else {
            warn!(
                coverage = %coverage.identifier,
                bound = bound.as_str(),
                "Uncertainty bound points to a missing configuration"
            );
            return Ok(None);
        };

        let settings = self.catalog.settings();
        let parameter = settings.uncertainty_parameter_name.as_str();
        let wanted = match bound {
            Bound::Lower => settings.lower_bound_value.as_str(),
            Bound::Upper => settings.upper_bound_value.as_str(),
        };
        let value = if target.is_legal(parameter, wanted) {
            wanted
        } else {
            match target.first_legal_value(parameter) {
                Some(pv) => pv.internal_value.as_str(),
                None => {
                    return Err(CatalogError::MissingUncertaintyType {
                        configuration: target.name.clone(),
                        parameter: parameter.to_string(),
                    })
                }
            }
        };

        let identifier = self.project(
            &coverage.assignment,
            target,
            Some((parameter, value)),
            Projection::Strict,
        );
        if identifier.is_none() {
            warn!(
                coverage = %coverage.identifier,
                target = %target.name,
                bound = bound.as_str(),
                "Uncertainty bound omitted"
            );
        }
        Ok(identifier)
    }

    /// The related siblings of a coverage, in declaration order.
    pub fn related(&self, coverage: &Coverage<'_>) -> Vec<RelatedCoverage> {
        let mut related = Vec::new();
        for id in &coverage.configuration.related {
            let Some(target) = self.catalog.get_configuration_by_id(*id) else {
                warn!(
                    coverage = %coverage.identifier,
                    "Related configuration is missing"
                );
                continue;
            };
            match self.project(&coverage.assignment, target, None, Projection::Lenient) {
                Some(identifier) => related.push(RelatedCoverage {
                    configuration: target.name.clone(),
                    identifier,
                }),
                None => warn!(
                    coverage = %coverage.identifier,
                    target = %target.name,
                    "Related coverage omitted"
                ),
            }
        }
        related
    }

    /// Project an assignment onto `target`, optionally forcing one value.
    fn project(
        &self,
        source: &Assignment,
        target: &CoverageConfiguration,
        force: Option<(&str, &str)>,
        mode: Projection,
    ) -> Option<String> {
        let engine = self.catalog.engine();
        let mut values: BTreeMap<String, String> = BTreeMap::new();

        for parameter in target.identifier_parameters(engine.order()) {
            let forced = force
                .filter(|(name, _)| *name == parameter)
                .map(|(_, value)| value);
            let kept = match source.get(parameter) {
                Some(value) if target.is_legal(parameter, value) => Some(value),
                Some(value) if forced.is_none() && mode == Projection::Strict => {
                    warn!(
                        target = %target.name,
                        parameter = %parameter,
                        source_value = %value,
                        "Source value is not legal in target"
                    );
                    return None;
                }
                _ => None,
            };

            let value = match forced.or(kept) {
                Some(value) => value,
                None => match target.first_legal_value(parameter) {
                    Some(pv) => {
                        debug!(
                            target = %target.name,
                            parameter = %parameter,
                            source_value = source.get(parameter).unwrap_or(""),
                            fallback = %pv.internal_value,
                            "Using first legal value"
                        );
                        pv.internal_value.as_str()
                    }
                    None => {
                        warn!(
                            target = %target.name,
                            parameter = %parameter,
                            "No legal value to fall back on"
                        );
                        return None;
                    }
                },
            };
            values.insert(parameter.to_string(), value.to_string());
        }

        match engine.build(target, &values) {
            Ok(identifier) => Some(identifier),
            Err(err) => {
                warn!(target = %target.name, error = %err, "Projection failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{CoverageConfigurationCreate, PossibleValueCreate};
    use crate::parameter::ConfigurationParameterCreate;
    use crate::settings::CatalogSettings;

    fn create(name: &str, pattern: &str, pairs: &[(&str, &str)]) -> CoverageConfigurationCreate {
        CoverageConfigurationCreate {
            name: name.to_string(),
            netcdf_main_dataset_name: "data".to_string(),
            thredds_url_pattern: pattern.to_string(),
            possible_values: pairs
                .iter()
                .map(|(p, v)| PossibleValueCreate::new(*p, *v))
                .collect(),
            ..Default::default()
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(CatalogSettings::default());
        for (name, values) in [
            ("scenario", &["rcp26", "rcp45", "rcp85"][..]),
            ("year_period", &["DJF", "JJA", "year"][..]),
            ("climatological_model", &["ec_earth_cclm4_8_17", "model_ensemble"][..]),
            ("uncertainty_type", &["lower_bound", "upper_bound"][..]),
        ] {
            catalog
                .create_parameter(ConfigurationParameterCreate::with_values(name, values))
                .unwrap();
        }

        catalog
            .create_configuration(create(
                "tas_ensemble",
                "ens/tas_{scenario}_{year_period}.nc",
                &[
                    ("climatological_model", "model_ensemble"),
                    ("scenario", "rcp26"),
                    ("scenario", "rcp85"),
                    ("year_period", "DJF"),
                    ("year_period", "JJA"),
                ],
            ))
            .unwrap();
        for (name, bound) in [
            ("tas_ensemble_lower", "lower_bound"),
            ("tas_ensemble_upper", "upper_bound"),
        ] {
            catalog
                .create_configuration(create(
                    name,
                    "ens/tas_stddown_{scenario}_{year_period}.nc",
                    &[
                        ("climatological_model", "model_ensemble"),
                        ("scenario", "rcp26"),
                        ("scenario", "rcp85"),
                        ("year_period", "DJF"),
                        ("year_period", "JJA"),
                        ("uncertainty_type", bound),
                    ],
                ))
                .unwrap();
        }
        catalog
            .create_configuration(create(
                "tas_ec_earth",
                "rcm/tas_EC-EARTH_{scenario}_{year_period}.nc",
                &[
                    ("climatological_model", "ec_earth_cclm4_8_17"),
                    ("scenario", "rcp45"),
                    ("scenario", "rcp85"),
                    ("year_period", "DJF"),
                    ("year_period", "JJA"),
                ],
            ))
            .unwrap();
        catalog
            .set_uncertainty_bounds(
                "tas_ensemble",
                Some("tas_ensemble_lower"),
                Some("tas_ensemble_upper"),
            )
            .unwrap();
        catalog
            .set_related("tas_ensemble", ["tas_ec_earth"])
            .unwrap();
        catalog
    }

    #[test]
    fn test_uncertainty_bounds_swap_only_uncertainty_type() {
        let catalog = catalog();
        let relations = catalog
            .relations()
            .resolve("tas_ensemble-rcp85-JJA-model_ensemble")
            .unwrap();
        assert_eq!(
            relations.uncertainty.lower.as_deref(),
            Some("tas_ensemble_lower-rcp85-JJA-model_ensemble-lower_bound")
        );
        assert_eq!(
            relations.uncertainty.upper.as_deref(),
            Some("tas_ensemble_upper-rcp85-JJA-model_ensemble-upper_bound")
        );
    }

    #[test]
    fn test_undeclared_bounds_are_none() {
        let catalog = catalog();
        let coverage = catalog
            .get_coverage("tas_ec_earth-rcp45-DJF-ec_earth_cclm4_8_17")
            .unwrap();
        let bounds = catalog.relations().uncertainty_bounds(&coverage).unwrap();
        assert_eq!(bounds, UncertaintyBounds::default());
        assert!(catalog.relations().related(&coverage).is_empty());
    }

    #[test]
    fn test_related_falls_back_to_first_legal_value() {
        let catalog = catalog();
        let resolver = catalog.relations();

        let kept = resolver
            .resolve("tas_ensemble-rcp85-DJF-model_ensemble")
            .unwrap();
        assert_eq!(
            kept.related,
            [RelatedCoverage {
                configuration: "tas_ec_earth".to_string(),
                identifier: "tas_ec_earth-rcp85-DJF-ec_earth_cclm4_8_17".to_string(),
            }]
        );

        // rcp26 is not legal for the EC-EARTH configuration; rcp45 sorts first.
        let fallback = resolver
            .resolve("tas_ensemble-rcp26-DJF-model_ensemble")
            .unwrap();
        assert_eq!(
            fallback.related[0].identifier,
            "tas_ec_earth-rcp45-DJF-ec_earth_cclm4_8_17"
        );
    }

    #[test]
    fn test_bound_missing_source_value_is_omitted() {
        let mut catalog = catalog();
        catalog
            .create_configuration(create(
                "tas_ensemble_lower_rcp26",
                "ens/tas_stddown_{scenario}_{year_period}.nc",
                &[
                    ("climatological_model", "model_ensemble"),
                    ("scenario", "rcp26"),
                    ("year_period", "DJF"),
                    ("year_period", "JJA"),
                    ("uncertainty_type", "lower_bound"),
                ],
            ))
            .unwrap();
        catalog
            .set_uncertainty_bounds(
                "tas_ensemble",
                Some("tas_ensemble_lower_rcp26"),
                Some("tas_ensemble_upper"),
            )
            .unwrap();
        let resolver = catalog.relations();

        let covered = resolver
            .resolve("tas_ensemble-rcp26-JJA-model_ensemble")
            .unwrap();
        assert_eq!(
            covered.uncertainty.lower.as_deref(),
            Some("tas_ensemble_lower_rcp26-rcp26-JJA-model_ensemble-lower_bound")
        );

        // No rcp85 lower bound exists; rcp26 must not stand in for it.
        let uncovered = resolver
            .resolve("tas_ensemble-rcp85-JJA-model_ensemble")
            .unwrap();
        assert_eq!(uncovered.uncertainty.lower, None);
        assert_eq!(
            uncovered.uncertainty.upper.as_deref(),
            Some("tas_ensemble_upper-rcp85-JJA-model_ensemble-upper_bound")
        );
    }

    #[test]
    fn test_bound_fills_parameter_missing_from_source() {
        let mut catalog = catalog();
        catalog
            .create_configuration(create(
                "tas_ec_earth_lower",
                "rcm/tas_EC-EARTH_stddown_{scenario}_{year_period}.nc",
                &[
                    ("climatological_model", "ec_earth_cclm4_8_17"),
                    ("scenario", "rcp45"),
                    ("year_period", "DJF"),
                    ("uncertainty_type", "lower_bound"),
                ],
            ))
            .unwrap();
        catalog
            .create_configuration(create(
                "tas_rcp45",
                "rcm/tas_{scenario}_{year_period}.nc",
                &[("scenario", "rcp45"), ("year_period", "DJF")],
            ))
            .unwrap();
        catalog
            .set_uncertainty_bounds("tas_rcp45", Some("tas_ec_earth_lower"), None)
            .unwrap();

        // The source has no climatological_model, so the bound's only model is used.
        let relations = catalog.relations().resolve("tas_rcp45-rcp45-DJF").unwrap();
        assert_eq!(
            relations.uncertainty.lower.as_deref(),
            Some("tas_ec_earth_lower-rcp45-DJF-ec_earth_cclm4_8_17-lower_bound")
        );
    }

    #[test]
    fn test_bound_without_uncertainty_type_is_an_error() {
        let mut catalog = catalog();
        catalog
            .set_uncertainty_bounds("tas_ensemble", Some("tas_ec_earth"), None)
            .unwrap();
        let coverage = catalog
            .get_coverage("tas_ensemble-rcp85-DJF-model_ensemble")
            .unwrap();
        let result = catalog.relations().uncertainty_bounds(&coverage);
        assert!(matches!(
            result,
            Err(CatalogError::MissingUncertaintyType { .. })
        ));
    }

    #[test]
    fn test_unprojectable_related_is_omitted() {
        let mut catalog = catalog();
        catalog.delete_parameter_value("year_period", "JJA").unwrap();
        catalog.delete_parameter_value("year_period", "DJF").unwrap();
        catalog
            .create_configuration(create(
                "tas_annual",
                "ens/tas_{scenario}.nc",
                &[("scenario", "rcp26"), ("year_period", "year")],
            ))
            .unwrap();
        catalog
            .set_related("tas_annual", ["tas_ensemble"])
            .unwrap();

        let coverage = catalog.get_coverage("tas_annual-rcp26-year").unwrap();
        assert!(catalog.relations().related(&coverage).is_empty());
    }
}
