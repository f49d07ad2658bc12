//! Catalog lifecycle, listing and YAML loading.

use coverage_catalog::{
    load_catalog_from_dir, CatalogIssue, CatalogSettings, ConfigurationParameterValueUpdate,
    CoverageListFilter, IdentifierOrder, Season,
};
use test_utils::{
    assert_catalog_err, fixture_catalog, identifiers, names, sample_catalog_dir,
    temp_catalog_dir,
};

fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(p, v)| (p.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_everything() {
    let catalog = fixture_catalog();
    let page = catalog.list_coverage_identifiers(&CoverageListFilter::default()).unwrap();
    assert_eq!(page.filtered_total, 59);
    assert_eq!(page.unfiltered_total, 59);
    assert_eq!(page.items.len(), 59);
    // Configurations come in name order.
    assert!(page.items[0].starts_with(names::CDDS_ENSEMBLE));
}

#[test]
fn test_list_by_possible_values() {
    let catalog = fixture_catalog();
    let page = catalog.list_coverage_identifiers(&CoverageListFilter {
        possible_values: pairs(&[("scenario", "rcp26"), ("year_period", "DJF")]),
        ..Default::default()
    }).unwrap();
    assert_eq!(
        page.items,
        [
            "tas_seasonal_anomaly_model_ec_earth_cclm4_8_17-annual-ec_earth_cclm_4_8_17-tas-anomaly-rcp26-DJF",
            identifiers::TAS_ENSEMBLE_RCP26_DJF,
            identifiers::TAS_ENSEMBLE_LOWER_RCP26_DJF,
            identifiers::TAS_ENSEMBLE_UPPER_RCP26_DJF,
        ]
    );
    assert_eq!(page.filtered_total, 4);
}

#[test]
fn test_list_values_of_one_parameter_are_alternatives() {
    let catalog = fixture_catalog();
    let page = catalog.list_coverage_identifiers(&CoverageListFilter {
        configuration: Some(names::TAS_ENSEMBLE.to_string()),
        possible_values: pairs(&[("year_period", "DJF"), ("year_period", "JJA")]),
        ..Default::default()
    }).unwrap();
    assert_eq!(page.filtered_total, 6);
    assert_eq!(page.unfiltered_total, 12);
}

#[test]
fn test_list_parameter_not_used_by_configuration() {
    let catalog = fixture_catalog();
    let page = catalog.list_coverage_identifiers(&CoverageListFilter {
        possible_values: pairs(&[("measure", "anomaly")]),
        ..Default::default()
    }).unwrap();
    // cdds declares no measure at all and is left out.
    assert_eq!(page.filtered_total, 56);
    assert!(page.items.iter().all(|id| id.starts_with("tas_")));
}

#[test]
fn test_list_ignores_unknown_pairs() {
    let catalog = fixture_catalog();
    let page = catalog.list_coverage_identifiers(&CoverageListFilter {
        configuration: Some(names::CDDS_ENSEMBLE.to_string()),
        possible_values: pairs(&[("scenario", "rcp60"), ("color", "blue")]),
        ..Default::default()
    }).unwrap();
    assert_eq!(page.filtered_total, 3);
}

#[test]
fn test_list_name_contains_and_pagination() {
    let catalog = fixture_catalog();
    let filter = CoverageListFilter {
        name_contains: vec!["tas".to_string(), "uncertainty".to_string()],
        offset: 10,
        limit: Some(4),
        ..Default::default()
    };
    let page = catalog.list_coverage_identifiers(&filter).unwrap();
    assert_eq!(page.filtered_total, 24);
    assert_eq!(page.items.len(), 4);
    assert!(page.items[0].starts_with(names::TAS_ENSEMBLE_LOWER));
    assert!(page.items[3].starts_with(names::TAS_ENSEMBLE_UPPER));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_delete_value_shrinks_identifier_space() {
    let mut catalog = fixture_catalog();
    catalog.delete_parameter_value("scenario", "rcp26").unwrap();

    assert_eq!(catalog.count_coverage_identifiers(names::TAS_ENSEMBLE).unwrap(), 8);
    assert_eq!(catalog.count_coverage_identifiers(names::CDDS_ENSEMBLE).unwrap(), 2);
    assert_catalog_err!(
        catalog.get_coverage(identifiers::TAS_ENSEMBLE_RCP26_DJF),
        InvalidCoverageIdentifier
    );
}

#[test]
fn test_delete_parameter_keeps_configurations() {
    let mut catalog = fixture_catalog();
    catalog.delete_parameter("uncertainty_type").unwrap();

    assert!(catalog.get_configuration(names::TAS_ENSEMBLE_LOWER).is_some());
    assert_eq!(
        catalog.validate(),
        [
            CatalogIssue::UncertaintyBoundWithoutType {
                configuration: names::TAS_ENSEMBLE.to_string(),
                target: names::TAS_ENSEMBLE_LOWER.to_string(),
                parameter: "uncertainty_type".to_string(),
            },
            CatalogIssue::UncertaintyBoundWithoutType {
                configuration: names::TAS_ENSEMBLE.to_string(),
                target: names::TAS_ENSEMBLE_UPPER.to_string(),
                parameter: "uncertainty_type".to_string(),
            },
        ]
    );
}

#[test]
fn test_delete_configuration_keeps_parameters() {
    let mut catalog = fixture_catalog();
    let removed = catalog.delete_configuration(names::TAS_EC_EARTH_RCA4).unwrap();
    assert_eq!(removed.name, names::TAS_EC_EARTH_RCA4);

    assert!(catalog.get_value("climatological_model", "ec_earth_rca4").is_some());
    let ensemble = catalog.get_configuration(names::TAS_ENSEMBLE).unwrap();
    assert_eq!(ensemble.related.len(), 1);
    assert!(catalog.validate().is_empty());
}

#[test]
fn test_value_metadata_update() {
    let mut catalog = fixture_catalog();
    let mut metadata = catalog
        .get_value("year_period", "DJF")
        .unwrap()
        .metadata
        .clone();
    metadata.description_english = "December, January, February".to_string();
    catalog
        .update_parameter_value(
            "year_period",
            "DJF",
            ConfigurationParameterValueUpdate {
                internal_value: None,
                metadata: Some(metadata),
            },
        )
        .unwrap();

    let value = catalog.get_value("year_period", "DJF").unwrap();
    assert_eq!(value.metadata.description_english, "December, January, February");
    assert_eq!(value.metadata.display_name_english, "Winter");
}

#[test]
fn test_coverage_season() {
    let catalog = fixture_catalog();
    let seasonal = catalog
        .get_coverage(identifiers::TAS_ENSEMBLE_RCP26_DJF)
        .unwrap();
    assert_eq!(seasonal.season(), Some(Season::Winter));

    let annual = catalog
        .get_coverage(identifiers::CDDS_ENSEMBLE_RCP45_YEAR)
        .unwrap();
    assert_eq!(annual.season(), None);
}

// ============================================================================
// YAML loading
// ============================================================================

const PARAMETERS: &str = r#"
parameters:
  - name: scenario
    allowed_values:
      - internal_value: rcp26
      - internal_value: rcp85
  - name: uncertainty_type
    allowed_values:
      - internal_value: lower_bound
      - internal_value: upper_bound
"#;

#[test]
fn test_sample_catalog_matches_fixtures() {
    let settings = CatalogSettings::default().with_identifier_order(IdentifierOrder::Alphabetical);
    let loaded = load_catalog_from_dir(sample_catalog_dir(), settings).unwrap();
    let fixture = fixture_catalog();

    assert_eq!(loaded.configuration_count(), fixture.configuration_count());
    assert!(loaded.validate().is_empty());
    for configuration in fixture.configurations() {
        let expected: Vec<String> = fixture.engine().generate(configuration).unwrap().collect();
        let actual: Vec<String> = loaded
            .coverage_identifiers(&configuration.name)
            .unwrap()
            .collect();
        assert_eq!(actual, expected, "{}", configuration.name);
    }

    let relations = loaded
        .relations()
        .resolve(identifiers::TAS_ENSEMBLE_RCP26_DJF)
        .unwrap();
    assert_eq!(
        relations.uncertainty.lower.as_deref(),
        Some(identifiers::TAS_ENSEMBLE_LOWER_RCP26_DJF)
    );
}

#[test]
fn test_references_resolve_across_files() {
    // a.yaml refers forward to configurations defined in b.yaml.
    let dir = temp_catalog_dir(
        PARAMETERS,
        &[
            (
                "a.yaml",
                r#"
configurations:
  - name: tas
    netcdf_main_dataset_name: tas
    thredds_url_pattern: tas_{scenario}.nc
    possible_values:
      - { parameter: scenario, value: rcp26 }
      - { parameter: scenario, value: rcp85 }
    uncertainty_lower_bounds: tas_lower
    uncertainty_upper_bounds: tas_upper
"#,
            ),
            (
                "b.yml",
                r#"
configurations:
  - name: tas_lower
    netcdf_main_dataset_name: tas
    thredds_url_pattern: tas_stddown_{scenario}.nc
    possible_values:
      - { parameter: scenario, value: rcp26 }
      - { parameter: scenario, value: rcp85 }
      - { parameter: uncertainty_type, value: lower_bound }
  - name: tas_upper
    netcdf_main_dataset_name: tas
    thredds_url_pattern: tas_stdup_{scenario}.nc
    possible_values:
      - { parameter: scenario, value: rcp26 }
      - { parameter: scenario, value: rcp85 }
      - { parameter: uncertainty_type, value: upper_bound }
"#,
            ),
            ("notes.txt", "not a catalog file"),
        ],
    );

    let catalog = load_catalog_from_dir(dir.path(), CatalogSettings::default()).unwrap();
    assert_eq!(catalog.configuration_count(), 3);
    let relations = catalog.relations().resolve("tas-rcp85").unwrap();
    assert_eq!(
        relations.uncertainty.lower.as_deref(),
        Some("tas_lower-rcp85-lower_bound")
    );
    assert_eq!(
        relations.uncertainty.upper.as_deref(),
        Some("tas_upper-rcp85-upper_bound")
    );
}

#[test]
fn test_env_vars_expanded_in_patterns() {
    std::env::set_var("COVERAGE_CATALOG_TEST_TAS_ROOT", "ens5ym/clipped");
    let dir = temp_catalog_dir(
        PARAMETERS,
        &[(
            "tas.yaml",
            r#"
configurations:
  - name: tas
    netcdf_main_dataset_name: tas
    thredds_url_pattern: ${COVERAGE_CATALOG_TEST_TAS_ROOT}/tas_{scenario}.nc
    possible_values:
      - { parameter: scenario, value: rcp26 }
"#,
        )],
    );
    let catalog = load_catalog_from_dir(dir.path(), CatalogSettings::default()).unwrap();
    assert_eq!(
        catalog.resolve_url_fragment("tas-rcp26").unwrap(),
        "ens5ym/clipped/tas_rcp26.nc"
    );
}

#[test]
fn test_unknown_reference_fails() {
    let dir = temp_catalog_dir(
        PARAMETERS,
        &[(
            "tas.yaml",
            r#"
configurations:
  - name: tas
    netcdf_main_dataset_name: tas
    thredds_url_pattern: tas_{scenario}.nc
    possible_values:
      - { parameter: scenario, value: rcp26 }
    related: [pr]
"#,
        )],
    );
    assert_catalog_err!(
        load_catalog_from_dir(dir.path(), CatalogSettings::default()),
        UnknownConfiguration
    );
}

#[test]
fn test_invalid_files_fail() {
    let hyphenated = temp_catalog_dir(
        "parameters:\n  - name: period\n    allowed_values:\n      - internal_value: 1981-2010\n",
        &[],
    );
    assert_catalog_err!(
        load_catalog_from_dir(hyphenated.path(), CatalogSettings::default()),
        InvalidValue
    );

    let malformed = temp_catalog_dir("parameters: {", &[]);
    assert_catalog_err!(
        load_catalog_from_dir(malformed.path(), CatalogSettings::default()),
        Config
    );

    assert_catalog_err!(
        load_catalog_from_dir("/nonexistent/catalog", CatalogSettings::default()),
        Config
    );
}
