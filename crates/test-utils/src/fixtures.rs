//! Common test fixtures for coverage catalog tests.
//!
//! The parameters and configurations below mirror the deployed tas and
//! cdds coverage families, trimmed to what the tests exercise.

use coverage_catalog::{
    Catalog, CatalogSettings, ConfigurationParameterCreate, ConfigurationParameterValueCreate,
    CoverageConfigurationCreate, DisplayMetadata, IdentifierOrder, PossibleValueCreate,
    RenderingMetadata,
};

/// Configuration names used by the fixtures.
pub mod names {
    pub const TAS_ENSEMBLE: &str = "tas_seasonal_anomaly_model_ensemble";
    pub const TAS_ENSEMBLE_LOWER: &str = "tas_seasonal_anomaly_model_ensemble_lower_uncertainty";
    pub const TAS_ENSEMBLE_UPPER: &str = "tas_seasonal_anomaly_model_ensemble_upper_uncertainty";
    pub const TAS_EC_EARTH_CCLM4: &str = "tas_seasonal_anomaly_model_ec_earth_cclm4_8_17";
    pub const TAS_EC_EARTH_RCA4: &str = "tas_seasonal_anomaly_model_ec_earth_rca4";
    pub const CDDS_ENSEMBLE: &str = "cdds_annual_absolute_model_ensemble";
}

/// Identifiers quoted by the deployed fixtures (alphabetical parameter order).
pub mod identifiers {
    pub const TAS_ENSEMBLE_RCP26_DJF: &str =
        "tas_seasonal_anomaly_model_ensemble-annual-model_ensemble-tas-anomaly-rcp26-DJF";
    pub const TAS_ENSEMBLE_LOWER_RCP26_DJF: &str =
        "tas_seasonal_anomaly_model_ensemble_lower_uncertainty-annual-model_ensemble-tas-anomaly-rcp26-lower_bound-DJF";
    pub const TAS_ENSEMBLE_UPPER_RCP26_DJF: &str =
        "tas_seasonal_anomaly_model_ensemble_upper_uncertainty-annual-model_ensemble-tas-anomaly-rcp26-upper_bound-DJF";
    pub const CDDS_ENSEMBLE_RCP45_YEAR: &str = "cdds_annual_absolute_model_ensemble-rcp45-year";
}

pub const SEASONS: [&str; 4] = ["DJF", "MAM", "JJA", "SON"];
pub const SCENARIOS: [&str; 3] = ["rcp26", "rcp45", "rcp85"];

fn value(internal: &str, english: &str, italian: &str) -> ConfigurationParameterValueCreate {
    ConfigurationParameterValueCreate::new(internal).with_display_name(english, italian)
}

fn parameter(
    name: &str,
    english: &str,
    italian: &str,
    values: Vec<ConfigurationParameterValueCreate>,
) -> ConfigurationParameterCreate {
    ConfigurationParameterCreate {
        name: name.to_string(),
        metadata: DisplayMetadata {
            display_name_english: english.to_string(),
            display_name_italian: italian.to_string(),
            ..Default::default()
        },
        allowed_values: values,
    }
}

/// Every configuration parameter used by the fixture configurations.
pub fn configuration_parameters() -> Vec<ConfigurationParameterCreate> {
    vec![
        parameter(
            "climatological_variable",
            "Variable",
            "Variabile",
            vec![
                value("cdds", "CDDs", "CDDs"),
                value("tas", "TAS", "TAS"),
            ],
        ),
        parameter(
            "scenario",
            "Scenario",
            "Scenario",
            vec![
                value("rcp26", "RCP2.6", "RCP2.6"),
                value("rcp45", "RCP4.5", "RCP4.5"),
                value("rcp85", "RCP8.5", "RCP8.5"),
            ],
        ),
        parameter(
            "year_period",
            "Year period",
            "Periodo dell'anno",
            vec![
                value("DJF", "Winter", "Inverno"),
                value("MAM", "Spring", "Primavera"),
                value("JJA", "Summer", "Estate"),
                value("SON", "Autumn", "Autunno"),
                value("year", "Year", "Anno"),
            ],
        ),
        parameter(
            "measure",
            "Measurement type",
            "Tipo di misura",
            vec![
                value("absolute", "Absolute value", "Valore assoluto"),
                value("anomaly", "Climatological anomaly", "Anomalia climatologica"),
            ],
        ),
        parameter(
            "climatological_model",
            "Forecast model",
            "Modello di previsione",
            vec![
                value("model_ensemble", "5 Model ensemble", "Insieme di 5 modelli"),
                value("ec_earth_cclm_4_8_17", "EC-EARTH CCLM4-8-17", "EC-EARTH CCLM4-8-17"),
                value("ec_earth_rca4", "EC-EARTH RCA4", "EC-EARTH RCA4"),
            ],
        ),
        parameter(
            "aggregation_period",
            "Temporal aggregation period",
            "Periodo di aggregazione temporale",
            vec![
                value("30yr", "30 Years", "30 Anni"),
                value("annual", "Annual", "Annuale"),
            ],
        ),
        parameter(
            "uncertainty_type",
            "Uncertainty type",
            "Tipo di incertezza",
            vec![
                value("lower_bound", "Uncertainty lower bounds", "Limiti inferiori dell'incertezza"),
                value("upper_bound", "Uncertainty upper bounds", "Limiti superiori dell'incertezza"),
            ],
        ),
    ]
}

fn configuration(
    name: &str,
    dataset: &str,
    pattern: &str,
    pairs: &[(&str, &str)],
) -> CoverageConfigurationCreate {
    CoverageConfigurationCreate {
        name: name.to_string(),
        metadata: DisplayMetadata::default(),
        netcdf_main_dataset_name: dataset.to_string(),
        thredds_url_pattern: pattern.to_string(),
        wms_main_layer_name: Some(dataset.to_string()),
        wms_secondary_layer_name: None,
        rendering: RenderingMetadata {
            unit: "ºC".to_string(),
            palette: "default/seq-YlOrRd".to_string(),
            color_scale_min: 0.0,
            color_scale_max: 6.0,
        },
        possible_values: pairs
            .iter()
            .map(|(p, v)| PossibleValueCreate::new(*p, *v))
            .collect(),
    }
}

fn tas_seasonal_pairs(model: &str, scenarios: &[&'static str]) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("climatological_variable", "tas".to_string()),
        ("aggregation_period", "annual".to_string()),
        ("measure", "anomaly".to_string()),
        ("climatological_model", model.to_string()),
    ];
    pairs.extend(scenarios.iter().map(|s| ("scenario", s.to_string())));
    pairs.extend(SEASONS.iter().map(|s| ("year_period", s.to_string())));
    pairs
}

fn tas_configuration(
    name: &str,
    pattern: &str,
    model: &str,
    scenarios: &[&'static str],
    uncertainty: Option<&str>,
) -> CoverageConfigurationCreate {
    let mut pairs = tas_seasonal_pairs(model, scenarios);
    if let Some(bound) = uncertainty {
        pairs.push(("uncertainty_type", bound.to_string()));
    }
    let pairs: Vec<(&str, &str)> = pairs.iter().map(|(p, v)| (*p, v.as_str())).collect();
    configuration(name, "tas", pattern, &pairs)
}

/// Seasonal tas anomaly configurations: the model ensemble with its two
/// uncertainty bounds, plus two regional models.
pub fn tas_configurations() -> Vec<CoverageConfigurationCreate> {
    vec![
        tas_configuration(
            names::TAS_ENSEMBLE,
            "ens5ym/clipped/tas_anom_pp_ts_{scenario}_{year_period}_VFVGTAA.nc",
            "model_ensemble",
            &SCENARIOS,
            None,
        ),
        tas_configuration(
            names::TAS_ENSEMBLE_LOWER,
            "ens5ym/std/clipped/tas_anom_stddown_pp_ts_{scenario}_{year_period}_VFVGTAA.nc",
            "model_ensemble",
            &SCENARIOS,
            Some("lower_bound"),
        ),
        tas_configuration(
            names::TAS_ENSEMBLE_UPPER,
            "ens5ym/std/clipped/tas_anom_stdup_pp_ts_{scenario}_{year_period}_VFVGTAA.nc",
            "model_ensemble",
            &SCENARIOS,
            Some("upper_bound"),
        ),
        tas_configuration(
            names::TAS_EC_EARTH_CCLM4,
            "EC-EARTH_CCLM4-8-17ym/clipped/tas_EC-EARTH_CCLM4-8-17_{scenario}_{year_period}_anomaly_pp_VFVGTAA.nc",
            "ec_earth_cclm_4_8_17",
            &SCENARIOS,
            None,
        ),
        tas_configuration(
            names::TAS_EC_EARTH_RCA4,
            "EC-EARTH_RCA4ym/clipped/tas_EC-EARTH_RCA4_{scenario}_{year_period}_anomaly_pp_VFVGTAA.nc",
            "ec_earth_rca4",
            &["rcp45", "rcp85"],
            None,
        ),
    ]
}

/// The annual cdds model ensemble: three scenarios, one year period.
pub fn cdds_configurations() -> Vec<CoverageConfigurationCreate> {
    vec![configuration(
        names::CDDS_ENSEMBLE,
        "cdds",
        "ensymbc/clipped/ecacdd_{scenario}_{year_period}_ts19762100_ls_VFVG.nc",
        &[
            ("scenario", "rcp26"),
            ("scenario", "rcp45"),
            ("scenario", "rcp85"),
            ("year_period", "year"),
        ],
    )]
}

/// `(configuration, lower bound, upper bound)`
pub fn uncertainty_map() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![(
        names::TAS_ENSEMBLE,
        names::TAS_ENSEMBLE_LOWER,
        names::TAS_ENSEMBLE_UPPER,
    )]
}

/// Related configurations, stored in both directions.
pub fn related_map() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (
            names::TAS_ENSEMBLE,
            vec![names::TAS_EC_EARTH_CCLM4, names::TAS_EC_EARTH_RCA4],
        ),
        (
            names::TAS_EC_EARTH_CCLM4,
            vec![names::TAS_ENSEMBLE, names::TAS_EC_EARTH_RCA4],
        ),
        (
            names::TAS_EC_EARTH_RCA4,
            vec![names::TAS_ENSEMBLE, names::TAS_EC_EARTH_CCLM4],
        ),
    ]
}

/// Build the full fixture catalog with the given settings.
pub fn build_catalog(settings: CatalogSettings) -> Catalog {
    let mut catalog = Catalog::new(settings);
    for parameter in configuration_parameters() {
        catalog
            .create_parameter(parameter)
            .expect("fixture parameter should be valid");
    }
    for configuration in tas_configurations().into_iter().chain(cdds_configurations()) {
        catalog
            .create_configuration(configuration)
            .expect("fixture configuration should be valid");
    }
    for (name, lower, upper) in uncertainty_map() {
        catalog
            .set_uncertainty_bounds(name, Some(lower), Some(upper))
            .expect("fixture uncertainty bounds should resolve");
    }
    for (name, related) in related_map() {
        catalog
            .set_related(name, related)
            .expect("fixture relations should resolve");
    }
    catalog
}

/// Fixture catalog using the identifier order of the deployed fixtures.
pub fn fixture_catalog() -> Catalog {
    build_catalog(CatalogSettings::default().with_identifier_order(IdentifierOrder::Alphabetical))
}
