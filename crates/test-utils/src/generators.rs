//! Synthetic catalog generators.
//!
//! These build catalogs of a chosen shape with predictable names, so
//! benchmarks and property-style tests can scale the identifier space
//! without hand-writing fixtures.

use coverage_catalog::{
    Catalog, CatalogSettings, ConfigurationParameterCreate, CoverageConfigurationCreate,
    PossibleValueCreate,
};

/// Name of the `index`-th synthetic parameter: `p0`, `p1`, ...
pub fn synthetic_parameter_name(index: usize) -> String {
    format!("p{}", index)
}

/// Name of the `index`-th value of a synthetic parameter: `v00`, `v01`, ...
pub fn synthetic_value(index: usize) -> String {
    format!("v{:02}", index)
}

/// Creates a catalog with one configuration named `synthetic` whose
/// identifier space is `values_per_parameter ^ parameters`.
///
/// Half of the parameters (rounded up) appear as URL placeholders, the rest
/// only in the possible values.
///
/// # Example
///
/// ```
/// use test_utils::synthetic_catalog;
///
/// let catalog = synthetic_catalog(3, 4);
/// assert_eq!(catalog.count_coverage_identifiers("synthetic").unwrap(), 64);
/// ```
pub fn synthetic_catalog(parameters: usize, values_per_parameter: usize) -> Catalog {
    let mut catalog = Catalog::new(CatalogSettings::default());
    let values: Vec<String> = (0..values_per_parameter).map(synthetic_value).collect();
    let value_refs: Vec<&str> = values.iter().map(String::as_str).collect();

    let mut pattern = String::from("synthetic");
    let mut possible_values = Vec::new();
    for index in 0..parameters {
        let name = synthetic_parameter_name(index);
        catalog
            .create_parameter(ConfigurationParameterCreate::with_values(
                name.as_str(),
                &value_refs,
            ))
            .expect("synthetic parameter should be valid");
        if index < parameters.div_ceil(2) {
            pattern.push_str(&format!("_{{{}}}", name));
        }
        // Declared in reverse so declaration order differs from sorted order.
        for value in values.iter().rev() {
            possible_values.push(PossibleValueCreate::new(name.as_str(), value.as_str()));
        }
    }
    pattern.push_str(".nc");

    catalog
        .create_configuration(CoverageConfigurationCreate {
            name: "synthetic".to_string(),
            netcdf_main_dataset_name: "synthetic".to_string(),
            thredds_url_pattern: pattern,
            possible_values,
            ..Default::default()
        })
        .expect("synthetic configuration should be valid");
    catalog
}
