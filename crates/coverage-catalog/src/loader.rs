//! YAML catalog loader.
//!
//! Layout of a catalog directory:
//! - `parameters.yaml`: every configuration parameter with its values
//! - `configurations/*.yaml`: coverage configurations, one file per family
//!
//! Configurations refer to their uncertainty bounds and related siblings by
//! name; those references are resolved once every file has been read, so
//! their order does not matter. `${VAR}` and `${VAR:-default}` are expanded
//! from the environment before parsing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::configuration::CoverageConfigurationCreate;
use crate::error::{CatalogError, CatalogResult};
use crate::parameter::ConfigurationParameterCreate;
use crate::settings::CatalogSettings;

pub const PARAMETERS_FILE: &str = "parameters.yaml";
pub const CONFIGURATIONS_DIR: &str = "configurations";

// ============================================================================
// File formats
// ============================================================================

/// Contents of `parameters.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParametersFile {
    #[serde(default)]
    pub parameters: Vec<ConfigurationParameterCreate>,
}

/// Contents of one file under `configurations/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationsFile {
    #[serde(default)]
    pub configurations: Vec<ConfigurationEntry>,
}

/// A configuration plus its by-name references to other configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationEntry {
    #[serde(flatten)]
    pub configuration: CoverageConfigurationCreate,
    #[serde(default)]
    pub uncertainty_lower_bounds: Option<String>,
    #[serde(default)]
    pub uncertainty_upper_bounds: Option<String>,
    #[serde(default)]
    pub related: Vec<String>,
}

// ============================================================================
// Loading
// ============================================================================

/// Load a whole catalog directory.
pub fn load_catalog_from_dir<P: AsRef<Path>>(
    dir: P,
    settings: CatalogSettings,
) -> CatalogResult<Catalog> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(CatalogError::Config(format!(
            "Catalog directory {:?} does not exist",
            dir
        )));
    }

    let mut catalog = Catalog::new(settings);

    let parameters = load_parameters_file(dir.join(PARAMETERS_FILE))?;
    for parameter in parameters.parameters {
        catalog.create_parameter(parameter)?;
    }

    let mut entries = Vec::new();
    for path in yaml_files(&dir.join(CONFIGURATIONS_DIR))? {
        let file = load_configurations_file(&path)?;
        debug!(
            path = %path.display(),
            configurations = file.configurations.len(),
            "Read configuration file"
        );
        entries.extend(file.configurations);
    }

    for entry in &entries {
        catalog.create_configuration(entry.configuration.clone())?;
    }

    for entry in &entries {
        let name = entry.configuration.name.as_str();
        if entry.uncertainty_lower_bounds.is_some() || entry.uncertainty_upper_bounds.is_some() {
            catalog.set_uncertainty_bounds(
                name,
                entry.uncertainty_lower_bounds.as_deref(),
                entry.uncertainty_upper_bounds.as_deref(),
            )?;
        }
        if !entry.related.is_empty() {
            catalog.set_related(name, &entry.related)?;
        }
    }

    info!(
        dir = %dir.display(),
        parameters = catalog.parameters().count(),
        configurations = catalog.configuration_count(),
        "Loaded coverage catalog"
    );
    Ok(catalog)
}

pub fn load_parameters_file<P: AsRef<Path>>(path: P) -> CatalogResult<ParametersFile> {
    let content = read_expanded(path.as_ref())?;
    serde_yaml::from_str(&content).map_err(|e| {
        CatalogError::Config(format!(
            "Failed to parse parameters from {:?}: {}",
            path.as_ref(),
            e
        ))
    })
}

pub fn load_configurations_file<P: AsRef<Path>>(path: P) -> CatalogResult<ConfigurationsFile> {
    let content = read_expanded(path.as_ref())?;
    serde_yaml::from_str(&content).map_err(|e| {
        CatalogError::Config(format!(
            "Failed to parse configurations from {:?}: {}",
            path.as_ref(),
            e
        ))
    })
}

/// `.yaml`/`.yml` files of a directory, sorted by file name. A missing
/// directory holds no files.
fn yaml_files(dir: &Path) -> CatalogResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "No configurations directory");
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| CatalogError::Config(format!("Failed to read directory {:?}: {}", dir, e)))?
    {
        let path = entry?.path();
        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_expanded(path: &Path) -> CatalogResult<String> {
    let content = fs::read_to_string(path)
        .map_err(|e| CatalogError::Config(format!("Failed to read {:?}: {}", path, e)))?;
    expand_env_vars(&content)
        .map_err(|e| CatalogError::Config(format!("In {:?}: {}", path, e)))
}

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> CatalogResult<String> {
    shellexpand::env(content)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| CatalogError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("COVERAGE_CATALOG_TEST_UNSET");
        let result = expand_env_vars("base: ${COVERAGE_CATALOG_TEST_UNSET:-ens5ym}/clipped").unwrap();
        assert_eq!(result, "base: ens5ym/clipped");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("COVERAGE_CATALOG_TEST_REQUIRED");
        let result = expand_env_vars("${COVERAGE_CATALOG_TEST_REQUIRED}");
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_configuration_entry_format() {
        let yaml = r#"
configurations:
  - name: cdds_annual_absolute_model_ensemble
    display_name_english: Cooling degree days
    netcdf_main_dataset_name: cdds
    thredds_url_pattern: ensymbc/clipped/ecacdd_{scenario}_{year_period}_ts19762100_ls_VFVG.nc
    wms_main_layer_name: cdds
    unit: ºD
    palette: default/seq-YlOrRd
    color_scale_min: 0
    color_scale_max: 2000
    possible_values:
      - { parameter: scenario, value: rcp26 }
      - { parameter: year_period, value: year }
    related: [cdds_annual_absolute_ec_earth]
"#;
        let file: ConfigurationsFile = serde_yaml::from_str(yaml).unwrap();
        let entry = &file.configurations[0];
        assert_eq!(entry.configuration.name, "cdds_annual_absolute_model_ensemble");
        assert_eq!(entry.configuration.metadata.display_name_english, "Cooling degree days");
        assert_eq!(entry.configuration.rendering.color_scale_max, 2000.0);
        assert_eq!(entry.configuration.possible_values.len(), 2);
        assert_eq!(entry.related, ["cdds_annual_absolute_ec_earth"]);
        assert!(entry.uncertainty_lower_bounds.is_none());
    }
}
