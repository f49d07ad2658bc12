//! Catalog settings.
//!
//! Built once at process start and handed to [`crate::Catalog::new`];
//! nothing in the crate reads process-wide state after that.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::CatalogError;

/// Prefix of the environment variables read by [`CatalogSettings::from_env`].
pub const ENV_PREFIX: &str = "COVERAGE_CATALOG__";

/// Order of the parameter values inside a coverage identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierOrder {
    /// URL-pattern placeholders in order of appearance, then the remaining
    /// possible-values parameters in the order they were declared.
    #[default]
    Pattern,
    /// Every identifier parameter sorted by name.
    Alphabetical,
}

impl FromStr for IdentifierOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "alphabetical" => Ok(Self::Alphabetical),
            other => Err(CatalogError::Config(format!(
                "unknown identifier order '{}', expected 'pattern' or 'alphabetical'",
                other
            ))),
        }
    }
}

/// Location of the THREDDS server and its service endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreddsSettings {
    pub base_url: String,
    pub wms_service_url_fragment: String,
    pub netcdf_subset_service_url_fragment: String,
    pub opendap_service_url_fragment: String,
    pub file_server_url_fragment: String,
}

impl Default for ThreddsSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/thredds".to_string(),
            wms_service_url_fragment: "wms".to_string(),
            netcdf_subset_service_url_fragment: "ncss/grid".to_string(),
            opendap_service_url_fragment: "dodsC".to_string(),
            file_server_url_fragment: "fileServer".to_string(),
        }
    }
}

impl ThreddsSettings {
    /// Strip leading and trailing slashes so fragments can be joined with `/`.
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        for fragment in [
            &mut self.wms_service_url_fragment,
            &mut self.netcdf_subset_service_url_fragment,
            &mut self.opendap_service_url_fragment,
            &mut self.file_server_url_fragment,
        ] {
            *fragment = fragment.trim_matches('/').to_string();
        }
        self
    }
}

/// Settings shared by the identifier engine and the relation resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub identifier_order: IdentifierOrder,
    /// Parameter that distinguishes uncertainty-bound configurations
    pub uncertainty_parameter_name: String,
    pub lower_bound_value: String,
    pub upper_bound_value: String,
    /// Parameter carrying the seasonal aggregation of a coverage
    pub season_parameter_name: String,
    pub thredds: ThreddsSettings,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            identifier_order: IdentifierOrder::default(),
            uncertainty_parameter_name: "uncertainty_type".to_string(),
            lower_bound_value: "lower_bound".to_string(),
            upper_bound_value: "upper_bound".to_string(),
            season_parameter_name: "year_period".to_string(),
            thredds: ThreddsSettings::default(),
        }
    }
}

impl CatalogSettings {
    pub fn with_identifier_order(mut self, order: IdentifierOrder) -> Self {
        self.identifier_order = order;
        self
    }

    /// Load settings from `COVERAGE_CATALOG__*` environment variables,
    /// reading a `.env` file first when one is present.
    pub fn from_env() -> Result<Self, CatalogError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Build settings from an arbitrary key lookup (keys without the prefix).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CatalogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let identifier_order = match lookup("IDENTIFIER_ORDER") {
            Some(raw) => raw.parse()?,
            None => defaults.identifier_order,
        };
        let thredds = ThreddsSettings {
            base_url: lookup("THREDDS__BASE_URL").unwrap_or(defaults.thredds.base_url),
            wms_service_url_fragment: lookup("THREDDS__WMS_SERVICE_URL_FRAGMENT")
                .unwrap_or(defaults.thredds.wms_service_url_fragment),
            netcdf_subset_service_url_fragment: lookup(
                "THREDDS__NETCDF_SUBSET_SERVICE_URL_FRAGMENT",
            )
            .unwrap_or(defaults.thredds.netcdf_subset_service_url_fragment),
            opendap_service_url_fragment: lookup("THREDDS__OPENDAP_SERVICE_URL_FRAGMENT")
                .unwrap_or(defaults.thredds.opendap_service_url_fragment),
            file_server_url_fragment: lookup("THREDDS__FILE_SERVER_URL_FRAGMENT")
                .unwrap_or(defaults.thredds.file_server_url_fragment),
        }
        .normalized();

        Ok(Self {
            identifier_order,
            uncertainty_parameter_name: lookup("UNCERTAINTY_PARAMETER_NAME")
                .unwrap_or(defaults.uncertainty_parameter_name),
            lower_bound_value: lookup("LOWER_BOUND_VALUE").unwrap_or(defaults.lower_bound_value),
            upper_bound_value: lookup("UPPER_BOUND_VALUE").unwrap_or(defaults.upper_bound_value),
            season_parameter_name: lookup("SEASON_PARAMETER_NAME")
                .unwrap_or(defaults.season_parameter_name),
            thredds,
        })
    }

    /// Parse settings from YAML; missing keys take their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let mut settings: Self = serde_yaml::from_str(content)?;
        settings.thredds = settings.thredds.normalized();
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = CatalogSettings::default();
        assert_eq!(settings.identifier_order, IdentifierOrder::Pattern);
        assert_eq!(settings.uncertainty_parameter_name, "uncertainty_type");
        assert_eq!(settings.thredds.netcdf_subset_service_url_fragment, "ncss/grid");
    }

    #[test]
    fn test_identifier_order_from_str() {
        assert_eq!(
            "Alphabetical".parse::<IdentifierOrder>().unwrap(),
            IdentifierOrder::Alphabetical
        );
        assert_eq!(
            "pattern".parse::<IdentifierOrder>().unwrap(),
            IdentifierOrder::Pattern
        );
        assert!("random".parse::<IdentifierOrder>().is_err());
    }

    #[test]
    fn test_from_lookup_overrides_and_normalizes() {
        let vars: HashMap<&str, &str> = [
            ("IDENTIFIER_ORDER", "alphabetical"),
            ("THREDDS__BASE_URL", "https://thredds.example.org/thredds/"),
            ("THREDDS__WMS_SERVICE_URL_FRAGMENT", "/wms/"),
        ]
        .into_iter()
        .collect();

        let settings =
            CatalogSettings::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.identifier_order, IdentifierOrder::Alphabetical);
        assert_eq!(settings.thredds.base_url, "https://thredds.example.org/thredds");
        assert_eq!(settings.thredds.wms_service_url_fragment, "wms");
        assert_eq!(settings.thredds.opendap_service_url_fragment, "dodsC");
    }

    #[test]
    fn test_from_lookup_rejects_unknown_order() {
        let result = CatalogSettings::from_lookup(|key| {
            (key == "IDENTIFIER_ORDER").then(|| "sideways".to_string())
        });
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_from_yaml_partial() {
        let settings = CatalogSettings::from_yaml(
            "identifier_order: alphabetical\nthredds:\n  base_url: http://thredds:8080/thredds/\n",
        )
        .unwrap();
        assert_eq!(settings.identifier_order, IdentifierOrder::Alphabetical);
        assert_eq!(settings.thredds.base_url, "http://thredds:8080/thredds");
        assert_eq!(settings.thredds.wms_service_url_fragment, "wms");
        assert_eq!(settings.lower_bound_value, "lower_bound");
    }
}
