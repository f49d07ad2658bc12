//! THREDDS service URLs for resolved coverages.

use serde::Serialize;

use crate::catalog::Coverage;
use crate::error::CatalogResult;
use crate::settings::ThreddsSettings;

/// THREDDS data access services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreddsService {
    Wms,
    NetcdfSubset,
    Opendap,
    FileServer,
}

impl ThreddsService {
    pub const ALL: [ThreddsService; 4] = [
        ThreddsService::Wms,
        ThreddsService::NetcdfSubset,
        ThreddsService::Opendap,
        ThreddsService::FileServer,
    ];
}

/// All service URLs of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetUrls {
    pub fragment: String,
    pub wms: String,
    pub netcdf_subset: String,
    pub opendap: String,
    pub file_server: String,
}

/// Joins dataset fragments onto the configured THREDDS endpoints.
#[derive(Debug, Clone)]
pub struct ThreddsUrlBuilder {
    settings: ThreddsSettings,
}

impl ThreddsUrlBuilder {
    pub fn new(settings: ThreddsSettings) -> Self {
        Self {
            settings: settings.normalized(),
        }
    }

    fn service_fragment(&self, service: ThreddsService) -> &str {
        match service {
            ThreddsService::Wms => &self.settings.wms_service_url_fragment,
            ThreddsService::NetcdfSubset => &self.settings.netcdf_subset_service_url_fragment,
            ThreddsService::Opendap => &self.settings.opendap_service_url_fragment,
            ThreddsService::FileServer => &self.settings.file_server_url_fragment,
        }
    }

    /// `base_url/service/fragment`
    pub fn url(&self, service: ThreddsService, fragment: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.base_url,
            self.service_fragment(service),
            fragment.trim_start_matches('/')
        )
    }

    pub fn dataset_urls(&self, fragment: &str) -> DatasetUrls {
        DatasetUrls {
            fragment: fragment.to_string(),
            wms: self.url(ThreddsService::Wms, fragment),
            netcdf_subset: self.url(ThreddsService::NetcdfSubset, fragment),
            opendap: self.url(ThreddsService::Opendap, fragment),
            file_server: self.url(ThreddsService::FileServer, fragment),
        }
    }

    /// Render a coverage's URL pattern and build every service URL for it.
    pub fn coverage_urls(&self, coverage: &Coverage<'_>) -> CatalogResult<DatasetUrls> {
        Ok(self.dataset_urls(&coverage.url_fragment()?))
    }
}
