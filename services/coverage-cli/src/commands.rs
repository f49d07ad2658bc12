//! Subcommand implementations. Each returns pretty-printed JSON.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use coverage_catalog::{
    Catalog, CatalogIssue, CoverageListFilter, DatasetUrls, Season, ThreddsUrlBuilder,
};

#[derive(Serialize)]
struct ConfigurationSummary<'a> {
    name: &'a str,
    pattern: String,
    identifiers: usize,
}

#[derive(Serialize)]
struct ResolvedCoverage<'a> {
    identifier: &'a str,
    configuration: &'a str,
    values: BTreeMap<String, String>,
    season: Option<Season>,
    url_fragment: String,
    urls: DatasetUrls,
}

#[derive(Serialize)]
struct IdentifierCount<'a> {
    configuration: &'a str,
    count: usize,
}

/// Parse a `PARAMETER:VALUE` filter argument.
pub fn parse_filter_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((parameter, value)) if !parameter.is_empty() && !value.is_empty() => {
            Ok((parameter.to_string(), value.to_string()))
        }
        _ => Err(format!("expected PARAMETER:VALUE, got '{}'", raw)),
    }
}

pub fn configurations(catalog: &Catalog) -> Result<String> {
    let summaries = catalog
        .configurations()
        .map(|configuration| -> Result<ConfigurationSummary<'_>> {
            Ok(ConfigurationSummary {
                name: &configuration.name,
                pattern: catalog.coverage_id_pattern(&configuration.name)?,
                identifiers: catalog.engine().count(configuration)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&summaries)?)
}

pub fn list(
    catalog: &Catalog,
    configuration: Option<String>,
    name_contains: Vec<String>,
    possible_values: Vec<(String, String)>,
    offset: usize,
    limit: Option<usize>,
) -> Result<String> {
    if let Some(name) = &configuration {
        // Surface a typo instead of printing an empty page.
        catalog.count_coverage_identifiers(name)?;
    }
    let filter = CoverageListFilter {
        configuration,
        name_contains,
        possible_values,
        offset,
        limit,
    };
    let page = catalog.list_coverage_identifiers(&filter)?;
    Ok(serde_json::to_string_pretty(&page)?)
}

pub fn count(catalog: &Catalog, configuration: &str) -> Result<String> {
    let count = catalog.count_coverage_identifiers(configuration)?;
    Ok(serde_json::to_string_pretty(&IdentifierCount {
        configuration,
        count,
    })?)
}

pub fn resolve(catalog: &Catalog, identifier: &str) -> Result<String> {
    let coverage = catalog.get_coverage(identifier)?;
    let urls = ThreddsUrlBuilder::new(catalog.settings().thredds.clone()).coverage_urls(&coverage)?;
    let resolved = ResolvedCoverage {
        identifier,
        configuration: &coverage.configuration.name,
        values: coverage.assignment.to_map(),
        season: coverage.season(),
        url_fragment: urls.fragment.clone(),
        urls,
    };
    Ok(serde_json::to_string_pretty(&resolved)?)
}

pub fn relations(catalog: &Catalog, identifier: &str) -> Result<String> {
    let relations = catalog.relations().resolve(identifier)?;
    Ok(serde_json::to_string_pretty(&relations)?)
}

/// Returns the report and the number of issues in it.
pub fn validate(catalog: &Catalog) -> Result<(String, usize)> {
    let issues: Vec<CatalogIssue> = catalog.validate();
    for issue in &issues {
        tracing::warn!(%issue, "Catalog issue");
    }
    Ok((serde_json::to_string_pretty(&issues)?, issues.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_pair() {
        assert_eq!(
            parse_filter_pair("scenario:rcp45").unwrap(),
            ("scenario".to_string(), "rcp45".to_string())
        );
        assert!(parse_filter_pair("scenario").is_err());
        assert!(parse_filter_pair(":rcp45").is_err());
        assert!(parse_filter_pair("scenario:").is_err());
    }
}
