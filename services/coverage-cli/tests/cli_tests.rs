//! End-to-end tests of the coverage-cli binary against the sample catalog.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const TAS_ENSEMBLE_RCP26_DJF: &str =
    "tas_seasonal_anomaly_model_ensemble-annual-model_ensemble-tas-anomaly-rcp26-DJF";
const TAS_ENSEMBLE_LOWER_RCP26_DJF: &str =
    "tas_seasonal_anomaly_model_ensemble_lower_uncertainty-annual-model_ensemble-tas-anomaly-rcp26-lower_bound-DJF";

fn sample_catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog")
}

fn cli(catalog_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("coverage-cli").unwrap();
    cmd.env_remove("COVERAGE_CATALOG_DIR")
        .env_remove("COVERAGE_CATALOG__IDENTIFIER_ORDER")
        .env_remove("COVERAGE_CATALOG__THREDDS__BASE_URL")
        .env_remove("TAS_ENSEMBLE_ROOT")
        .env_remove("RUST_LOG")
        .arg("--catalog-dir")
        .arg(catalog_dir);
    cmd
}

#[test]
fn test_configurations_lists_counts() {
    cli(&sample_catalog_dir())
        .arg("configurations")
        .assert()
        .success()
        .stdout(predicate::str::contains("cdds_annual_absolute_model_ensemble"))
        .stdout(predicate::str::contains("\"identifiers\": 3"))
        .stdout(predicate::str::contains("{name}-{scenario}-{year_period}"));
}

#[test]
fn test_count() {
    cli(&sample_catalog_dir())
        .args(["count", "--configuration", "tas_seasonal_anomaly_model_ensemble"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 12"));
}

#[test]
fn test_count_unknown_configuration_fails() {
    cli(&sample_catalog_dir())
        .args(["count", "--configuration", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown coverage configuration: nope"));
}

#[test]
fn test_list_with_filter_and_limit() {
    cli(&sample_catalog_dir())
        .args([
            "list",
            "--configuration",
            "cdds_annual_absolute_model_ensemble",
            "--filter",
            "scenario:rcp85",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "cdds_annual_absolute_model_ensemble-rcp85-year",
        ))
        .stdout(predicate::str::contains("\"filtered_total\": 1"))
        .stdout(predicate::str::contains("\"unfiltered_total\": 3"));

    cli(&sample_catalog_dir())
        .args(["list", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"filtered_total\": 59"));
}

#[test]
fn test_list_rejects_malformed_filter() {
    cli(&sample_catalog_dir())
        .args(["list", "--filter", "scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PARAMETER:VALUE"));
}

#[test]
fn test_resolve_prints_dataset_urls() {
    cli(&sample_catalog_dir())
        .args(["resolve", "cdds_annual_absolute_model_ensemble-rcp45-year"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"url_fragment\": \"ensymbc/clipped/ecacdd_rcp45_year_ts19762100_ls_VFVG.nc\"",
        ))
        .stdout(predicate::str::contains(
            "http://localhost:8080/thredds/dodsC/ensymbc/clipped/ecacdd_rcp45_year_ts19762100_ls_VFVG.nc",
        ))
        .stdout(predicate::str::contains("\"season\": null"));
}

#[test]
fn test_resolve_invalid_identifier_fails() {
    cli(&sample_catalog_dir())
        .args(["resolve", "cdds_annual_absolute_model_ensemble-rcp60-year"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid coverage identifier"));
}

#[test]
fn test_relations_in_alphabetical_order() {
    cli(&sample_catalog_dir())
        .args(["--identifier-order", "alphabetical", "relations", TAS_ENSEMBLE_RCP26_DJF])
        .assert()
        .success()
        .stdout(predicate::str::contains(TAS_ENSEMBLE_LOWER_RCP26_DJF))
        .stdout(predicate::str::contains(
            "tas_seasonal_anomaly_model_ec_earth_rca4-annual-ec_earth_rca4-tas-anomaly-rcp45-DJF",
        ));
}

#[test]
fn test_validate_sample_catalog() {
    cli(&sample_catalog_dir())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_validate_reports_issues() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("parameters.yaml"),
        "parameters:\n  - name: scenario\n    allowed_values:\n      - internal_value: rcp26\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("configurations")).unwrap();
    fs::write(
        dir.path().join("configurations/tas.yaml"),
        "configurations:\n  - name: tas\n    netcdf_main_dataset_name: tas\n    thredds_url_pattern: tas_{scenario}.nc\n",
    )
    .unwrap();

    cli(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"kind\": \"placeholder_without_values\""))
        .stderr(predicate::str::contains("1 catalog issue(s) found"));
}

#[test]
fn test_missing_catalog_dir_fails() {
    cli(&PathBuf::from("/nonexistent/catalog"))
        .arg("configurations")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load catalog"));
}
