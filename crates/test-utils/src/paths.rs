//! Path utilities for locating the sample catalog and building temporary
//! catalog directories.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// This is determined by walking up from the current crate's manifest directory
/// until we find the workspace Cargo.toml.
pub fn workspace_root() -> PathBuf {
    // Start from the test-utils crate manifest dir
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns the path to the sample catalog shipped with the workspace.
///
/// The directory can be overridden with `TEST_CATALOG_DIR`.
pub fn sample_catalog_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TEST_CATALOG_DIR") {
        return PathBuf::from(dir);
    }
    workspace_root().join("config").join("catalog")
}

/// Creates a temporary catalog directory from YAML snippets.
///
/// # Arguments
///
/// * `parameters` - Contents of `parameters.yaml`
/// * `configurations` - `(file name, contents)` pairs written under `configurations/`
///
/// # Returns
///
/// A `tempfile::TempDir` that is removed when dropped.
pub fn temp_catalog_dir(parameters: &str, configurations: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::Builder::new()
        .prefix("coverage_catalog_")
        .tempdir()
        .expect("Failed to create temporary catalog directory");
    write_file(dir.path(), "parameters.yaml", parameters);

    let configurations_dir = dir.path().join("configurations");
    fs::create_dir(&configurations_dir).expect("Failed to create configurations directory");
    for (name, contents) in configurations {
        write_file(&configurations_dir, name, contents);
    }
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents)
        .unwrap_or_else(|e| panic!("Failed to write {}: {}", name, e));
}
