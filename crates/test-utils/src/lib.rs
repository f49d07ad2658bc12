//! Shared test utilities for the coverage catalog workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Real-world parameter and configuration fixtures (tas, cdds)
//! - Synthetic catalog generators for benchmarks
//! - Path helpers for the sample catalog and temporary catalog directories
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your integration tests:
//!
//! ```ignore
//! use test_utils::{fixture_catalog, names};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert that an expression fails with the given `CatalogError` variant.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_catalog_err;
///
/// assert_catalog_err!(catalog.get_coverage("nope-rcp26"), UnknownConfiguration);
/// ```
#[macro_export]
macro_rules! assert_catalog_err {
    ($expr:expr, $variant:ident) => {{
        match $expr {
            Err(coverage_catalog::CatalogError::$variant { .. }) => {}
            Err(other) => panic!(
                "expected CatalogError::{}, got error: {:?}",
                stringify!($variant),
                other
            ),
            Ok(_) => panic!(
                "expected CatalogError::{}, got Ok",
                stringify!($variant)
            ),
        }
    }};
}

/// Assert that two identifiers carry the same parameter values except for
/// `parameter`, which `left` must assign (their configuration names may
/// differ).
///
/// Both identifiers are parsed by the catalog, so every token is checked
/// against the parameter at its position rather than matched as text.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_same_values_except;
///
/// assert_same_values_except!(&catalog, &lower, &source, "uncertainty_type");
/// ```
#[macro_export]
macro_rules! assert_same_values_except {
    ($catalog:expr, $left:expr, $right:expr, $parameter:expr) => {{
        let catalog = $catalog;
        let left_id: &str = $left;
        let right_id: &str = $right;
        let parameter: &str = $parameter;
        let left = catalog
            .get_coverage(left_id)
            .unwrap_or_else(|err| panic!("cannot parse {}: {}", left_id, err));
        let right = catalog
            .get_coverage(right_id)
            .unwrap_or_else(|err| panic!("cannot parse {}: {}", right_id, err));
        assert!(
            left.assignment.get(parameter).is_some(),
            "{} assigns no '{}' value",
            left_id,
            parameter
        );
        let mut left_values = left.assignment.to_map();
        let mut right_values = right.assignment.to_map();
        left_values.remove(parameter);
        right_values.remove(parameter);
        assert_eq!(
            left_values, right_values,
            "identifiers differ beyond '{}':\n  left: {}\n right: {}",
            parameter, left_id, right_id
        );
    }};
}
