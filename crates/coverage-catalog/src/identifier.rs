//! Coverage identifier generation and parsing.
//!
//! An identifier is `{configuration_name}-{value1}-{value2}-...` with one
//! value per identifier parameter of the configuration. Generation walks the
//! Cartesian product of the legal values lazily; parsing is its inverse and
//! validates every token against the configuration's possible values.

use std::collections::{BTreeMap, HashMap};
use std::iter::FusedIterator;

use serde::Serialize;

use crate::configuration::{CoverageConfiguration, PossibleValue};
use crate::error::{CatalogError, CatalogResult};
use crate::pattern::PlaceholderValues;
use crate::settings::IdentifierOrder;

/// Separator between the configuration name and the parameter values.
pub const IDENTIFIER_SEPARATOR: char = '-';

/// One dimension of the identifier space: a parameter and its legal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub parameter: String,
    /// Sorted lexicographically
    pub values: Vec<String>,
}

/// Parameter values of one coverage, in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assignment {
    entries: Vec<PossibleValue>,
}

impl Assignment {
    pub fn new(entries: Vec<PossibleValue>) -> Self {
        Self { entries }
    }

    /// The value of a parameter, if assigned.
    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.entry(parameter).map(|pv| pv.internal_value.as_str())
    }

    /// The resolved `(parameter, value)` pair of a parameter.
    pub fn entry(&self, parameter: &str) -> Option<&PossibleValue> {
        self.entries.iter().find(|pv| pv.parameter_name == parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PossibleValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|pv| pv.parameter_name.as_str())
    }

    /// `(parameter, value)` name pairs, in identifier order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|pv| (pv.parameter_name.clone(), pv.internal_value.clone()))
            .collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.to_pairs().into_iter().collect()
    }
}

impl PlaceholderValues for Assignment {
    fn placeholder_value(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

/// Lazy, restartable sequence of the identifiers of one configuration.
///
/// Each item is decoded from its position in the product, so the iterator
/// is cheap to clone and `nth` jumps without walking the skipped items.
#[derive(Debug, Clone)]
pub struct CoverageIdentifiers<'a> {
    configuration_name: &'a str,
    axes: Vec<Axis>,
    position: usize,
    total: usize,
}

impl<'a> CoverageIdentifiers<'a> {
    fn new(configuration_name: &'a str, axes: Vec<Axis>) -> CatalogResult<Self> {
        let total = product_len(&axes)
            .ok_or_else(|| CatalogError::IdentifierSpaceTooLarge(configuration_name.to_string()))?;
        Ok(Self {
            configuration_name,
            axes,
            position: 0,
            total,
        })
    }

    fn empty(configuration_name: &'a str) -> Self {
        Self {
            configuration_name,
            axes: Vec::new(),
            position: 0,
            total: 0,
        }
    }

    /// Total number of identifiers, independent of how many were consumed.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    fn identifier_at(&self, position: usize) -> String {
        // Mixed-radix decode; the last axis varies fastest.
        let mut indices = vec![0; self.axes.len()];
        let mut rest = position;
        for (slot, axis) in indices.iter_mut().zip(&self.axes).rev() {
            let radix = axis.values.len();
            *slot = rest % radix;
            rest /= radix;
        }

        let mut identifier = String::from(self.configuration_name);
        for (axis, index) in self.axes.iter().zip(indices) {
            identifier.push(IDENTIFIER_SEPARATOR);
            identifier.push_str(&axis.values[index]);
        }
        identifier
    }
}

impl Iterator for CoverageIdentifiers<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.total {
            return None;
        }
        let identifier = self.identifier_at(self.position);
        self.position += 1;
        Some(identifier)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.position;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.position = self.position.saturating_add(n).min(self.total);
        self.next()
    }
}

impl ExactSizeIterator for CoverageIdentifiers<'_> {}

impl FusedIterator for CoverageIdentifiers<'_> {}

/// `None` when the product does not fit in a `usize`.
fn product_len(axes: &[Axis]) -> Option<usize> {
    axes.iter()
        .try_fold(1usize, |acc, axis| acc.checked_mul(axis.values.len()))
}

/// Restrictions applied before taking the Cartesian product.
///
/// Values given for the same parameter are alternatives; different
/// parameters must all be satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueConstraints {
    allowed: HashMap<String, Vec<String>>,
}

impl ValueConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, P, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: Into<String>,
        V: Into<String>,
    {
        let mut constraints = Self::new();
        for (parameter, value) in pairs {
            constraints.allow(parameter, value);
        }
        constraints
    }

    pub fn allow(&mut self, parameter: impl Into<String>, value: impl Into<String>) {
        let values = self.allowed.entry(parameter.into()).or_default();
        let value = value.into();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.allowed.keys().map(String::as_str)
    }

    fn restrict(&self, axis: &mut Axis) {
        if let Some(allowed) = self.allowed.get(&axis.parameter) {
            axis.values.retain(|v| allowed.contains(v));
        }
    }
}

/// Generates, counts, builds and parses coverage identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentifierEngine {
    order: IdentifierOrder,
}

impl IdentifierEngine {
    pub fn new(order: IdentifierOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> IdentifierOrder {
        self.order
    }

    /// The axes of a configuration's identifier space, in identifier order.
    pub fn axes(&self, configuration: &CoverageConfiguration) -> Vec<Axis> {
        configuration
            .identifier_parameters(self.order)
            .into_iter()
            .map(|parameter| Axis {
                parameter: parameter.to_string(),
                values: configuration
                    .legal_values(parameter)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect()
    }

    /// Every identifier of the configuration, lazily.
    ///
    /// Fails with [`CatalogError::IdentifierSpaceTooLarge`] when the
    /// identifiers cannot be counted.
    pub fn generate<'a>(
        &self,
        configuration: &'a CoverageConfiguration,
    ) -> CatalogResult<CoverageIdentifiers<'a>> {
        CoverageIdentifiers::new(&configuration.name, self.axes(configuration))
    }

    /// Identifiers restricted by `constraints`.
    ///
    /// A constraint on a parameter the configuration does not use yields an
    /// empty sequence.
    pub fn generate_filtered<'a>(
        &self,
        configuration: &'a CoverageConfiguration,
        constraints: &ValueConstraints,
    ) -> CatalogResult<CoverageIdentifiers<'a>> {
        let mut axes = self.axes(configuration);
        let uses_all = constraints
            .parameters()
            .all(|p| axes.iter().any(|axis| axis.parameter == p));
        if !uses_all {
            return Ok(CoverageIdentifiers::empty(&configuration.name));
        }
        axes.iter_mut().for_each(|axis| constraints.restrict(axis));
        CoverageIdentifiers::new(&configuration.name, axes)
    }

    /// Number of identifiers, without materializing them.
    pub fn count(&self, configuration: &CoverageConfiguration) -> CatalogResult<usize> {
        product_len(&self.axes(configuration))
            .ok_or_else(|| CatalogError::IdentifierSpaceTooLarge(configuration.name.clone()))
    }

    pub fn count_filtered(
        &self,
        configuration: &CoverageConfiguration,
        constraints: &ValueConstraints,
    ) -> CatalogResult<usize> {
        Ok(self.generate_filtered(configuration, constraints)?.total())
    }

    /// Parse an identifier of `configuration` into its parameter values.
    ///
    /// Every token must be a legal value of its positional parameter within
    /// this configuration, not merely a known value of the parameter.
    pub fn parse(
        &self,
        identifier: &str,
        configuration: &CoverageConfiguration,
    ) -> CatalogResult<Assignment> {
        let suffix = match identifier.strip_prefix(configuration.name.as_str()) {
            Some("") => None,
            Some(rest) => match rest.strip_prefix(IDENTIFIER_SEPARATOR) {
                Some(suffix) => Some(suffix),
                None => {
                    return Err(CatalogError::malformed_identifier(
                        identifier,
                        format!(
                            "does not belong to coverage configuration '{}'",
                            configuration.name
                        ),
                    ))
                }
            },
            None => {
                return Err(CatalogError::malformed_identifier(
                    identifier,
                    format!(
                        "does not belong to coverage configuration '{}'",
                        configuration.name
                    ),
                ))
            }
        };

        let parameters = configuration.identifier_parameters(self.order);
        let tokens: Vec<&str> = match suffix {
            Some(suffix) => suffix.split(IDENTIFIER_SEPARATOR).collect(),
            None => Vec::new(),
        };
        if tokens.len() != parameters.len() {
            return Err(CatalogError::malformed_identifier(
                identifier,
                format!(
                    "expected {} parameter values, found {}",
                    parameters.len(),
                    tokens.len()
                ),
            ));
        }

        let entries = parameters
            .into_iter()
            .zip(tokens)
            .map(|(parameter, token)| {
                configuration
                    .possible_value(parameter, token)
                    .cloned()
                    .ok_or_else(|| CatalogError::illegal_value(identifier, parameter, token))
            })
            .collect::<CatalogResult<Vec<_>>>()?;

        Ok(Assignment::new(entries))
    }

    /// Build an identifier from explicit values.
    ///
    /// Values for parameters the configuration does not use are ignored.
    pub fn build<V>(
        &self,
        configuration: &CoverageConfiguration,
        values: &V,
    ) -> CatalogResult<String>
    where
        V: PlaceholderValues + ?Sized,
    {
        let mut identifier = configuration.name.clone();
        for parameter in configuration.identifier_parameters(self.order) {
            let value = values.placeholder_value(parameter).ok_or_else(|| {
                CatalogError::InvalidCoverageIdentifier {
                    identifier: identifier.clone(),
                    parameter: Some(parameter.to_string()),
                    value: None,
                    reason: format!("no value given for parameter '{}'", parameter),
                }
            })?;
            if !configuration.is_legal(parameter, value) {
                return Err(CatalogError::illegal_value(
                    identifier.as_str(),
                    parameter,
                    value,
                ));
            }
            identifier.push(IDENTIFIER_SEPARATOR);
            identifier.push_str(value);
        }
        Ok(identifier)
    }

    /// Parse an identifier and render the configuration's THREDDS URL pattern.
    pub fn url_fragment(
        &self,
        identifier: &str,
        configuration: &CoverageConfiguration,
    ) -> CatalogResult<String> {
        let assignment = self.parse(identifier, configuration)?;
        configuration.thredds_url_pattern.render(&assignment)
    }
}
