//! Placeholder patterns for THREDDS dataset paths.
//!
//! A pattern is literal text with `{parameter_name}` placeholders, e.g.
//! `ens5ym/clipped/tas_anom_pp_ts_{scenario}_{year_period}_VFVGTAA.nc`.
//! Literal segments may carry shell-glob bracket expressions (`202[34]`);
//! those are kept verbatim, matching files against them happens elsewhere.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{CatalogError, CatalogResult};
use crate::parameter::validate_parameter_name;

/// Source of placeholder values for [`CompiledPattern::render`].
pub trait PlaceholderValues {
    fn placeholder_value(&self, name: &str) -> Option<&str>;
}

impl PlaceholderValues for HashMap<String, String> {
    fn placeholder_value(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl PlaceholderValues for BTreeMap<String, String> {
    fn placeholder_value(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl PlaceholderValues for [(&str, &str)] {
    fn placeholder_value(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    segments: Vec<Segment>,
    placeholder_names: Vec<String>,
}

impl CompiledPattern {
    /// Parse a pattern string.
    ///
    /// Placeholder names must be valid parameter names. Unbalanced braces
    /// are rejected.
    pub fn compile(pattern: &str) -> CatalogResult<Self> {
        let invalid = |reason: String| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut placeholder_names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(invalid("nested '{'".to_string())),
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(invalid(format!("unclosed placeholder '{{{}'", name)));
                    }
                    validate_parameter_name(&name)
                        .map_err(|_| invalid(format!("invalid placeholder name '{}'", name)))?;

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if !placeholder_names.contains(&name) {
                        placeholder_names.push(name.clone());
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(invalid("unmatched '}'".to_string())),
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            placeholder_names,
        })
    }

    /// Placeholder names in order of first appearance, without duplicates.
    pub fn placeholder_names(&self) -> &[String] {
        &self.placeholder_names
    }

    pub fn contains_placeholder(&self, name: &str) -> bool {
        self.placeholder_names.iter().any(|n| n == name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute every placeholder. Values not named by the pattern are ignored.
    pub fn render<V>(&self, values: &V) -> CatalogResult<String>
    where
        V: PlaceholderValues + ?Sized,
    {
        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values.placeholder_value(name).ok_or_else(|| {
                        CatalogError::MissingPlaceholderValue {
                            pattern: self.source.clone(),
                            placeholder: name.clone(),
                        }
                    })?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
