//! Configuration parameters and their allowed values.
//!
//! A configuration parameter is a named, enumerable axis of variation
//! (scenario, year period, climatological model, ...). Each parameter owns
//! its values; a value's `internal_value` is what appears in THREDDS URL
//! patterns and in coverage identifiers, so it can never contain the
//! identifier separator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::identifier::IDENTIFIER_SEPARATOR;

/// Unique identifier for a configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterId(pub Uuid);

impl ParameterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParameterId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a configuration parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParameterValueId(pub Uuid);

impl ParameterValueId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParameterValueId {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-facing labels shared by parameters and values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    #[serde(default)]
    pub display_name_english: String,
    #[serde(default)]
    pub display_name_italian: String,
    #[serde(default)]
    pub description_english: String,
    #[serde(default)]
    pub description_italian: String,
}

/// One allowed value of a configuration parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParameterValue {
    pub id: ParameterValueId,
    /// Owning parameter
    pub parameter_id: ParameterId,
    /// Value used in URL patterns and coverage identifiers
    pub internal_value: String,
    #[serde(flatten)]
    pub metadata: DisplayMetadata,
}

/// A named axis of variation with its ordered list of allowed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParameter {
    pub id: ParameterId,
    pub name: String,
    #[serde(flatten)]
    pub metadata: DisplayMetadata,
    /// Allowed values, in creation order
    pub allowed_values: Vec<ConfigurationParameterValue>,
}

/// Input for creating a configuration parameter value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParameterValueCreate {
    pub internal_value: String,
    #[serde(flatten)]
    pub metadata: DisplayMetadata,
}

impl ConfigurationParameterValueCreate {
    pub fn new(internal_value: impl Into<String>) -> Self {
        Self {
            internal_value: internal_value.into(),
            metadata: DisplayMetadata::default(),
        }
    }

    pub fn with_display_name(mut self, english: &str, italian: &str) -> Self {
        self.metadata.display_name_english = english.to_string();
        self.metadata.display_name_italian = italian.to_string();
        self
    }
}

/// Input for creating a configuration parameter with its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParameterCreate {
    pub name: String,
    #[serde(flatten)]
    pub metadata: DisplayMetadata,
    #[serde(default)]
    pub allowed_values: Vec<ConfigurationParameterValueCreate>,
}

impl ConfigurationParameterCreate {
    /// Shorthand for a parameter whose values carry no display metadata.
    pub fn with_values(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            metadata: DisplayMetadata::default(),
            allowed_values: values
                .iter()
                .map(|v| ConfigurationParameterValueCreate::new(*v))
                .collect(),
        }
    }
}

/// Input for editing an existing value. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParameterValueUpdate {
    pub internal_value: Option<String>,
    pub metadata: Option<DisplayMetadata>,
}

/// Check a parameter name against `^[a-zA-Z][a-zA-Z0-9_]*$`.
pub fn validate_parameter_name(name: &str) -> CatalogResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CatalogError::InvalidParameterName(name.to_string()))
    }
}

/// Check that a value can be embedded in identifiers and URL patterns.
pub fn validate_internal_value(parameter: &str, value: &str) -> CatalogResult<()> {
    let reason = if value.is_empty() {
        Some("value cannot be empty".to_string())
    } else if value.contains(IDENTIFIER_SEPARATOR) {
        Some(format!(
            "'{}' is reserved as the coverage identifier separator",
            IDENTIFIER_SEPARATOR
        ))
    } else if let Some(c) = value
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '{' | '}' | '/'))
    {
        Some(format!("character {:?} is not allowed", c))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CatalogError::InvalidValue {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

impl ConfigurationParameter {
    /// Build a parameter from its creation input, validating the name and every value.
    pub fn new(create: ConfigurationParameterCreate) -> CatalogResult<Self> {
        validate_parameter_name(&create.name)?;
        let mut parameter = Self {
            id: ParameterId::new(),
            name: create.name,
            metadata: create.metadata,
            allowed_values: Vec::with_capacity(create.allowed_values.len()),
        };
        for value in create.allowed_values {
            parameter.add_value(value)?;
        }
        Ok(parameter)
    }

    /// Append a new allowed value.
    pub fn add_value(
        &mut self,
        create: ConfigurationParameterValueCreate,
    ) -> CatalogResult<&ConfigurationParameterValue> {
        validate_internal_value(&self.name, &create.internal_value)?;
        if self.value(&create.internal_value).is_some() {
            return Err(CatalogError::DuplicateValue {
                parameter: self.name.clone(),
                value: create.internal_value,
            });
        }
        self.allowed_values.push(ConfigurationParameterValue {
            id: ParameterValueId::new(),
            parameter_id: self.id,
            internal_value: create.internal_value,
            metadata: create.metadata,
        });
        let index = self.allowed_values.len() - 1;
        Ok(&self.allowed_values[index])
    }

    /// Find a value by its internal value.
    pub fn value(&self, internal_value: &str) -> Option<&ConfigurationParameterValue> {
        self.allowed_values
            .iter()
            .find(|v| v.internal_value == internal_value)
    }

    /// Find a value by id.
    pub fn value_by_id(&self, id: ParameterValueId) -> Option<&ConfigurationParameterValue> {
        self.allowed_values.iter().find(|v| v.id == id)
    }

    /// Apply an edit to a value. Returns the previous internal value when it changed.
    pub(crate) fn update_value(
        &mut self,
        id: ParameterValueId,
        update: ConfigurationParameterValueUpdate,
    ) -> CatalogResult<Option<String>> {
        if let Some(new_value) = &update.internal_value {
            validate_internal_value(&self.name, new_value)?;
            if self
                .allowed_values
                .iter()
                .any(|v| v.id != id && &v.internal_value == new_value)
            {
                return Err(CatalogError::DuplicateValue {
                    parameter: self.name.clone(),
                    value: new_value.clone(),
                });
            }
        }

        let name = self.name.clone();
        let value = self
            .allowed_values
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| CatalogError::UnknownParameterValue {
                parameter: name,
                value: id.0.to_string(),
            })?;

        if let Some(metadata) = update.metadata {
            value.metadata = metadata;
        }
        match update.internal_value {
            Some(new_value) if new_value != value.internal_value => {
                Ok(Some(std::mem::replace(&mut value.internal_value, new_value)))
            }
            _ => Ok(None),
        }
    }

    /// Remove a value, returning it.
    pub(crate) fn remove_value(
        &mut self,
        id: ParameterValueId,
    ) -> Option<ConfigurationParameterValue> {
        let index = self.allowed_values.iter().position(|v| v.id == id)?;
        Some(self.allowed_values.remove(index))
    }
}
