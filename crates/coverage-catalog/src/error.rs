//! Error types for the coverage catalog.

use thiserror::Error;

/// Result type alias using CatalogError.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Primary error type for catalog definition, identifier and relation operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    // === Definition Errors ===
    #[error("Invalid configuration parameter name '{0}': must match ^[a-zA-Z][a-zA-Z0-9_]*$")]
    InvalidParameterName(String),

    #[error("Invalid value '{value}' for parameter '{parameter}': {reason}")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parameter already exists: {0}")]
    DuplicateParameter(String),

    #[error("Value '{value}' already exists for parameter '{parameter}'")]
    DuplicateValue { parameter: String, value: String },

    #[error("Invalid coverage configuration name '{0}': must match ^[a-z][a-z0-9_]*$")]
    InvalidConfigurationName(String),

    #[error("Coverage configuration already exists: {0}")]
    DuplicateConfiguration(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === Identifier Errors ===
    #[error("Invalid coverage identifier '{identifier}': {reason}")]
    InvalidCoverageIdentifier {
        identifier: String,
        parameter: Option<String>,
        value: Option<String>,
        reason: String,
    },

    #[error("Unknown coverage configuration: {0}")]
    UnknownConfiguration(String),

    #[error("Unknown configuration parameter: {0}")]
    UnknownParameter(String),

    #[error("Unknown value '{value}' for configuration parameter '{parameter}'")]
    UnknownParameterValue { parameter: String, value: String },

    // === Internal Consistency Errors ===
    #[error("Pattern '{pattern}' has no value for placeholder '{placeholder}'")]
    MissingPlaceholderValue { pattern: String, placeholder: String },

    #[error(
        "Coverage configuration '{configuration}' is used as an uncertainty bound \
         but declares no '{parameter}' values"
    )]
    MissingUncertaintyType {
        configuration: String,
        parameter: String,
    },

    #[error("Coverage configuration '{0}' has more identifiers than fit in a usize")]
    IdentifierSpaceTooLarge(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Error for an identifier whose token does not match a legal value.
    pub fn illegal_value(
        identifier: impl Into<String>,
        parameter: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let parameter = parameter.into();
        let value = value.into();
        CatalogError::InvalidCoverageIdentifier {
            identifier: identifier.into(),
            reason: format!(
                "'{}' is not a legal value for parameter '{}'",
                value, parameter
            ),
            parameter: Some(parameter),
            value: Some(value),
        }
    }

    /// Error for an identifier that is structurally malformed.
    pub fn malformed_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        CatalogError::InvalidCoverageIdentifier {
            identifier: identifier.into(),
            parameter: None,
            value: None,
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by caller input rather than by an
    /// inconsistent catalog.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            CatalogError::MissingPlaceholderValue { .. }
                | CatalogError::MissingUncertaintyType { .. }
                | CatalogError::IdentifierSpaceTooLarge(_)
                | CatalogError::Config(_)
        )
    }

    /// Get the HTTP status code a web layer should answer with.
    pub fn http_status_code(&self) -> u16 {
        match self {
            CatalogError::InvalidParameterName(_)
            | CatalogError::InvalidValue { .. }
            | CatalogError::InvalidConfigurationName(_)
            | CatalogError::InvalidPattern { .. }
            | CatalogError::InvalidCoverageIdentifier { .. } => 400,

            CatalogError::UnknownConfiguration(_)
            | CatalogError::UnknownParameter(_)
            | CatalogError::UnknownParameterValue { .. } => 404,

            CatalogError::DuplicateParameter(_)
            | CatalogError::DuplicateValue { .. }
            | CatalogError::DuplicateConfiguration(_) => 409,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(err: serde_yaml::Error) -> Self {
        CatalogError::Config(format!("YAML error: {}", err))
    }
}
