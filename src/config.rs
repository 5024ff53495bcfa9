//! YAML configuration: field rules, delimiters and messages.
//!
//! ```yaml
//! error_prefix: "<p>"
//! error_suffix: "</p>"
//! messages:
//!   required: "Please fill in {field}."
//! language:
//!   form_validation_min_length: "{field} is too short."
//! fields:
//!   - field: email
//!     label: Email address
//!     rules: required|valid_email
//!   - field: tags[]
//!     rules: [alpha, "max_length[12]"]
//!     errors:
//!       alpha: "Tags are letters only."
//! ```

use crate::error::ConfigError;
use crate::types::FieldDescriptor;
use indexmap::IndexMap;
use serde::Deserialize;

/// A loaded configuration document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub error_prefix: Option<String>,
    #[serde(default)]
    pub error_suffix: Option<String>,
    /// Global rule-name → message overrides.
    #[serde(default)]
    pub messages: IndexMap<String, String>,
    /// Catalog lines merged over the default catalog.
    #[serde(default)]
    pub language: IndexMap<String, String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

/// Parse a YAML configuration document.
pub fn parse(input: &str) -> Result<Config, ConfigError> {
    if input.trim().is_empty() {
        return Err(ConfigError::Empty);
    }

    // YAML → serde_json::Value → Config, so type errors carry serde_json's
    // field paths.
    let value: serde_json::Value =
        serde_saphyr::from_str(input).map_err(|e| ConfigError::Syntax(e.to_string()))?;

    if !value.is_object() {
        return Err(ConfigError::NotAMapping);
    }

    Ok(serde_json::from_value(value)?)
}
