//! Schema-checked configuration loading
//!
//! Configuration types derive `JsonSchema` and `Deserialize`; implementing
//! [`Validatable`] gives them loaders that reject documents not matching the
//! generated schema before any field is read.

use serde::Deserialize;
use schemars::JsonSchema;
use std::fs;
use std::path::Path;

pub mod error;

pub use error::{SchemaError, Result};

/// Trait for types that can be validated against JSON Schema
pub trait Validatable: JsonSchema + for<'de> Deserialize<'de> {
    /// Load and validate from JSON file
    fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| SchemaError::Io { path: path.display().to_string(), source })?;

        Self::from_json_str(&content)
    }

    /// Load and validate from JSON string
    fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(SchemaError::Parse)?;

        Self::from_json_value(value)
    }

    /// Validate an already parsed document, then deserialize it
    fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let schema = schemars::schema_for!(Self);
        let schema_json = serde_json::to_value(&schema)
            .map_err(SchemaError::Parse)?;

        let compiled = jsonschema::validator_for(&schema_json)
            .map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;

        compiled.validate(&value)
            .map_err(|e| SchemaError::Validation(e.to_string()))?;

        serde_json::from_value(value)
            .map_err(SchemaError::Parse)
    }

    /// Generate JSON Schema for this type
    fn generate_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Self)
    }

    /// Generate JSON Schema as JSON string
    fn schema_json() -> Result<String> {
        let schema = Self::generate_schema();
        serde_json::to_string_pretty(&schema)
            .map_err(SchemaError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Sample {
        name: String,
        #[schemars(range(min = 1, max = 10))]
        level: u8,
    }

    impl Validatable for Sample {}

    #[test]
    fn test_valid_document() {
        let sample = Sample::from_json_str(r#"{"name": "a", "level": 3}"#).unwrap();
        assert_eq!(sample.name, "a");
        assert_eq!(sample.level, 3);
    }

    #[test]
    fn test_schema_violation() {
        let result = Sample::from_json_str(r#"{"name": "a", "level": 42}"#);
        assert!(matches!(result, Err(SchemaError::Validation(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = Sample::from_json_str("{not json");
        assert!(matches!(result, Err(SchemaError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Sample::from_json_file("/nonexistent/jsb/config.json");
        match result {
            Err(SchemaError::Io { path, .. }) => assert!(path.contains("config.json")),
            other => panic!("Expected IoError, got {:?}", other.map(|s| s.name)),
        }
    }

    #[test]
    fn test_schema_json_names_fields() {
        let json = Sample::schema_json().unwrap();
        assert!(json.contains("\"level\""));
        assert!(json.contains("\"name\""));
    }
}
