use std::fmt;

use jsonschema::{Draft, JSONSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::schema_registry::{RegistryError, SchemaDocument};

/// Every violation found by one validation run, in the order the validator reported them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }
}

/// A single schema violation: JSON pointer to the offending value and what is wrong with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The root pointer is the empty string
        let path = if self.field_path.is_empty() { "/" } else { &self.field_path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// A schema compiled once and applied to any number of documents
pub struct SchemaValidator {
    compiled: JSONSchema,
}

impl SchemaValidator {
    pub fn compile(document: &SchemaDocument) -> Result<Self, RegistryError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft202012)
            .compile(&document.schema)
            .map_err(|e| RegistryError::SchemaCompilation {
                version: document.version.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { compiled })
    }

    /// Collect every violation, not just the first
    pub fn validate(&self, instance: &Value) -> ValidationReport {
        match self.compiled.validate(instance) {
            Ok(()) => ValidationReport::default(),
            Err(errors) => ValidationReport::new(
                errors
                    .map(|error| ValidationError::new(error.instance_path.to_string(), error.to_string()))
                    .collect(),
            ),
        }
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }
}

/// Validate `instance` against `schema`, compiling the schema for this call only
pub fn validate(instance: &Value, schema: &SchemaDocument) -> Result<ValidationReport, RegistryError> {
    Ok(SchemaValidator::compile(schema)?.validate(instance))
}
