use serde_json::{json, Value};
use thiserror::Error;
use crate::{
    schema_version::SchemaVersion,
    transformation_rule::VariableType,
};

/// A JSON-Schema document together with the data dictionary version it describes
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub version: SchemaVersion,
    pub schema: Value,
}

/// Registry holding the legacy and latest data dictionary schemas
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    legacy: SchemaDocument,
    latest: SchemaDocument,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Schema {version} failed to compile: {reason}")]
    SchemaCompilation { version: SchemaVersion, reason: String },

    #[error("Schema {version} has no definition for {variant} annotations")]
    VariantNotDefined { version: SchemaVersion, variant: VariableType },
}

impl SchemaRegistry {
    /// Registry over the schemas bundled with this tool
    pub fn new() -> Self {
        Self::with_schemas(
            SchemaDocument { version: SchemaVersion::LEGACY, schema: legacy_dictionary_schema() },
            SchemaDocument { version: SchemaVersion::LATEST, schema: latest_dictionary_schema() },
        )
    }

    pub fn with_schemas(legacy: SchemaDocument, latest: SchemaDocument) -> Self {
        Self { legacy, latest }
    }

    pub fn legacy_schema(&self) -> &SchemaDocument {
        &self.legacy
    }

    pub fn latest_schema(&self) -> &SchemaDocument {
        &self.latest
    }

    /// Standalone schema for one annotation variant of the legacy schema.
    ///
    /// The variant definition is lifted to the document root and keeps the
    /// shared `$defs`, so `#/$defs/...` references still resolve.
    pub fn legacy_variant_schema(&self, variant: VariableType) -> Result<SchemaDocument, RegistryError> {
        let defs = self.legacy.schema.get("$defs");
        let definition = defs
            .and_then(|defs| defs.get(variant.legacy_definition()))
            .and_then(Value::as_object)
            .ok_or(RegistryError::VariantNotDefined {
                version: self.legacy.version.clone(),
                variant,
            })?;

        let mut schema = definition.clone();
        if let Some(defs) = defs {
            schema.insert("$defs".to_string(), defs.clone());
        }

        Ok(SchemaDocument {
            version: self.legacy.version.clone(),
            schema: Value::Object(schema),
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefixed IRI (`nb:ParticipantID`) or absolute URL
const TERM_URL_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$";

/// Definitions shared by both schema versions
fn shared_definitions() -> Value {
    json!({
        "Term": {
            "description": "A controlled term",
            "type": "object",
            "properties": {
                "TermURL": { "type": "string", "pattern": TERM_URL_PATTERN },
                "Label": { "type": "string" }
            },
            "required": ["TermURL", "Label"]
        },
        "MissingValues": {
            "description": "Raw values that mark a missing measurement",
            "type": "array",
            "items": { "type": "string" }
        },
        "FormatSpec": {
            "description": "Unit or value format of a continuous column",
            "anyOf": [
                { "type": "string", "minLength": 1 },
                { "$ref": "#/$defs/Term" }
            ]
        },
        "Column": {
            "type": "object",
            "properties": {
                "Description": { "type": "string" },
                "Levels": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                },
                "Annotations": { "$ref": "#/$defs/Annotations" }
            }
        }
    })
}

fn dictionary_schema(title: &str, mut defs: Value, variants: Value) -> Value {
    if let (Value::Object(defs), Value::Object(variants)) = (&mut defs, variants) {
        defs.extend(variants);
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": title,
        "description": "Maps each column of a tabular dataset to its description and annotations",
        "type": "object",
        "additionalProperties": { "$ref": "#/$defs/Column" },
        "$defs": defs
    })
}

/// Schema for dictionaries written before annotation blocks carried a `VariableType`.
///
/// Variants overlap: Identifier, Categorical and Tool blocks tolerate extra
/// fields, so classification order decides. Continuous has no distinguishing
/// required field and is closed so it cannot swallow the others.
pub fn legacy_dictionary_schema() -> Value {
    let variants = json!({
        "Annotations": {
            "anyOf": [
                { "$ref": "#/$defs/IdentifierAnnotations" },
                { "$ref": "#/$defs/CategoricalAnnotations" },
                { "$ref": "#/$defs/ContinuousAnnotations" },
                { "$ref": "#/$defs/ToolAnnotations" }
            ]
        },
        "IdentifierAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "Identifies": { "type": "string", "minLength": 1 },
                "MissingValues": { "$ref": "#/$defs/MissingValues" }
            },
            "required": ["IsAbout", "Identifies"]
        },
        "CategoricalAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "Levels": {
                    "type": "object",
                    "additionalProperties": { "$ref": "#/$defs/Term" }
                },
                "MissingValues": { "$ref": "#/$defs/MissingValues" }
            },
            "required": ["IsAbout", "Levels"]
        },
        "ContinuousAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "Transformation": { "$ref": "#/$defs/FormatSpec" },
                "MissingValues": { "$ref": "#/$defs/MissingValues" }
            },
            "required": ["IsAbout"],
            "additionalProperties": false
        },
        "ToolAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "IsPartOf": { "$ref": "#/$defs/Term" },
                "MissingValues": { "$ref": "#/$defs/MissingValues" }
            },
            "required": ["IsAbout", "IsPartOf"]
        }
    });

    dictionary_schema("Legacy data dictionary", shared_definitions(), variants)
}

/// Schema for dictionaries whose annotation blocks are discriminated by `VariableType`
pub fn latest_dictionary_schema() -> Value {
    let variants = json!({
        "Annotations": {
            "oneOf": [
                { "$ref": "#/$defs/IdentifierAnnotations" },
                { "$ref": "#/$defs/CategoricalAnnotations" },
                { "$ref": "#/$defs/ContinuousAnnotations" },
                { "$ref": "#/$defs/CollectionAnnotations" }
            ],
            "not": {
                "anyOf": [
                    { "required": ["Identifies"] },
                    { "required": ["Transformation"] }
                ]
            }
        },
        "IdentifierAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "MissingValues": { "$ref": "#/$defs/MissingValues" },
                "VariableType": { "const": "Identifier" }
            },
            "required": ["IsAbout", "VariableType"]
        },
        "CategoricalAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "Levels": {
                    "type": "object",
                    "additionalProperties": { "$ref": "#/$defs/Term" }
                },
                "MissingValues": { "$ref": "#/$defs/MissingValues" },
                "VariableType": { "const": "Categorical" }
            },
            "required": ["IsAbout", "Levels", "VariableType"]
        },
        "ContinuousAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "Format": { "$ref": "#/$defs/FormatSpec" },
                "MissingValues": { "$ref": "#/$defs/MissingValues" },
                "VariableType": { "const": "Continuous" }
            },
            "required": ["IsAbout", "VariableType"]
        },
        "CollectionAnnotations": {
            "type": "object",
            "properties": {
                "IsAbout": { "$ref": "#/$defs/Term" },
                "IsPartOf": { "$ref": "#/$defs/Term" },
                "MissingValues": { "$ref": "#/$defs/MissingValues" },
                "VariableType": { "const": "Collection" }
            },
            "required": ["IsAbout", "IsPartOf", "VariableType"]
        }
    });

    dictionary_schema("Data dictionary", shared_definitions(), variants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_versions() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.legacy_schema().version, SchemaVersion::LEGACY);
        assert_eq!(registry.latest_schema().version, SchemaVersion::LATEST);
        assert!(registry.legacy_schema().version < registry.latest_schema().version);
    }

    #[test]
    fn test_schemas_are_self_contained() {
        let registry = SchemaRegistry::new();
        for document in [registry.legacy_schema(), registry.latest_schema()] {
            let text = document.schema.to_string();
            assert!(!text.contains("\"$ref\":\"http"), "schema {} fetches remotely", document.version);
            assert!(document.schema["$defs"]["Column"].is_object());
        }
    }

    #[test]
    fn test_only_latest_defines_variable_type() {
        let registry = SchemaRegistry::new();
        assert!(!registry.legacy_schema().schema.to_string().contains("VariableType"));
        assert_eq!(
            registry.latest_schema().schema["$defs"]["CollectionAnnotations"]["properties"]["VariableType"],
            json!({ "const": "Collection" })
        );
    }

    #[test]
    fn test_legacy_variant_schema_keeps_definitions() {
        let registry = SchemaRegistry::new();
        let variant = registry.legacy_variant_schema(VariableType::Collection).unwrap();

        assert_eq!(variant.version, SchemaVersion::LEGACY);
        assert_eq!(variant.schema["required"], json!(["IsAbout", "IsPartOf"]));
        assert!(variant.schema["$defs"]["Term"].is_object());
    }

    #[test]
    fn test_missing_variant_definition() {
        let registry = SchemaRegistry::with_schemas(
            SchemaDocument { version: SchemaVersion::LEGACY, schema: json!({ "type": "object" }) },
            SchemaDocument { version: SchemaVersion::LATEST, schema: latest_dictionary_schema() },
        );

        let err = registry.legacy_variant_schema(VariableType::Identifier).unwrap_err();
        assert!(matches!(err, RegistryError::VariantNotDefined { variant: VariableType::Identifier, .. }));
        assert!(err.to_string().contains("Identifier"));
    }
}
