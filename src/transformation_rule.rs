use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Field written onto every upgraded annotation block
pub const VARIABLE_TYPE_FIELD: &str = "VariableType";

/// Semantic variant of an annotation block, as tagged by the latest schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    Identifier,
    Categorical,
    Continuous,
    Collection,
}

impl VariableType {
    /// Variants in the order blocks are tested against them. A block that
    /// satisfies several legacy variants takes the earliest one.
    pub const PRIORITY: [VariableType; 4] = [
        VariableType::Identifier,
        VariableType::Categorical,
        VariableType::Continuous,
        VariableType::Collection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VariableType::Identifier => "Identifier",
            VariableType::Categorical => "Categorical",
            VariableType::Continuous => "Continuous",
            VariableType::Collection => "Collection",
        }
    }

    /// Name of the `$defs` entry describing this variant in the legacy schema
    pub fn legacy_definition(self) -> &'static str {
        match self {
            VariableType::Identifier => "IdentifierAnnotations",
            VariableType::Categorical => "CategoricalAnnotations",
            VariableType::Continuous => "ContinuousAnnotations",
            VariableType::Collection => "ToolAnnotations",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rewrite applied to a single annotation block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationRule {
    pub rule_id: String,
    pub source_field: String,
    pub transformation_type: TransformationType,
}

/// Types of transformations that can be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformationType {
    /// Rename a field in place, keeping its value and position
    Rename(String),
    /// Remove a field
    Remove,
    /// Write the matched variant's tag into the field
    TagVariableType,
}

/// Represents a transformation that was applied during processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedTransformation {
    pub rule_id: String,
    pub column: String,
    pub source_field: String,
    pub target_field: Option<String>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub transformation_type: TransformationType,
}

impl TransformationRule {
    pub fn new(rule_id: &str, source_field: &str, transformation_type: TransformationType) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            source_field: source_field.to_string(),
            transformation_type,
        }
    }

    /// Rules taking a legacy annotation block to the latest shape, in application order
    pub fn legacy_to_latest() -> Vec<TransformationRule> {
        vec![
            TransformationRule::new("drop_identifies", "Identifies", TransformationType::Remove),
            TransformationRule::new(
                "transformation_to_format",
                "Transformation",
                TransformationType::Rename("Format".to_string()),
            ),
            TransformationRule::new(
                "tag_variable_type",
                VARIABLE_TYPE_FIELD,
                TransformationType::TagVariableType,
            ),
        ]
    }

    /// Apply the rule to `block`, returning what changed. Field rules whose
    /// source field is absent are skipped.
    pub fn apply(
        &self,
        column: &str,
        block: &mut Map<String, Value>,
        variable_type: VariableType,
    ) -> Option<AppliedTransformation> {
        let (target_field, old_value, new_value) = match &self.transformation_type {
            TransformationType::Remove => {
                let old = remove_field(block, &self.source_field)?;
                (None, Some(old), None)
            }
            TransformationType::Rename(target) => {
                let value = rename_field(block, &self.source_field, target)?;
                (Some(target.clone()), Some(value.clone()), Some(value))
            }
            TransformationType::TagVariableType => {
                let tag = Value::String(variable_type.as_str().to_string());
                let old = block.insert(self.source_field.clone(), tag.clone());
                if old.as_ref() == Some(&tag) {
                    return None;
                }
                (Some(self.source_field.clone()), old, Some(tag))
            }
        };

        Some(AppliedTransformation {
            rule_id: self.rule_id.clone(),
            column: column.to_string(),
            source_field: self.source_field.clone(),
            target_field,
            old_value,
            new_value,
            transformation_type: self.transformation_type.clone(),
        })
    }
}

/// Remove `field`, keeping the remaining keys in their original order
fn remove_field(block: &mut Map<String, Value>, field: &str) -> Option<Value> {
    if !block.contains_key(field) {
        return None;
    }

    let mut removed = None;
    let entries = std::mem::take(block);
    for (key, value) in entries {
        if key == field {
            removed = Some(value);
        } else {
            block.insert(key, value);
        }
    }
    removed
}

/// Rename `from` to `to` at the same position. An existing `to` entry is replaced.
fn rename_field(block: &mut Map<String, Value>, from: &str, to: &str) -> Option<Value> {
    if !block.contains_key(from) {
        return None;
    }

    let mut moved = None;
    let entries = std::mem::take(block);
    for (key, value) in entries {
        if key == from {
            moved = Some(value.clone());
            block.insert(to.to_string(), value);
        } else if key != to {
            block.insert(key, value);
        }
    }
    moved
}
