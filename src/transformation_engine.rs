use serde_json::Value;
use crate::{
    schema_registry::{RegistryError, SchemaRegistry},
    transformation_rule::{AppliedTransformation, TransformationRule, VariableType},
    validation::SchemaValidator,
};

/// Field of a column entry holding its annotation block
pub const ANNOTATIONS_FIELD: &str = "Annotations";

/// Rewrites legacy annotation blocks into the latest schema's shape
pub struct AnnotationTransformer {
    variants: Vec<(VariableType, SchemaValidator)>,
    rules: Vec<TransformationRule>,
}

/// Result of a transformation operation
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationResult {
    pub transformed: Value,
    pub applied_transformations: Vec<AppliedTransformation>,
    /// Columns whose annotation block matched no legacy variant and was left as is
    pub unmatched_columns: Vec<String>,
}

impl AnnotationTransformer {
    /// Compile the legacy variant schemas in classification order
    pub fn new(registry: &SchemaRegistry) -> Result<Self, RegistryError> {
        let variants = VariableType::PRIORITY
            .iter()
            .map(|&variant| -> Result<_, RegistryError> {
                let schema = registry.legacy_variant_schema(variant)?;
                Ok((variant, SchemaValidator::compile(&schema)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            variants,
            rules: TransformationRule::legacy_to_latest(),
        })
    }

    /// First variant, in priority order, whose legacy schema accepts `block`
    pub fn classify(&self, block: &Value) -> Option<VariableType> {
        self.variants
            .iter()
            .find(|(_, validator)| validator.is_valid(block))
            .map(|(variant, _)| *variant)
    }

    /// Upgrade every annotation block of `document`.
    ///
    /// Only `Annotations` values change; columns are neither added, removed nor
    /// reordered. Anything that is not shaped like a dictionary passes through.
    pub fn transform(&self, mut document: Value) -> TransformationResult {
        let mut applied_transformations = Vec::new();
        let mut unmatched_columns = Vec::new();

        if let Value::Object(columns) = &mut document {
            for (column, entry) in columns.iter_mut() {
                let Some(block) = entry.get_mut(ANNOTATIONS_FIELD) else {
                    continue;
                };

                let Some(variant) = self.classify(block) else {
                    unmatched_columns.push(column.clone());
                    continue;
                };

                // Every legacy variant schema requires an object
                if let Value::Object(fields) = block {
                    applied_transformations.extend(
                        self.rules.iter().filter_map(|rule| rule.apply(column, fields, variant)),
                    );
                }
            }
        }

        TransformationResult {
            transformed: document,
            applied_transformations,
            unmatched_columns,
        }
    }
}
