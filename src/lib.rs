// Data dictionary schema upgrade
pub mod schema_version;
pub mod transformation_rule;
pub mod validation;
pub mod transformation_engine;
pub mod schema_registry;
pub mod pipeline;
pub mod reporter;
pub mod dictionary_io;

// Re-export core types for convenience
pub use schema_version::SchemaVersion;
pub use transformation_rule::{TransformationRule, TransformationType, AppliedTransformation, VariableType};
pub use validation::{validate, SchemaValidator, ValidationReport, ValidationError};
pub use transformation_engine::{AnnotationTransformer, TransformationResult};
pub use schema_registry::{RegistryError, SchemaDocument, SchemaRegistry};
pub use pipeline::{upgrade, UpgradeOutcome, UpgradePipeline, UpgradeStatus};
pub use reporter::{ReportFormat, TransformationReporter, UpgradeReport};
pub use dictionary_io::{load_dictionary, save_dictionary, DictionaryIoError};
