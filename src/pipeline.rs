use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::{
    schema_registry::{RegistryError, SchemaRegistry},
    schema_version::SchemaVersion,
    transformation_engine::AnnotationTransformer,
    transformation_rule::AppliedTransformation,
    validation::{SchemaValidator, ValidationReport},
};

/// Terminal state of one upgrade run, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeStatus {
    Success,
    AlreadyCurrent,
    TooLegacy,
    InternalError,
}

impl UpgradeStatus {
    /// Process exit code. Only `Success` exits zero.
    pub fn exit_code(self) -> u8 {
        match self {
            UpgradeStatus::Success => 0,
            UpgradeStatus::AlreadyCurrent | UpgradeStatus::TooLegacy => 1,
            UpgradeStatus::InternalError => 2,
        }
    }
}

/// What the pipeline hands back to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeOutcome {
    /// The upgraded dictionary, valid against the latest schema
    Success {
        dictionary: Value,
        changes: Vec<AppliedTransformation>,
    },
    /// The input already satisfies the latest schema; nothing was done
    AlreadyCurrent,
    /// The input does not satisfy the legacy schema either
    TooLegacy(ValidationReport),
    /// The upgraded dictionary failed the latest schema
    InternalError(ValidationReport),
}

impl UpgradeOutcome {
    pub fn status(&self) -> UpgradeStatus {
        match self {
            UpgradeOutcome::Success { .. } => UpgradeStatus::Success,
            UpgradeOutcome::AlreadyCurrent => UpgradeStatus::AlreadyCurrent,
            UpgradeOutcome::TooLegacy(_) => UpgradeStatus::TooLegacy,
            UpgradeOutcome::InternalError(_) => UpgradeStatus::InternalError,
        }
    }

    /// Validation errors behind a failed run, if any
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            UpgradeOutcome::TooLegacy(report) | UpgradeOutcome::InternalError(report) => Some(report),
            _ => None,
        }
    }
}

/// Validates, transforms and re-validates one data dictionary
pub struct UpgradePipeline {
    legacy: SchemaValidator,
    latest: SchemaValidator,
    transformer: AnnotationTransformer,
    source_version: SchemaVersion,
    target_version: SchemaVersion,
}

impl UpgradePipeline {
    pub fn new(registry: &SchemaRegistry) -> Result<Self, RegistryError> {
        Ok(Self {
            legacy: SchemaValidator::compile(registry.legacy_schema())?,
            latest: SchemaValidator::compile(registry.latest_schema())?,
            transformer: AnnotationTransformer::new(registry)?,
            source_version: registry.legacy_schema().version.clone(),
            target_version: registry.latest_schema().version.clone(),
        })
    }

    pub fn source_version(&self) -> &SchemaVersion {
        &self.source_version
    }

    pub fn target_version(&self) -> &SchemaVersion {
        &self.target_version
    }

    pub fn run(&self, dictionary: Value) -> UpgradeOutcome {
        if self.latest.is_valid(&dictionary) {
            return UpgradeOutcome::AlreadyCurrent;
        }

        let legacy_report = self.legacy.validate(&dictionary);
        if !legacy_report.is_valid() {
            return UpgradeOutcome::TooLegacy(legacy_report);
        }

        let result = self.transformer.transform(dictionary);

        let latest_report = self.latest.validate(&result.transformed);
        if !latest_report.is_valid() {
            return UpgradeOutcome::InternalError(latest_report);
        }

        UpgradeOutcome::Success {
            dictionary: result.transformed,
            changes: result.applied_transformations,
        }
    }
}

/// Run the upgrade against the bundled schemas
pub fn upgrade(dictionary: Value) -> Result<UpgradeOutcome, RegistryError> {
    Ok(UpgradePipeline::new(&SchemaRegistry::new())?.run(dictionary))
}
