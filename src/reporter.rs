use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::{
    pipeline::{UpgradeOutcome, UpgradeStatus},
    schema_version::SchemaVersion,
    transformation_rule::{AppliedTransformation, TransformationType},
    validation::ValidationError,
};

/// Where users should report dictionaries that upgrade into invalid output
pub const ISSUE_TRACKER: &str = "the bump-dictionary issue tracker";

/// Reporter for generating upgrade reports in various formats
pub struct TransformationReporter {
    output_format: ReportFormat,
}

/// Available output formats for upgrade reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Yaml,
}

/// Everything known about one upgrade run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeReport {
    pub status: UpgradeStatus,
    pub source_version: SchemaVersion,
    pub target_version: SchemaVersion,
    pub message: String,
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
    pub applied_transformations: Vec<AppliedTransformation>,
    pub transformation_summary: TransformationSummary,
}

/// Summary of transformation results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationSummary {
    pub total_transformations: usize,
    pub fields_removed: usize,
    pub fields_renamed: usize,
    /// Number of annotation blocks tagged with each variable type
    pub variable_types: BTreeMap<String, usize>,
}

impl TransformationReporter {
    pub fn new() -> Self {
        Self {
            output_format: ReportFormat::Console,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn format(&self) -> ReportFormat {
        self.output_format
    }

    /// Build the report for a finished run
    pub fn generate_report(
        &self,
        outcome: &UpgradeOutcome,
        source_version: &SchemaVersion,
        target_version: &SchemaVersion,
    ) -> UpgradeReport {
        let errors = outcome
            .validation_report()
            .map(|report| report.errors.clone())
            .unwrap_or_default();
        let applied_transformations = match outcome {
            UpgradeOutcome::Success { changes, .. } => changes.clone(),
            _ => Vec::new(),
        };

        UpgradeReport {
            status: outcome.status(),
            source_version: source_version.clone(),
            target_version: target_version.clone(),
            message: status_message(outcome.status()),
            error_count: errors.len(),
            errors,
            transformation_summary: self.create_transformation_summary(&applied_transformations),
            applied_transformations,
        }
    }

    /// Format the report according to the configured output format
    pub fn format_report(&self, report: &UpgradeReport) -> Result<String, ReportError> {
        match self.output_format {
            ReportFormat::Console => Ok(self.format_console_report(report)),
            ReportFormat::Json => self.format_json_report(report),
            ReportFormat::Yaml => self.format_yaml_report(report),
        }
    }

    fn create_transformation_summary(&self, transformations: &[AppliedTransformation]) -> TransformationSummary {
        let mut summary = TransformationSummary {
            total_transformations: transformations.len(),
            ..TransformationSummary::default()
        };

        for transformation in transformations {
            match &transformation.transformation_type {
                TransformationType::Remove => summary.fields_removed += 1,
                TransformationType::Rename(_) => summary.fields_renamed += 1,
                TransformationType::TagVariableType => {
                    if let Some(tag) = transformation.new_value.as_ref().and_then(|v| v.as_str()) {
                        *summary.variable_types.entry(tag.to_string()).or_default() += 1;
                    }
                }
            }
        }

        summary
    }

    /// Human-readable message, followed by the error list when there is one
    fn format_console_report(&self, report: &UpgradeReport) -> String {
        let mut output = report.message.clone();

        match report.status {
            UpgradeStatus::Success => {
                let summary = &report.transformation_summary;
                output.push_str(&format!(
                    "\nApplied {} change(s) upgrading schema {} to {}",
                    summary.total_transformations, report.source_version, report.target_version
                ));
                for (variable_type, count) in &summary.variable_types {
                    output.push_str(&format!("\n  {}: {} column(s)", variable_type, count));
                }
            }
            UpgradeStatus::AlreadyCurrent => {}
            UpgradeStatus::TooLegacy | UpgradeStatus::InternalError => {
                output.push_str(&format!("\nFound {} error(s):\n", report.error_count));
                for error in &report.errors {
                    output.push_str(&format!(" -> {}\n", error));
                }
            }
        }

        output
    }

    fn format_json_report(&self, report: &UpgradeReport) -> Result<String, ReportError> {
        serde_json::to_string_pretty(report)
            .map_err(|e| ReportError::SerializationError(e.to_string()))
    }

    fn format_yaml_report(&self, report: &UpgradeReport) -> Result<String, ReportError> {
        serde_yaml::to_string(report)
            .map_err(|e| ReportError::SerializationError(e.to_string()))
    }
}

impl Default for TransformationReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// The guidance shown to the user for each terminal state
pub fn status_message(status: UpgradeStatus) -> String {
    match status {
        UpgradeStatus::Success => "Successfully updated data dictionary.".to_string(),
        UpgradeStatus::AlreadyCurrent => {
            "Data dictionary is already up-to-date with the latest schema.".to_string()
        }
        UpgradeStatus::TooLegacy => "The data dictionary is not valid against the previous schema and may be too \
             outdated to upgrade automatically. Please re-annotate your dataset using the latest version of the \
             annotation tool to continue."
            .to_string(),
        UpgradeStatus::InternalError => format!(
            "Upgrading the data dictionary resulted in unexpected validation errors against the latest schema. \
             This is a bug in bump-dictionary, not a problem with your data dictionary. \
             Please report it on {} and include the input file.",
            ISSUE_TRACKER
        ),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationReport;
    use serde_json::json;

    fn too_legacy() -> UpgradeOutcome {
        UpgradeOutcome::TooLegacy(ValidationReport::new(vec![
            ValidationError::new("/participant_id/Description", "1 is not of type \"string\""),
            ValidationError::new("/age/Annotations", "{\"IsAbout\":\"age\"} is not valid under any of the given schemas"),
        ]))
    }

    fn tag(column: &str, variable_type: &str) -> AppliedTransformation {
        AppliedTransformation {
            rule_id: "tag_variable_type".to_string(),
            column: column.to_string(),
            source_field: "VariableType".to_string(),
            target_field: Some("VariableType".to_string()),
            old_value: None,
            new_value: Some(json!(variable_type)),
            transformation_type: TransformationType::TagVariableType,
        }
    }

    fn report(outcome: &UpgradeOutcome) -> UpgradeReport {
        TransformationReporter::new().generate_report(outcome, &SchemaVersion::LEGACY, &SchemaVersion::LATEST)
    }

    #[test]
    fn test_reporter_with_format() {
        assert_eq!(TransformationReporter::new().format(), ReportFormat::Console);
        let reporter = TransformationReporter::new().with_format(ReportFormat::Json);
        assert_eq!(reporter.format(), ReportFormat::Json);
    }

    #[test]
    fn test_too_legacy_console_report() {
        let formatted = TransformationReporter::new().format_report(&report(&too_legacy())).unwrap();

        assert!(formatted.contains("not valid against the previous schema"));
        assert!(formatted.contains("re-annotate"));
        assert!(formatted.contains("Found 2 error(s):"));
        let listed: Vec<&str> = formatted.lines().filter(|l| l.starts_with(" -> ")).collect();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].starts_with(" -> /participant_id/Description: "));
    }

    #[test]
    fn test_internal_error_points_at_issue_tracker() {
        let outcome = UpgradeOutcome::InternalError(ValidationReport::new(vec![ValidationError::new(
            "/age/Annotations",
            "not valid under any of the given schemas",
        )]));

        let formatted = TransformationReporter::new().format_report(&report(&outcome)).unwrap();

        assert!(formatted.contains(ISSUE_TRACKER));
        assert!(formatted.contains("This is a bug in bump-dictionary"));
        assert!(!formatted.contains("re-annotate"));
        assert!(formatted.contains("Found 1 error(s):"));
    }

    #[test]
    fn test_success_summary() {
        let outcome = UpgradeOutcome::Success {
            dictionary: json!({}),
            changes: vec![tag("participant_id", "Identifier"), tag("age", "Continuous"), tag("iq", "Continuous")],
        };

        let report = report(&outcome);

        assert_eq!(report.error_count, 0);
        assert_eq!(report.transformation_summary.total_transformations, 3);
        assert_eq!(report.transformation_summary.variable_types["Continuous"], 2);
        let formatted = TransformationReporter::new().format_report(&report).unwrap();
        assert!(formatted.contains("upgrading schema 1.0.0 to 2.0.0"));
        assert!(formatted.contains("Continuous: 2 column(s)"));
    }

    #[test]
    fn test_json_report() {
        let reporter = TransformationReporter::new().with_format(ReportFormat::Json);
        let formatted = reporter.format_report(&report(&too_legacy())).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&formatted).unwrap();

        assert_eq!(parsed["status"], json!("TooLegacy"));
        assert_eq!(parsed["error_count"], json!(2));
        assert_eq!(parsed["errors"][1]["field_path"], json!("/age/Annotations"));
    }

    #[test]
    fn test_yaml_report() {
        let reporter = TransformationReporter::new().with_format(ReportFormat::Yaml);
        let formatted = reporter.format_report(&report(&UpgradeOutcome::AlreadyCurrent)).unwrap();

        assert!(formatted.contains("status: AlreadyCurrent"));
        assert!(formatted.contains("already up-to-date"));
    }
}
