use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::transformation_engine::{TransformationResult, TransformationWarningType};

/// Reporter for summarizing a transformation run in various formats
pub struct TransformationReporter {
    output_format: ReportFormat,
}

/// Available output formats for transformation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Console,
    Json,
    Yaml,
}

/// Comprehensive summary of one transformation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationReport {
    pub schemas: Vec<SchemaSummary>,
    pub element_summary: ElementSummary,
    pub relation_summary: RelationSummary,
    pub warnings: Vec<WarningEntry>,
    pub recommendations: Vec<String>,
}

/// One written schema and its size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub id: String,
    pub output_path: PathBuf,
    pub classes: usize,
    pub enums: usize,
    pub slots: usize,
}

/// Summary of the classes, enums and slots built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSummary {
    pub source_classes: usize,
    pub classes: usize,
    pub enums: usize,
    pub slots: usize,
    pub skipped_primitives: usize,
}

/// Summary of connector resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSummary {
    pub generalizations: usize,
    pub relation_slots: usize,
    pub skipped_relations: usize,
}

/// A build warning in serializable form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningEntry {
    /// Warning category, e.g. `DuplicateGeneralization`
    pub kind: String,
    pub path: Option<String>,
    pub message: String,
}

impl TransformationReporter {
    /// Create a reporter with console output
    pub fn new() -> Self {
        Self {
            output_format: ReportFormat::Console,
        }
    }

    /// Set the output format
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Generate a report for a finished transformation
    pub fn generate_report(&self, result: &TransformationResult) -> TransformationReport {
        let stats = &result.stats;

        let schemas = result
            .schemas
            .iter()
            .map(|generated| SchemaSummary {
                id: generated.schema.id.clone(),
                output_path: generated.output_path.clone(),
                classes: generated.schema.classes.len(),
                enums: generated.schema.enums.len(),
                slots: generated.schema.slot_count(),
            })
            .collect();

        let warnings = result
            .warnings
            .iter()
            .map(|w| WarningEntry {
                kind: format!("{:?}", w.warning_type),
                path: w.field_path.clone(),
                message: w.message.clone(),
            })
            .collect();

        TransformationReport {
            schemas,
            element_summary: ElementSummary {
                source_classes: stats.source_classes,
                classes: stats.classes,
                enums: stats.enums,
                slots: stats.slots,
                skipped_primitives: stats.skipped_primitives,
            },
            relation_summary: RelationSummary {
                generalizations: stats.generalizations,
                relation_slots: stats.relation_slots,
                skipped_relations: stats.skipped_relations,
            },
            warnings,
            recommendations: self.generate_recommendations(result),
        }
    }

    /// Format the report according to the configured output format
    pub fn format_report(&self, report: &TransformationReport) -> Result<String, ReportError> {
        match self.output_format {
            ReportFormat::Console => Ok(self.format_console_report(report)),
            ReportFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| ReportError::SerializationError(e.to_string())),
            ReportFormat::Yaml => serde_yaml::to_string(report)
                .map_err(|e| ReportError::SerializationError(e.to_string())),
        }
    }

    /// Generate recommendations based on the warnings raised
    fn generate_recommendations(&self, result: &TransformationResult) -> Vec<String> {
        let mut recommendations = Vec::new();
        let has = |kind: TransformationWarningType| result.warnings.iter().any(|w| w.warning_type == kind);

        if has(TransformationWarningType::DuplicateGeneralization) {
            recommendations.push(
                "Some classes have several generalizations; only the first parent was kept".to_string(),
            );
        }
        if has(TransformationWarningType::SlotNameCollision) {
            recommendations.push(
                "Give distinct role names to connectors that produce the same slot name".to_string(),
            );
        }
        if has(TransformationWarningType::DuplicateName) {
            recommendations.push("Rename classes that share a name across packages".to_string());
        }
        if has(TransformationWarningType::UnpartitionedElement) {
            recommendations.push(
                "Move classes out of the model root package to include them in per-package output"
                    .to_string(),
            );
        }

        recommendations
    }

    /// Format report for console output
    fn format_console_report(&self, report: &TransformationReport) -> String {
        let mut output = String::new();

        output.push_str("=== Schema Generation Report ===\n\n");
        let e = &report.element_summary;
        output.push_str(&format!("Source classes: {}\n", e.source_classes));
        output.push_str(&format!(
            "Classes: {}  Enums: {}  Slots: {}  Primitives skipped: {}\n",
            e.classes, e.enums, e.slots, e.skipped_primitives
        ));
        let r = &report.relation_summary;
        output.push_str(&format!(
            "Generalizations: {}  Relation slots: {}  Connectors skipped: {}\n",
            r.generalizations, r.relation_slots, r.skipped_relations
        ));

        output.push_str(&format!("\nSchemas ({}):\n", report.schemas.len()));
        for schema in &report.schemas {
            output.push_str(&format!(
                "  ✓ {} ({} classes, {} enums)\n",
                schema.output_path.display(),
                schema.classes,
                schema.enums
            ));
        }

        if !report.warnings.is_empty() {
            output.push_str(&format!("\nWarnings ({}):\n", report.warnings.len()));
            for warning in &report.warnings {
                output.push_str(&format!("  ⚠ {}\n", warning.message));
            }
        }

        if !report.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for rec in &report.recommendations {
                output.push_str(&format!("  • {}\n", rec));
            }
        }

        output
    }

    /// Format the report and write it to `path`
    pub fn write_report(&self, report: &TransformationReport, path: &Path) -> Result<(), ReportError> {
        let text = self.format_report(report)?;
        fs::write(path, text).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for TransformationReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur while producing a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::transformation_engine::SchemaTransformationEngine;
    use crate::uml_model::ClassRow;

    fn result() -> TransformationResult {
        let rows: Vec<ClassRow> = serde_yaml::from_str(
            r#"
            - { class_id: 1, class_name: Base }
            - { class_id: 2, class_name: Other }
            - { class_id: 3, class_name: Child, rel_id: 1, connector_type: Generalization, start_object_id: 3, end_object_id: 1 }
            - { class_id: 3, class_name: Child, rel_id: 2, connector_type: Generalization, start_object_id: 3, end_object_id: 2 }
            "#,
        )
        .unwrap();

        SchemaTransformationEngine::new(GeneratorConfig::default())
            .transform(rows, &[])
            .unwrap()
    }

    #[test]
    fn test_reporter_with_format() {
        let reporter = TransformationReporter::new().with_format(ReportFormat::Json);
        assert!(matches!(reporter.output_format, ReportFormat::Json));
    }

    #[test]
    fn test_generate_report() {
        let report = TransformationReporter::new().generate_report(&result());

        assert_eq!(report.schemas.len(), 1);
        assert_eq!(report.element_summary.classes, 3);
        assert_eq!(report.relation_summary.generalizations, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, "DuplicateGeneralization");
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_format_console_report() {
        let reporter = TransformationReporter::new();
        let report = reporter.generate_report(&result());

        let formatted = reporter.format_report(&report).unwrap();
        assert!(formatted.contains("Schema Generation Report"));
        assert!(formatted.contains("cim.yml"));
        assert!(formatted.contains("Generalizations: 1"));
        assert!(formatted.contains("only the first parent was kept"));
    }

    #[test]
    fn test_format_json_report() {
        let reporter = TransformationReporter::new().with_format(ReportFormat::Json);
        let report = reporter.generate_report(&result());

        let json = reporter.format_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["element_summary"]["classes"], 3);
    }

    #[test]
    fn test_write_yaml_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.yml");
        let reporter = TransformationReporter::new().with_format(ReportFormat::Yaml);
        let report = reporter.generate_report(&result());

        reporter.write_report(&report, &path).unwrap();

        let back: TransformationReport = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.relation_summary.generalizations, 1);
        assert_eq!(back.warnings[0].path.as_deref(), Some("Child"));
    }

    #[test]
    fn test_write_report_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let reporter = TransformationReporter::new().with_format(ReportFormat::Json);
        let report = reporter.generate_report(&result());

        assert!(matches!(reporter.write_report(&report, &path), Err(ReportError::Io { .. })));
    }
}
