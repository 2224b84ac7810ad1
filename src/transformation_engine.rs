use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    class_builder::{BuiltModel, ClassBuildError, ClassBuilder},
    config::{GeneratorConfig, ConfigError, LINKML_PREFIX, LINKML_TYPES_IMPORT, LINKML_URI},
    ea_reader::{EaProjectReader, ReaderError},
    linkml_model::SchemaDefinition,
    package_partitioner::{partition, OwnedElement, PackageError, PackagePartition, PackageTree},
    relation_resolver::RelationResolver,
    reporter::ReportError,
    row_grouper::{parse_uml_classes, GroupError},
    uml_model::{non_blank, ClassRow, ObjectId, Package, PackageId, SourceClass, SourceRelation},
    writer::{self, WriterError},
};

/// Main engine that turns model rows into one or more LinkML schemas
pub struct SchemaTransformationEngine {
    config: GeneratorConfig,
}

/// A finished schema together with where it should be written
#[derive(Debug, Clone)]
pub struct GeneratedSchema {
    pub package_id: Option<PackageId>,
    pub output_path: PathBuf,
    pub schema: SchemaDefinition,
}

/// Result of a transformation run
#[derive(Debug, Clone)]
pub struct TransformationResult {
    pub schemas: Vec<GeneratedSchema>,
    pub warnings: Vec<TransformationWarning>,
    pub stats: TransformationStats,
}

/// Counters collected across the build phases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationStats {
    pub source_classes: usize,
    pub classes: usize,
    pub enums: usize,
    pub slots: usize,
    pub skipped_primitives: usize,
    pub generalizations: usize,
    pub relation_slots: usize,
    pub skipped_relations: usize,
}

/// Warning generated during transformation
#[derive(Debug, Clone)]
pub struct TransformationWarning {
    pub message: String,
    pub field_path: Option<String>,
    pub warning_type: TransformationWarningType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationWarningType {
    DuplicateGeneralization,
    SlotNameCollision,
    DuplicateName,
    UnpartitionedElement,
}

/// Errors that abort the whole build
#[derive(Debug, Error)]
pub enum TransformationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed model rows: {0}")]
    Rows(#[from] GroupError),

    #[error("Class build failed: {0}")]
    ClassBuild(#[from] ClassBuildError),

    #[error("Package hierarchy error: {0}")]
    Package(#[from] PackageError),

    #[error("Project read failed: {0}")]
    Reader(#[from] ReaderError),

    #[error("Schema output failed: {0}")]
    Writer(#[from] WriterError),

    #[error("Report failed: {0}")]
    Report(#[from] ReportError),
}

impl SchemaTransformationEngine {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Read rows, and packages when needed, from a project file and
    /// transform them.
    pub fn transform_project(
        &self,
        reader: &EaProjectReader,
    ) -> Result<TransformationResult, TransformationError> {
        let rows = reader.read_class_rows()?;
        let packages = if self.config.schema_per_package {
            reader.read_packages()?
        } else {
            Vec::new()
        };
        info!(path = %reader.path().display(), rows = rows.len(), packages = packages.len(), "Loaded project");

        self.transform(rows, &packages)
    }

    /// Write every schema of `result` below `root`.
    pub fn write_schemas(
        &self,
        result: &TransformationResult,
        root: &Path,
    ) -> Result<Vec<PathBuf>, TransformationError> {
        Ok(writer::write_all(&result.schemas, root)?)
    }

    /// Run every phase in order. Nothing is returned unless all phases succeed.
    ///
    /// `packages` is only consulted when the configuration asks for one
    /// schema per package.
    pub fn transform<R>(
        &self,
        rows: R,
        packages: &[Package],
    ) -> Result<TransformationResult, TransformationError>
    where
        R: IntoIterator<Item = ClassRow>,
    {
        self.config.validate()?;

        let source_classes: Vec<SourceClass> =
            parse_uml_classes(rows).collect::<Result<_, _>>()?;

        let mut model = ClassBuilder::new(&self.config.prefix, &source_classes).build()?;

        let resolution = RelationResolver::new(&self.config.prefix, self.config.relation_cardinality)
            .resolve(&mut model.classes, unique_relations(&source_classes));

        let mut warnings = std::mem::take(&mut model.warnings);
        warnings.extend(resolution.warnings);

        let stats = TransformationStats {
            source_classes: source_classes.len(),
            classes: model.classes.len(),
            enums: model.enums.len(),
            slots: model.classes.values().map(|c| c.attributes.len()).sum(),
            skipped_primitives: model.skipped_primitives,
            generalizations: resolution.generalizations,
            relation_slots: resolution.relation_slots,
            skipped_relations: resolution.skipped_relations,
        };

        let schemas = if self.config.schema_per_package {
            self.build_package_schemas(&model, packages, &mut warnings)?
        } else {
            vec![self.build_unified_schema(&model, &mut warnings)]
        };

        info!(
            schemas = schemas.len(),
            classes = stats.classes,
            enums = stats.enums,
            warnings = warnings.len(),
            "Transformation complete"
        );

        Ok(TransformationResult {
            schemas,
            warnings,
            stats,
        })
    }

    fn base_schema(&self, id: String, name: String, title: String) -> SchemaDefinition {
        SchemaDefinition::new(id, name)
            .with_title(title)
            .with_prefix(&self.config.prefix, &self.config.namespace_uri)
            .with_prefix(LINKML_PREFIX, LINKML_URI)
            .with_default_prefix(&self.config.prefix)
            .with_import(LINKML_TYPES_IMPORT)
    }

    fn build_unified_schema(
        &self,
        model: &BuiltModel,
        warnings: &mut Vec<TransformationWarning>,
    ) -> GeneratedSchema {
        let mut schema = self.base_schema(
            self.config.schema_id.clone(),
            self.config.schema_name.clone(),
            self.config.schema_title.clone(),
        );
        fill_schema(&mut schema, model, model.classes.keys(), model.enums.keys(), warnings);

        info!(id = %schema.id, classes = schema.classes.len(), enums = schema.enums.len(), "Assembled schema");

        GeneratedSchema {
            package_id: None,
            output_path: self.config.output_file.clone(),
            schema,
        }
    }

    fn build_package_schemas(
        &self,
        model: &BuiltModel,
        packages: &[Package],
        warnings: &mut Vec<TransformationWarning>,
    ) -> Result<Vec<GeneratedSchema>, TransformationError> {
        let tree = PackageTree::new(packages.iter().cloned());
        let classes = owned_elements(model, model.classes.iter().map(|(id, c)| (*id, &c.name)));
        let enums = owned_elements(model, model.enums.iter().map(|(id, e)| (*id, &e.name)));

        let (partitions, partition_warnings) = partition(&tree, &classes, &enums)?;
        warnings.extend(partition_warnings);

        Ok(partitions
            .iter()
            .map(|p| self.build_partition_schema(model, p, warnings))
            .collect())
    }

    fn build_partition_schema(
        &self,
        model: &BuiltModel,
        partition: &PackagePartition,
        warnings: &mut Vec<TransformationWarning>,
    ) -> GeneratedSchema {
        let mut schema = self
            .base_schema(
                self.config.package_schema_id(&partition.path),
                partition.package.name.clone(),
                partition.package.name.clone(),
            )
            .with_description(non_blank(partition.package.notes.as_deref()));
        fill_schema(&mut schema, model, &partition.class_ids, &partition.enum_ids, warnings);

        info!(id = %schema.id, classes = schema.classes.len(), enums = schema.enums.len(), "Assembled package schema");

        GeneratedSchema {
            package_id: Some(partition.package.id),
            output_path: partition.output_path(&self.config.output_dir),
            schema,
        }
    }
}

/// Copy the selected classes and enums into `schema` under their names.
/// Within one schema a later definition replaces an earlier one of the
/// same name.
fn fill_schema<'m>(
    schema: &mut SchemaDefinition,
    model: &BuiltModel,
    class_ids: impl IntoIterator<Item = &'m ObjectId>,
    enum_ids: impl IntoIterator<Item = &'m ObjectId>,
    warnings: &mut Vec<TransformationWarning>,
) {
    for id in class_ids {
        if let Some(class) = model.classes.get(id) {
            insert_named(&mut schema.classes, &class.name, class.clone(), "class", &schema.id, warnings);
        }
    }
    for id in enum_ids {
        if let Some(definition) = model.enums.get(id) {
            insert_named(&mut schema.enums, &definition.name, definition.clone(), "enum", &schema.id, warnings);
        }
    }
}

fn insert_named<T>(
    map: &mut IndexMap<String, T>,
    name: &str,
    definition: T,
    kind: &str,
    schema_id: &str,
    warnings: &mut Vec<TransformationWarning>,
) {
    if map.insert(name.to_string(), definition).is_some() {
        warn!(kind, duplicate = name, schema = schema_id, "Duplicate name, keeping the later definition");
        warnings.push(
            TransformationWarning::new(
                format!("More than one {} is named `{}` in schema {}", kind, name, schema_id),
                TransformationWarningType::DuplicateName,
            )
            .with_field_path(name.to_string()),
        );
    }
}

/// Pair each element, in build order, with its owning package.
fn owned_elements<'m>(
    model: &BuiltModel,
    elements: impl Iterator<Item = (ObjectId, &'m String)>,
) -> Vec<OwnedElement> {
    elements
        .map(|(id, name)| OwnedElement {
            id,
            name: name.clone(),
            package_id: model.packages.get(&id).copied().flatten(),
        })
        .collect()
}

/// Connectors in first-appearance order; each is listed under both of its
/// endpoint classes but must be applied once.
fn unique_relations(classes: &[SourceClass]) -> Vec<&SourceRelation> {
    let mut seen = HashSet::new();
    classes
        .iter()
        .flat_map(|class| class.relations.iter())
        .filter(|relation| seen.insert(relation.id))
        .collect()
}

impl TransformationWarning {
    pub fn new(message: String, warning_type: TransformationWarningType) -> Self {
        Self {
            message,
            field_path: None,
            warning_type,
        }
    }

    pub fn with_field_path(mut self, field_path: String) -> Self {
        self.field_path = Some(field_path);
        self
    }
}
