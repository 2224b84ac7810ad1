use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::curie::{generate_curie, member_curie, slot_name};
use crate::linkml_model::{ClassDefinition, EnumDefinition, PermissibleValue, Range, SlotDefinition};
use crate::primitive::{map_primitive_data_type, PrimitiveTypeError};
use crate::transformation_engine::{TransformationWarning, TransformationWarningType};
use crate::uml_model::{non_blank, ObjectId, PackageId, SourceAttribute, SourceClass, Stereotype};

/// Classes and enums produced by the first pass.
///
/// Nodes are keyed by source object id, not by name: two packages may each
/// hold a class with the same name, and both must survive until schemas
/// are assembled.
#[derive(Debug, Clone, Default)]
pub struct BuiltModel {
    pub classes: IndexMap<ObjectId, ClassDefinition>,
    pub enums: IndexMap<ObjectId, EnumDefinition>,
    /// Owning package of every built class and enum
    pub packages: HashMap<ObjectId, Option<PackageId>>,
    pub skipped_primitives: usize,
    pub warnings: Vec<TransformationWarning>,
}

/// First pass: one class or enum node per source class
pub struct ClassBuilder<'a> {
    prefix: &'a str,
    classes: &'a [SourceClass],
    name_index: HashMap<&'a str, Stereotype>,
}

impl<'a> ClassBuilder<'a> {
    pub fn new(prefix: &'a str, classes: &'a [SourceClass]) -> Self {
        let mut name_index = HashMap::new();
        for class in classes {
            name_index.entry(class.name.as_str()).or_insert(class.stereotype);
        }

        Self {
            prefix,
            classes,
            name_index,
        }
    }

    pub fn build(&self) -> Result<BuiltModel, ClassBuildError> {
        let mut model = BuiltModel::default();

        for class in self.classes {
            match class.stereotype {
                Stereotype::Primitive => {
                    debug!(class = %class.name, "Skipping primitive class");
                    model.skipped_primitives += 1;
                }
                Stereotype::Enumeration => {
                    let definition = self.build_enum(class);
                    model.enums.insert(class.id, definition);
                    model.packages.insert(class.id, class.package_id);
                }
                Stereotype::Plain | Stereotype::DataType => {
                    let definition = self.build_class(class, &mut model.warnings)?;
                    model.classes.insert(class.id, definition);
                    model.packages.insert(class.id, class.package_id);
                }
            }
        }

        Ok(model)
    }

    fn build_enum(&self, class: &SourceClass) -> EnumDefinition {
        let permissible_values: IndexMap<_, _> = class
            .attributes
            .values()
            .map(|attr| {
                let value = PermissibleValue {
                    text: attr.name.clone(),
                    meaning: member_curie(self.prefix, &class.name, &attr.name),
                    description: non_blank(attr.note.as_deref()),
                };
                (attr.name.clone(), value)
            })
            .collect();

        debug!(enum_name = %class.name, values = permissible_values.len(), "Built enum");

        EnumDefinition {
            name: class.name.clone(),
            enum_uri: generate_curie(self.prefix, &class.name),
            description: non_blank(class.note.as_deref()),
            permissible_values,
        }
    }

    fn build_class(
        &self,
        class: &SourceClass,
        warnings: &mut Vec<TransformationWarning>,
    ) -> Result<ClassDefinition, ClassBuildError> {
        let mut attributes = IndexMap::new();

        for attr in class.attributes.values() {
            let slot = self.build_slot(class, attr)?;
            let key = slot.name.clone();
            if attributes.insert(key.clone(), slot).is_some() {
                warn!(class = %class.name, slot = %key, "Attribute slot name collision, keeping the later attribute");
                warnings.push(
                    TransformationWarning::new(
                        format!("Slot `{}` on class `{}` was defined twice", key, class.name),
                        TransformationWarningType::SlotNameCollision,
                    )
                    .with_field_path(format!("{}.{}", class.name, key)),
                );
            }
        }

        debug!(class = %class.name, slots = attributes.len(), "Built class");

        Ok(ClassDefinition {
            name: class.name.clone(),
            class_uri: generate_curie(self.prefix, &class.name),
            is_a: None,
            description: non_blank(class.note.as_deref()),
            attributes,
        })
    }

    fn build_slot(
        &self,
        class: &SourceClass,
        attr: &SourceAttribute,
    ) -> Result<SlotDefinition, ClassBuildError> {
        Ok(SlotDefinition {
            name: slot_name(&attr.name),
            slot_uri: member_curie(self.prefix, &class.name, &attr.name),
            range: self.resolve_range(class, attr)?,
            description: non_blank(attr.note.as_deref()),
            required: attr.cardinality.is_required(),
            multivalued: attr.cardinality.is_multivalued(),
        })
    }

    /// Resolve an attribute's declared type against the class-name index,
    /// falling back to the primitive catalogue for types with no class.
    fn resolve_range(
        &self,
        class: &SourceClass,
        attr: &SourceAttribute,
    ) -> Result<Range, ClassBuildError> {
        let type_name = attr
            .type_name
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClassBuildError::MissingType {
                class: class.name.clone(),
                attribute: attr.name.clone(),
            })?;

        match self.name_index.get(type_name) {
            Some(Stereotype::Primitive) => map_primitive_data_type(type_name)
                .map(Range::Primitive)
                .map_err(|source| ClassBuildError::Primitive {
                    class: class.name.clone(),
                    attribute: attr.name.clone(),
                    source,
                }),
            Some(_) => Ok(Range::Class(type_name.to_string())),
            None => map_primitive_data_type(type_name)
                .map(Range::Primitive)
                .map_err(|_| ClassBuildError::UnresolvedType {
                    class: class.name.clone(),
                    attribute: attr.name.clone(),
                    type_name: type_name.to_string(),
                }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassBuildError {
    #[error("Attribute `{class}.{attribute}` has no declared type")]
    MissingType { class: String, attribute: String },

    #[error("Attribute `{class}.{attribute}` has type `{type_name}`, which is neither a class nor a CIM primitive")]
    UnresolvedType {
        class: String,
        attribute: String,
        type_name: String,
    },

    #[error("Attribute `{class}.{attribute}`: {source}")]
    Primitive {
        class: String,
        attribute: String,
        source: PrimitiveTypeError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::LinkmlType;
    use crate::row_grouper::parse_uml_classes;
    use crate::uml_model::ClassRow;

    fn class(model: &BuiltModel, id: ObjectId) -> &ClassDefinition {
        &model.classes[&id]
    }

    fn classes(yaml: &str) -> Vec<SourceClass> {
        let rows: Vec<ClassRow> = serde_yaml::from_str(yaml).unwrap();
        parse_uml_classes(rows).collect::<Result<_, _>>().unwrap()
    }

    const MODEL: &str = r#"
        - { class_id: 1, class_name: Float, class_stereotype: Primitive }
        - { class_id: 2, class_name: PhaseCode, class_stereotype: enumeration, attr_id: 20, attr_name: A, attr_note: Phase A }
        - { class_id: 2, class_name: PhaseCode, class_stereotype: enumeration, attr_id: 21, attr_name: B }
        - { class_id: 3, class_name: Conductor, class_package_id: 9, class_note: A wire, attr_id: 30, attr_name: length, attr_cardinality: "0..1", attr_type: Float }
        - { class_id: 3, class_name: Conductor, class_package_id: 9, attr_id: 31, attr_name: phases, attr_cardinality: "2..n", attr_type: PhaseCode }
        - { class_id: 3, class_name: Conductor, class_package_id: 9, attr_id: 32, attr_name: aliasName, attr_type: String }
        - { class_id: 4, class_name: Bare }
    "#;

    #[test]
    fn test_primitive_classes_are_skipped() {
        let source = classes(MODEL);
        let model = ClassBuilder::new("cim", &source).build().unwrap();

        assert!(!model.classes.contains_key(&1_i64));
        assert!(!model.enums.contains_key(&1_i64));
        assert!(!model.packages.contains_key(&1_i64));
        assert_eq!(model.skipped_primitives, 1);
    }

    #[test]
    fn test_enum_values_in_source_order() {
        let source = classes(MODEL);
        let model = ClassBuilder::new("cim", &source).build().unwrap();

        let phase_code = &model.enums[&2_i64];
        assert_eq!(phase_code.enum_uri, "cim:PhaseCode");
        let values: Vec<_> = phase_code.permissible_values.keys().cloned().collect();
        assert_eq!(values, vec!["A", "B"]);
        assert_eq!(phase_code.permissible_values["A"].meaning, "cim:PhaseCode.A");
        assert_eq!(phase_code.permissible_values["A"].description.as_deref(), Some("Phase A"));
    }

    #[test]
    fn test_class_slots() {
        let source = classes(MODEL);
        let model = ClassBuilder::new("cim", &source).build().unwrap();

        let conductor = class(&model, 3);
        assert_eq!(conductor.class_uri, "cim:Conductor");
        assert_eq!(conductor.description.as_deref(), Some("A wire"));

        let keys: Vec<_> = conductor.attributes.keys().cloned().collect();
        assert_eq!(keys, vec!["length", "phases", "alias_name"]);

        let length = &conductor.attributes["length"];
        assert_eq!(length.range, Range::Primitive(LinkmlType::Float));
        assert_eq!(length.slot_uri, "cim:Conductor.length");
        assert!(!length.required);
        assert!(!length.multivalued);

        let phases = &conductor.attributes["phases"];
        assert_eq!(phases.range, Range::Class("PhaseCode".to_string()));
        assert!(phases.required);
        assert!(phases.multivalued);

        // String has no class in this model but is a known primitive name
        assert_eq!(
            conductor.attributes["alias_name"].range,
            Range::Primitive(LinkmlType::String)
        );

        assert_eq!(conductor.name, "Conductor");
        assert_eq!(model.packages[&3_i64], Some(9));
    }

    #[test]
    fn test_class_without_attributes() {
        let source = classes(MODEL);
        let model = ClassBuilder::new("cim", &source).build().unwrap();

        assert!(class(&model, 4).attributes.is_empty());
    }

    #[test]
    fn test_unresolved_type_is_fatal() {
        let source = classes(
            r#"
            - { class_id: 1, class_name: A, attr_id: 1, attr_name: x, attr_type: Nowhere }
            "#,
        );

        let err = ClassBuilder::new("cim", &source).build().unwrap_err();
        assert!(matches!(err, ClassBuildError::UnresolvedType { ref type_name, .. } if type_name == "Nowhere"));
    }

    #[test]
    fn test_unknown_primitive_class_is_fatal() {
        let source = classes(
            r#"
            - { class_id: 1, class_name: Complex, class_stereotype: Primitive }
            - { class_id: 2, class_name: A, attr_id: 1, attr_name: z, attr_type: Complex }
            "#,
        );

        let err = ClassBuilder::new("cim", &source).build().unwrap_err();
        assert!(matches!(err, ClassBuildError::Primitive { .. }));
    }

    #[test]
    fn test_missing_type_is_fatal() {
        let source = classes("- { class_id: 1, class_name: A, attr_id: 1, attr_name: x }");

        let err = ClassBuilder::new("cim", &source).build().unwrap_err();
        assert!(matches!(err, ClassBuildError::MissingType { .. }));
    }

    #[test]
    fn test_slot_name_collision_is_recorded() {
        let source = classes(
            r#"
            - { class_id: 1, class_name: A, attr_id: 1, attr_name: mRID, attr_type: String }
            - { class_id: 1, class_name: A, attr_id: 2, attr_name: MRid, attr_type: Integer }
            "#,
        );

        let model = ClassBuilder::new("cim", &source).build().unwrap();
        let class = class(&model, 1);
        assert_eq!(class.attributes.len(), 1);
        assert_eq!(class.attributes["m_rid"].range, Range::Primitive(LinkmlType::Integer));
        assert_eq!(model.warnings.len(), 1);
        assert!(matches!(model.warnings[0].warning_type, TransformationWarningType::SlotNameCollision));
    }

    #[test]
    fn test_same_name_in_two_packages_keeps_both() {
        let source = classes(
            r#"
            - { class_id: 10, class_name: Status, class_package_id: 1, attr_id: 1, attr_name: a, attr_type: String }
            - { class_id: 20, class_name: Status, class_package_id: 2, attr_id: 2, attr_name: b, attr_type: String }
            "#,
        );

        let model = ClassBuilder::new("cim", &source).build().unwrap();
        assert_eq!(model.classes.len(), 2);
        assert!(class(&model, 10).attributes.contains_key("a"));
        assert!(class(&model, 20).attributes.contains_key("b"));
        assert_eq!(model.packages[&20_i64], Some(2));
        assert!(model.warnings.is_empty());
    }
}
