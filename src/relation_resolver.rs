use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::cardinality::Cardinality;
use crate::config::RelationCardinality;
use crate::curie::{member_curie, slot_name};
use crate::linkml_model::{ClassDefinition, Range, SlotDefinition};
use crate::transformation_engine::{TransformationWarning, TransformationWarningType};
use crate::uml_model::{ObjectId, SourceRelation};

/// Outcome of wiring relations into already built classes
#[derive(Debug, Clone, Default)]
pub struct ResolutionSummary {
    pub generalizations: usize,
    pub relation_slots: usize,
    pub skipped_relations: usize,
    pub warnings: Vec<TransformationWarning>,
}

/// Second pass: turns connectors into `is_a` links and paired slots.
///
/// Every class must already exist; endpoints are looked up by source object
/// id and connectors touching anything that is not a plain class are
/// skipped. Slot ranges and `is_a` carry the target class's name.
pub struct RelationResolver<'a> {
    prefix: &'a str,
    policy: RelationCardinality,
}

/// One end of a connector, seen from the class that gets the slot
struct SlotEnd<'r> {
    owner_id: ObjectId,
    owner: &'r str,
    target: &'r str,
    role: Option<&'r str>,
    note: Option<&'r str>,
    cardinality: Cardinality,
}

impl<'a> RelationResolver<'a> {
    pub fn new(prefix: &'a str, policy: RelationCardinality) -> Self {
        Self { prefix, policy }
    }

    pub fn resolve<'r, I>(
        &self,
        classes: &mut IndexMap<ObjectId, ClassDefinition>,
        relations: I,
    ) -> ResolutionSummary
    where
        I: IntoIterator<Item = &'r SourceRelation>,
    {
        let mut summary = ResolutionSummary::default();

        for relation in relations {
            let endpoints = (
                classes.get(&relation.start_object_id).map(|c| c.name.clone()),
                classes.get(&relation.end_object_id).map(|c| c.name.clone()),
            );
            let (start, end) = match endpoints {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    debug!(
                        connector = relation.id,
                        kind = %relation.connector_type,
                        "Skipping connector with a non-class endpoint"
                    );
                    summary.skipped_relations += 1;
                    continue;
                }
            };

            if relation.connector_type.is_generalization() {
                self.apply_generalization(classes, relation, &end, &mut summary);
            } else {
                self.synthesize_slots(classes, relation, &start, &end, &mut summary);
            }
        }

        summary
    }

    fn apply_generalization(
        &self,
        classes: &mut IndexMap<ObjectId, ClassDefinition>,
        relation: &SourceRelation,
        supertype: &str,
        summary: &mut ResolutionSummary,
    ) {
        let Some(class) = classes.get_mut(&relation.start_object_id) else {
            summary.skipped_relations += 1;
            return;
        };

        let parent = match class.is_a.clone() {
            None => {
                class.is_a = Some(supertype.to_string());
                summary.generalizations += 1;
                return;
            }
            Some(parent) => parent,
        };

        let subtype = class.name.as_str();
        if parent == supertype {
            debug!(class = subtype, parent = supertype, "Repeated generalization");
            return;
        }

        warn!(
            class = subtype,
            kept = %parent,
            ignored = supertype,
            connector = relation.id,
            "Class has more than one parent, keeping the first"
        );
        summary.warnings.push(
            TransformationWarning::new(
                format!(
                    "Class `{}` already inherits from `{}`; generalization to `{}` ignored",
                    subtype, parent, supertype
                ),
                TransformationWarningType::DuplicateGeneralization,
            )
            .with_field_path(subtype.to_string()),
        );
    }

    fn synthesize_slots(
        &self,
        classes: &mut IndexMap<ObjectId, ClassDefinition>,
        relation: &SourceRelation,
        start: &str,
        end: &str,
        summary: &mut ResolutionSummary,
    ) {
        let source_card = relation.source_card.unwrap_or_default();
        let start_card = match self.policy {
            RelationCardinality::Source => source_card,
            RelationCardinality::PerEndpoint => relation.dest_card.unwrap_or_default(),
        };

        let ends = [
            SlotEnd {
                owner_id: relation.start_object_id,
                owner: start,
                target: end,
                role: relation.dest_role.as_deref(),
                note: relation.dest_role_note.as_deref().or(relation.note.as_deref()),
                cardinality: start_card,
            },
            SlotEnd {
                owner_id: relation.end_object_id,
                owner: end,
                target: start,
                role: relation.source_role.as_deref(),
                note: relation.source_role_note.as_deref().or(relation.note.as_deref()),
                cardinality: source_card,
            },
        ];

        for slot_end in ends {
            let role = slot_end.role.unwrap_or(slot_end.target);
            let slot = SlotDefinition {
                name: slot_name(role),
                slot_uri: member_curie(self.prefix, slot_end.owner, role),
                range: Range::Class(slot_end.target.to_string()),
                description: slot_end.note.map(str::to_string),
                required: slot_end.cardinality.is_required(),
                multivalued: slot_end.cardinality.is_multivalued(),
            };

            let Some(class) = classes.get_mut(&slot_end.owner_id) else {
                continue;
            };

            let key = slot.name.clone();
            if let Some(previous) = class.attributes.insert(key.clone(), slot) {
                warn!(
                    class = slot_end.owner,
                    slot = %key,
                    replaced_range = %previous.range,
                    connector = relation.id,
                    "Slot name collision, the later connector wins"
                );
                summary.warnings.push(
                    TransformationWarning::new(
                        format!(
                            "Slot `{}` on class `{}` replaced by connector {}",
                            key, slot_end.owner, relation.id
                        ),
                        TransformationWarningType::SlotNameCollision,
                    )
                    .with_field_path(format!("{}.{}", slot_end.owner, key)),
                );
            }
            summary.relation_slots += 1;
        }
    }
}
