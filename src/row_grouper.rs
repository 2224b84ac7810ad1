use indexmap::IndexMap;
use std::collections::HashSet;
use std::iter::Peekable;
use thiserror::Error;
use tracing::debug;

use crate::cardinality::{Cardinality, CardinalityError};
use crate::uml_model::{
    ClassRow, ModelError, ObjectId, RelationType, SourceAttribute, SourceClass, SourceRelation,
    Stereotype, non_blank,
};

/// Groups joined rows by owning class.
///
/// Rows of one class must be contiguous; a class id that shows up again
/// after another class started is rejected instead of producing a second
/// node with the same identity.
pub struct RowGrouper<I: Iterator<Item = ClassRow>> {
    rows: Peekable<I>,
    seen: HashSet<ObjectId>,
}

impl<I: Iterator<Item = ClassRow>> RowGrouper<I> {
    pub fn new<T>(rows: T) -> Self
    where
        T: IntoIterator<Item = ClassRow, IntoIter = I>,
    {
        Self {
            rows: rows.into_iter().peekable(),
            seen: HashSet::new(),
        }
    }
}

impl<I: Iterator<Item = ClassRow>> Iterator for RowGrouper<I> {
    type Item = Result<(ObjectId, Vec<ClassRow>), GroupError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rows.next()?;
        let class_id = first.class_id;

        if !self.seen.insert(class_id) {
            return Some(Err(GroupError::NonContiguousClass(class_id)));
        }

        let mut group = vec![first];
        while let Some(row) = self.rows.next_if(|row| row.class_id == class_id) {
            group.push(row);
        }

        Some(Ok((class_id, group)))
    }
}

/// Group rows and turn every group into a [`SourceClass`].
pub fn parse_uml_classes<T>(rows: T) -> impl Iterator<Item = Result<SourceClass, GroupError>>
where
    T: IntoIterator<Item = ClassRow>,
{
    RowGrouper::new(rows).map(|group| {
        let (class_id, rows) = group?;
        build_source_class(class_id, &rows)
    })
}

/// Materialize one class from its row group, splitting attribute rows from
/// connector rows and dropping the no-member sentinel row.
pub fn build_source_class(class_id: ObjectId, rows: &[ClassRow]) -> Result<SourceClass, GroupError> {
    let head = rows.first().ok_or(GroupError::EmptyGroup(class_id))?;

    let mut attributes = IndexMap::new();
    let mut relations: Vec<SourceRelation> = Vec::new();

    for row in rows.iter().filter(|row| !row.is_empty_member()) {
        if let Some(attr_id) = row.attr_id {
            let name = row
                .attr_name
                .clone()
                .ok_or(GroupError::MissingAttributeName { class_id, attr_id })?;
            let cardinality = Cardinality::parse(row.attr_cardinality.as_deref())?;

            attributes.insert(
                name.clone(),
                SourceAttribute {
                    id: attr_id,
                    name,
                    cardinality,
                    type_name: row.attr_type.clone(),
                    note: row.attr_note.clone(),
                    stereotype: row.attr_stereotype.clone(),
                },
            );
        } else if let Some(rel_id) = row.rel_id {
            // A self-association is listed once per endpoint of the same class.
            if relations.iter().any(|r| r.id == rel_id) {
                continue;
            }
            relations.push(parse_relation(class_id, rel_id, row)?);
        }
    }

    let stereotype = Stereotype::from_tag(head.class_stereotype.as_deref());
    debug!(
        class_id,
        class = %head.class_name,
        ?stereotype,
        attributes = attributes.len(),
        relations = relations.len(),
        "Grouped class rows"
    );

    Ok(SourceClass {
        id: class_id,
        name: head.class_name.clone(),
        package_id: head.class_package_id,
        note: head.class_note.clone(),
        stereotype,
        attributes,
        relations,
    })
}

fn parse_relation(
    class_id: ObjectId,
    rel_id: i64,
    row: &ClassRow,
) -> Result<SourceRelation, GroupError> {
    let incomplete = || GroupError::IncompleteRelation { class_id, rel_id };

    let connector_type = row
        .connector_type
        .as_deref()
        .ok_or_else(incomplete)?
        .parse::<RelationType>()?;
    let start_object_id = row.start_object_id.ok_or_else(incomplete)?;
    let end_object_id = row.end_object_id.ok_or_else(incomplete)?;

    Ok(SourceRelation {
        id: rel_id,
        connector_type,
        start_object_id,
        end_object_id,
        source_card: Cardinality::parse_optional(row.source_card.as_deref())?,
        dest_card: Cardinality::parse_optional(row.dest_card.as_deref())?,
        source_role: non_blank(row.source_role.as_deref()),
        dest_role: non_blank(row.dest_role.as_deref()),
        source_role_note: non_blank(row.source_role_note.as_deref()),
        dest_role_note: non_blank(row.dest_role_note.as_deref()),
        note: non_blank(row.rel_note.as_deref()),
    })
}

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Rows for class {0} are not contiguous")]
    NonContiguousClass(ObjectId),

    #[error("Class {0} has no rows")]
    EmptyGroup(ObjectId),

    #[error("Attribute {attr_id} of class {class_id} has no name")]
    MissingAttributeName { class_id: ObjectId, attr_id: i64 },

    #[error("Connector {rel_id} listed for class {class_id} is missing its type or endpoints")]
    IncompleteRelation { class_id: ObjectId, rel_id: i64 },

    #[error(transparent)]
    Cardinality(#[from] CardinalityError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(yaml: &str) -> Vec<ClassRow> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_groups_contiguous_rows() {
        let input = rows(
            r#"
            - { class_id: 1, class_name: A, attr_id: 10, attr_name: x }
            - { class_id: 1, class_name: A, attr_id: 11, attr_name: y }
            - { class_id: 2, class_name: B }
            - { class_id: 3, class_name: C, attr_id: 12, attr_name: z }
            "#,
        );

        let groups: Vec<_> = RowGrouper::new(input).collect::<Result<_, _>>().unwrap();
        let ids: Vec<_> = groups.iter().map(|(id, rows)| (*id, rows.len())).collect();
        assert_eq!(ids, vec![(1, 2), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_rejects_non_contiguous_class() {
        let input = rows(
            r#"
            - { class_id: 1, class_name: A }
            - { class_id: 2, class_name: B }
            - { class_id: 1, class_name: A, attr_id: 3, attr_name: late }
            "#,
        );

        let result: Result<Vec<_>, _> = RowGrouper::new(input).collect();
        assert!(matches!(result, Err(GroupError::NonContiguousClass(1))));
    }

    #[test]
    fn test_empty_member_row_yields_no_attributes() {
        let classes: Vec<_> = parse_uml_classes(rows("- { class_id: 5, class_name: Empty }"))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(classes.len(), 1);
        assert!(classes[0].attributes.is_empty());
        assert!(classes[0].relations.is_empty());
    }

    #[test]
    fn test_splits_attributes_and_relations() {
        let input = rows(
            r#"
            - class_id: 1
              class_name: Terminal
              class_package_id: 4
              class_stereotype: null
              attr_id: 100
              attr_name: sequenceNumber
              attr_cardinality: "0..1"
              attr_type: Integer
            - class_id: 1
              class_name: Terminal
              class_package_id: 4
              rel_id: 900
              connector_type: Association
              start_object_id: 1
              end_object_id: 2
              source_card: "0..n"
              dest_card: "1"
              dest_role: ConductingEquipment
              dest_role_note: "  "
            "#,
        );

        let class = build_source_class(1, &input).unwrap();
        assert_eq!(class.package_id, Some(4));
        assert_eq!(class.stereotype, Stereotype::Plain);

        let attr = &class.attributes["sequenceNumber"];
        assert_eq!(attr.cardinality, Cardinality::new(0, 1));
        assert_eq!(attr.type_name.as_deref(), Some("Integer"));

        let rel = &class.relations[0];
        assert_eq!(rel.connector_type, RelationType::Association);
        assert_eq!(rel.dest_card, Some(Cardinality::new(1, 1)));
        assert_eq!(rel.dest_role.as_deref(), Some("ConductingEquipment"));
        assert_eq!(rel.dest_role_note, None);
        assert_eq!(rel.source_role, None);
    }

    #[test]
    fn test_self_association_listed_once() {
        let input = rows(
            r#"
            - { class_id: 1, class_name: A, rel_id: 9, connector_type: Association, start_object_id: 1, end_object_id: 1 }
            - { class_id: 1, class_name: A, rel_id: 9, connector_type: Association, start_object_id: 1, end_object_id: 1 }
            "#,
        );

        let class = build_source_class(1, &input).unwrap();
        assert_eq!(class.relations.len(), 1);
    }

    #[test]
    fn test_malformed_cardinality_is_fatal() {
        let input = rows(
            r#"
            - { class_id: 1, class_name: A, attr_id: 1, attr_name: x, attr_cardinality: "zero..one" }
            "#,
        );

        let result: Result<Vec<_>, _> = parse_uml_classes(input).collect();
        assert!(matches!(result, Err(GroupError::Cardinality(_))));
    }

    #[test]
    fn test_preserves_attribute_order() {
        let input = rows(
            r#"
            - { class_id: 1, class_name: A, attr_id: 3, attr_name: zeta }
            - { class_id: 1, class_name: A, attr_id: 4, attr_name: alpha }
            - { class_id: 1, class_name: A, attr_id: 5, attr_name: mu }
            "#,
        );

        let class = build_source_class(1, &input).unwrap();
        let names: Vec<_> = class.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mu"]);
    }
}
