use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::cardinality::Cardinality;

pub type ObjectId = i64;
pub type AttributeId = i64;
pub type ConnectorId = i64;
pub type PackageId = i64;

/// Build strategy of a class, decided once from its stereotype tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stereotype {
    Plain,
    Enumeration,
    Primitive,
    DataType,
}

impl Stereotype {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("enumeration") => Stereotype::Enumeration,
            Some(t) if t.eq_ignore_ascii_case("primitive") => Stereotype::Primitive,
            Some(t) if t.eq_ignore_ascii_case("cimdatatype") => Stereotype::DataType,
            _ => Stereotype::Plain,
        }
    }
}

/// UML connector kinds as stored by the modeling tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    Abstraction,
    Aggregation,
    Assembly,
    Association,
    Collaboration,
    CommunicationPath,
    Connector,
    ControlFlow,
    Delegate,
    Dependency,
    Deployment,
    ErLink,
    Extension,
    Generalization,
    InformationFlow,
    Instantiation,
    InterruptFlow,
    Manifest,
    Nesting,
    NoteLink,
    ObjectFlow,
    Package,
    ProtocolConformance,
    ProtocolTransition,
    Realisation,
    Sequence,
    StateFlow,
    Substitution,
    Usage,
    UseCase,
}

impl RelationType {
    pub fn is_generalization(&self) -> bool {
        matches!(self, RelationType::Generalization)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for RelationType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let relation_type = match key.as_str() {
            "ABSTRACTION" => RelationType::Abstraction,
            "AGGREGATION" => RelationType::Aggregation,
            "ASSEMBLY" => RelationType::Assembly,
            "ASSOCIATION" => RelationType::Association,
            "COLLABORATION" => RelationType::Collaboration,
            "COMMUNICATIONPATH" => RelationType::CommunicationPath,
            "CONNECTOR" => RelationType::Connector,
            "CONTROLFLOW" => RelationType::ControlFlow,
            "DELEGATE" => RelationType::Delegate,
            "DEPENDENCY" => RelationType::Dependency,
            "DEPLOYMENT" => RelationType::Deployment,
            "ERLINK" => RelationType::ErLink,
            "EXTENSION" => RelationType::Extension,
            "GENERALIZATION" | "GENERALISATION" => RelationType::Generalization,
            "INFORMATIONFLOW" => RelationType::InformationFlow,
            "INSTANTIATION" => RelationType::Instantiation,
            "INTERRUPTFLOW" => RelationType::InterruptFlow,
            "MANIFEST" => RelationType::Manifest,
            "NESTING" => RelationType::Nesting,
            "NOTELINK" => RelationType::NoteLink,
            "OBJECTFLOW" => RelationType::ObjectFlow,
            "PACKAGE" => RelationType::Package,
            "PROTOCOLCONFORMANCE" => RelationType::ProtocolConformance,
            "PROTOCOLTRANSITION" => RelationType::ProtocolTransition,
            "REALISATION" | "REALIZATION" => RelationType::Realisation,
            "SEQUENCE" => RelationType::Sequence,
            "STATEFLOW" => RelationType::StateFlow,
            "SUBSTITUTION" => RelationType::Substitution,
            "USAGE" => RelationType::Usage,
            "USECASE" => RelationType::UseCase,
            _ => return Err(ModelError::UnknownRelationType(s.to_string())),
        };

        Ok(relation_type)
    }
}

/// One joined row from the class query: a class paired with at most one
/// attribute or one connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassRow {
    pub class_id: ObjectId,
    pub class_name: String,
    pub class_package_id: Option<PackageId>,
    pub class_stereotype: Option<String>,
    pub class_note: Option<String>,

    pub attr_id: Option<AttributeId>,
    pub attr_name: Option<String>,
    pub attr_cardinality: Option<String>,
    pub attr_type: Option<String>,
    pub attr_note: Option<String>,
    pub attr_stereotype: Option<String>,

    pub rel_id: Option<ConnectorId>,
    pub connector_type: Option<String>,
    pub start_object_id: Option<ObjectId>,
    pub end_object_id: Option<ObjectId>,
    pub source_card: Option<String>,
    pub dest_card: Option<String>,
    pub source_role: Option<String>,
    pub dest_role: Option<String>,
    pub source_role_note: Option<String>,
    pub dest_role_note: Option<String>,
    pub rel_note: Option<String>,
}

impl ClassRow {
    /// A class without members still yields one row with no attribute and no connector.
    pub fn is_empty_member(&self) -> bool {
        self.attr_id.is_none() && self.rel_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribute {
    pub id: AttributeId,
    pub name: String,
    pub cardinality: Cardinality,
    pub type_name: Option<String>,
    pub note: Option<String>,
    pub stereotype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRelation {
    pub id: ConnectorId,
    pub connector_type: RelationType,
    pub start_object_id: ObjectId,
    pub end_object_id: ObjectId,
    pub source_card: Option<Cardinality>,
    pub dest_card: Option<Cardinality>,
    pub source_role: Option<String>,
    pub dest_role: Option<String>,
    pub source_role_note: Option<String>,
    pub dest_role_note: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceClass {
    pub id: ObjectId,
    pub name: String,
    pub package_id: Option<PackageId>,
    pub note: Option<String>,
    pub stereotype: Stereotype,
    pub attributes: IndexMap<String, SourceAttribute>,
    pub relations: Vec<SourceRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
    pub parent_id: Option<PackageId>,
    pub notes: Option<String>,
}

impl Package {
    pub fn is_top_level(&self) -> bool {
        matches!(self.parent_id, None | Some(0))
    }
}

/// Trimmed text, or `None` when the tool stored nothing useful.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown connector type: {0}")]
    UnknownRelationType(String),
}
