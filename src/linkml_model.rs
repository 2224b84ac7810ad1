use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::primitive::LinkmlType;

/// Root of one generated schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub prefixes: IndexMap<String, String>,
    pub default_prefix: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub classes: IndexMap<String, ClassDefinition>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub enums: IndexMap<String, EnumDefinition>,
}

impl SchemaDefinition {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            title: None,
            description: None,
            prefixes: IndexMap::new(),
            default_prefix: String::new(),
            imports: Vec::new(),
            classes: IndexMap::new(),
            enums: IndexMap::new(),
        }
    }

    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_prefix(mut self, prefix: &str, reference: &str) -> Self {
        self.prefixes.insert(prefix.to_string(), reference.to_string());
        self
    }

    pub fn with_default_prefix(mut self, prefix: &str) -> Self {
        self.default_prefix = prefix.to_string();
        self
    }

    pub fn with_import(mut self, import: &str) -> Self {
        self.imports.push(import.to_string());
        self
    }

    pub fn slot_count(&self) -> usize {
        self.classes.values().map(|c| c.attributes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: String,
    pub class_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, SlotDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    pub name: String,
    pub slot_uri: String,
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multivalued: bool,
}

/// What a slot points at: a built-in type or another class/enum by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Range {
    Primitive(LinkmlType),
    Class(String),
}

impl Range {
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Range::Class(name) => Some(name),
            Range::Primitive(_) => None,
        }
    }
}

impl From<String> for Range {
    fn from(value: String) -> Self {
        match value.parse::<LinkmlType>() {
            Ok(primitive) => Range::Primitive(primitive),
            Err(_) => Range::Class(value),
        }
    }
}

impl From<Range> for String {
    fn from(range: Range) -> Self {
        range.to_string()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::Primitive(primitive) => write!(f, "{}", primitive),
            Range::Class(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    pub enum_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub permissible_values: IndexMap<String, PermissibleValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissibleValue {
    pub text: String,
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
