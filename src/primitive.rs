use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Built-in LinkML types a slot range may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkmlType {
    String,
    Integer,
    Boolean,
    Float,
    Double,
    Decimal,
    Time,
    Date,
    Datetime,
    DateOrDatetime,
    Uriorcurie,
    Uri,
    Curie,
    Ncname,
    Objectidentifier,
    Nodeidentifier,
    Jsonpointer,
    Jsonpath,
    Sparqlpath,
}

impl LinkmlType {
    pub const ALL: [LinkmlType; 19] = [
        LinkmlType::String,
        LinkmlType::Integer,
        LinkmlType::Boolean,
        LinkmlType::Float,
        LinkmlType::Double,
        LinkmlType::Decimal,
        LinkmlType::Time,
        LinkmlType::Date,
        LinkmlType::Datetime,
        LinkmlType::DateOrDatetime,
        LinkmlType::Uriorcurie,
        LinkmlType::Uri,
        LinkmlType::Curie,
        LinkmlType::Ncname,
        LinkmlType::Objectidentifier,
        LinkmlType::Nodeidentifier,
        LinkmlType::Jsonpointer,
        LinkmlType::Jsonpath,
        LinkmlType::Sparqlpath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkmlType::String => "string",
            LinkmlType::Integer => "integer",
            LinkmlType::Boolean => "boolean",
            LinkmlType::Float => "float",
            LinkmlType::Double => "double",
            LinkmlType::Decimal => "decimal",
            LinkmlType::Time => "time",
            LinkmlType::Date => "date",
            LinkmlType::Datetime => "datetime",
            LinkmlType::DateOrDatetime => "date_or_datetime",
            LinkmlType::Uriorcurie => "uriorcurie",
            LinkmlType::Uri => "uri",
            LinkmlType::Curie => "curie",
            LinkmlType::Ncname => "ncname",
            LinkmlType::Objectidentifier => "objectidentifier",
            LinkmlType::Nodeidentifier => "nodeidentifier",
            LinkmlType::Jsonpointer => "jsonpointer",
            LinkmlType::Jsonpath => "jsonpath",
            LinkmlType::Sparqlpath => "sparqlpath",
        }
    }
}

impl fmt::Display for LinkmlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkmlType {
    type Err = PrimitiveTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LinkmlType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PrimitiveTypeError::NotAPrimitive(s.to_string()))
    }
}

/// Map a CIM primitive class name onto a LinkML type.
///
/// Unknown names are an error: a `Primitive` class the mapper does not know
/// means the source model has drifted and the schema would be wrong.
pub fn map_primitive_data_type(name: &str) -> Result<LinkmlType, PrimitiveTypeError> {
    match name {
        "Float" => Ok(LinkmlType::Float),
        "Integer" => Ok(LinkmlType::Integer),
        "DateTime" => Ok(LinkmlType::Datetime),
        "String" => Ok(LinkmlType::String),
        "Boolean" => Ok(LinkmlType::Boolean),
        "Decimal" => Ok(LinkmlType::Double),
        "MonthDay" => Ok(LinkmlType::Date),
        "Date" => Ok(LinkmlType::Date),
        "Time" => Ok(LinkmlType::Time),
        "Duration" => Ok(LinkmlType::Integer),
        other => Err(PrimitiveTypeError::NotAPrimitive(other.to_string())),
    }
}

#[derive(Debug, Error)]
pub enum PrimitiveTypeError {
    #[error("Data type `{0}` is not a CIM primitive")]
    NotAPrimitive(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_known_primitives() {
        assert_eq!(map_primitive_data_type("Float").unwrap(), LinkmlType::Float);
        assert_eq!(map_primitive_data_type("String").unwrap(), LinkmlType::String);
        assert_eq!(map_primitive_data_type("Boolean").unwrap(), LinkmlType::Boolean);
        assert_eq!(map_primitive_data_type("Decimal").unwrap(), LinkmlType::Double);
        assert_eq!(map_primitive_data_type("MonthDay").unwrap(), LinkmlType::Date);
        assert_eq!(map_primitive_data_type("DateTime").unwrap(), LinkmlType::Datetime);
        assert_eq!(map_primitive_data_type("Duration").unwrap(), LinkmlType::Integer);
    }

    #[test]
    fn test_unknown_primitive_is_an_error() {
        let err = map_primitive_data_type("Complex").unwrap_err();
        assert!(err.to_string().contains("Complex"));
        // case matters: the catalogue is spelled exactly
        assert!(map_primitive_data_type("float").is_err());
    }

    #[test]
    fn test_linkml_type_names() {
        for t in LinkmlType::ALL {
            assert_eq!(t.as_str().parse::<LinkmlType>().unwrap(), t);
        }
        assert_eq!(LinkmlType::DateOrDatetime.to_string(), "date_or_datetime");
        assert_eq!(serde_yaml::to_string(&LinkmlType::DateOrDatetime).unwrap().trim(), "date_or_datetime");
    }
}
