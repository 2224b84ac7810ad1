use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LINKML_PREFIX: &str = "linkml";
pub const LINKML_URI: &str = "https://w3id.org/linkml/";
pub const LINKML_TYPES_IMPORT: &str = "linkml:types";

/// Which connector end governs the flags of the two synthesized relation slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RelationCardinality {
    /// Both slots take the source end cardinality
    #[default]
    Source,
    /// Each slot takes the cardinality of the end it points at
    PerEndpoint,
}

/// Settings for one generator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub prefix: String,
    pub namespace_uri: String,
    pub schema_base_uri: String,
    pub schema_id: String,
    pub schema_name: String,
    pub schema_title: String,
    pub schema_per_package: bool,
    pub output_dir: PathBuf,
    pub output_file: PathBuf,
    pub relation_cardinality: RelationCardinality,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            prefix: "cim".to_string(),
            namespace_uri: "https://cim.ucaiug.io/ns#".to_string(),
            schema_base_uri: "https://cim.ucaiug.io/ns/".to_string(),
            schema_id: "https://cim.ucaiug.io/ns#CIM".to_string(),
            schema_name: "cim".to_string(),
            schema_title: "CIM".to_string(),
            schema_per_package: false,
            output_dir: PathBuf::from("out"),
            output_file: PathBuf::from("cim.yml"),
            relation_cardinality: RelationCardinality::Source,
        }
    }
}

impl GeneratorConfig {
    /// Load settings from a YAML file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GeneratorConfig = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ncname = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$")?;
        if !ncname.is_match(&self.prefix) {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        if self.prefix == LINKML_PREFIX {
            return Err(ConfigError::ReservedPrefix(self.prefix.clone()));
        }
        if self.namespace_uri.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        Ok(())
    }

    /// Schema id for a package path, e.g. `https://cim.ucaiug.io/ns/TC57CIM/IEC61970/Core`.
    pub fn package_schema_id(&self, path: &[String]) -> String {
        format!("{}{}", self.schema_base_uri, path.join("/"))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Prefix `{0}` is not a valid NCName")]
    InvalidPrefix(String),

    #[error("Prefix `{0}` is reserved")]
    ReservedPrefix(String),

    #[error("Namespace URI must not be empty")]
    EmptyNamespace,

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
