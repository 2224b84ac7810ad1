use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::linkml_model::SchemaDefinition;
use crate::transformation_engine::GeneratedSchema;

pub fn schema_as_yaml(schema: &SchemaDefinition) -> Result<String, WriterError> {
    Ok(serde_yaml::to_string(schema)?)
}

/// Write one schema, creating parent directories as needed.
pub fn write_schema(schema: &SchemaDefinition, output: &Path) -> Result<(), WriterError> {
    let yaml = schema_as_yaml(schema)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| WriterError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(output, yaml).map_err(|source| WriterError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    info!(path = %output.display(), classes = schema.classes.len(), enums = schema.enums.len(), "Wrote schema");
    Ok(())
}

/// Write every generated schema relative to `root`, returning the written paths.
pub fn write_all(schemas: &[GeneratedSchema], root: &Path) -> Result<Vec<PathBuf>, WriterError> {
    schemas
        .iter()
        .map(|generated| {
            let path = root.join(&generated.output_path);
            write_schema(&generated.schema, &path)?;
            Ok(path)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Failed to serialize schema: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(name: &str) -> SchemaDefinition {
        SchemaDefinition::new(format!("https://cim.ucaiug.io/ns/{}", name), name.to_string())
            .with_title(name.to_string())
            .with_prefix("cim", "https://cim.ucaiug.io/ns#")
            .with_default_prefix("cim")
    }

    #[test]
    fn test_yaml_output() {
        let yaml = schema_as_yaml(&schema("Core")).unwrap();
        assert!(yaml.contains("id: https://cim.ucaiug.io/ns/Core"));
        assert!(yaml.contains("default_prefix: cim"));
        assert!(!yaml.contains("classes"));
    }

    #[test]
    fn test_write_all_creates_package_directories() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = vec![
            GeneratedSchema {
                package_id: Some(4),
                output_path: PathBuf::from("out/TC57CIM/IEC61970/Core.yml"),
                schema: schema("Core"),
            },
            GeneratedSchema {
                package_id: Some(5),
                output_path: PathBuf::from("out/TC57CIM/IEC61970/Wires.yml"),
                schema: schema("Wires"),
            },
        ];

        let written = write_all(&schemas, dir.path()).unwrap();
        assert_eq!(written.len(), 2);
        for path in &written {
            assert!(path.exists());
        }

        let text = fs::read_to_string(&written[1]).unwrap();
        let back: SchemaDefinition = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, schemas[1].schema);
    }
}
