// UML relational model to LinkML schema generation
pub mod cardinality;
pub mod curie;
pub mod primitive;
pub mod uml_model;
pub mod row_grouper;
pub mod linkml_model;
pub mod config;
pub mod class_builder;
pub mod relation_resolver;
pub mod package_partitioner;
pub mod transformation_engine;
pub mod ea_reader;
pub mod writer;
pub mod reporter;

// Re-export core types for convenience
pub use cardinality::Cardinality;
pub use config::{GeneratorConfig, RelationCardinality};
pub use ea_reader::EaProjectReader;
pub use linkml_model::{ClassDefinition, EnumDefinition, SchemaDefinition, SlotDefinition};
pub use transformation_engine::{SchemaTransformationEngine, TransformationResult};
pub use reporter::{TransformationReporter, TransformationReport};
