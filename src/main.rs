use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ea2linkml::{
    config::{GeneratorConfig, RelationCardinality},
    ea_reader::EaProjectReader,
    reporter::{ReportFormat, TransformationReporter},
    transformation_engine::{SchemaTransformationEngine, TransformationError},
};

#[derive(Parser, Debug)]
#[command(name = "ea2linkml")]
#[command(about = "Generate LinkML schemas from an Enterprise Architect UML project")]
struct Args {
    /// Path to the Enterprise Architect project file (SQLite based, e.g. .qea)
    project_file: PathBuf,

    /// YAML generator configuration
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write one schema per UML package instead of a single schema
    #[arg(long)]
    per_package: bool,

    /// Root directory for per-package schemas
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Output file for the single schema
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Namespace prefix used in every generated identifier
    #[arg(long)]
    prefix: Option<String>,

    #[arg(long, value_enum)]
    relation_cardinality: Option<RelationCardinality>,

    /// Also write the build report here (.json for JSON, YAML otherwise)
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    run(&args, config)
        .with_context(|| format!("Failed to generate schemas from {}", args.project_file.display()))
}

fn run(args: &Args, config: GeneratorConfig) -> Result<(), TransformationError> {
    let reader = EaProjectReader::open(&args.project_file)?;
    let engine = SchemaTransformationEngine::new(config);
    let result = engine.transform_project(&reader)?;

    for warning in &result.warnings {
        warn!(kind = ?warning.warning_type, "{}", warning.message);
    }

    engine.write_schemas(&result, Path::new(""))?;

    let reporter = TransformationReporter::new();
    let report = reporter.generate_report(&result);
    print!("{}", reporter.format_report(&report)?);

    if let Some(path) = &args.report {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ReportFormat::Json,
            _ => ReportFormat::Yaml,
        };
        TransformationReporter::new()
            .with_format(format)
            .write_report(&report, path)?;
        info!(path = %path.display(), "Wrote report");
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "ea2linkml=debug" } else { "ea2linkml=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };

    if args.per_package {
        config.schema_per_package = true;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
    if let Some(policy) = args.relation_cardinality {
        config.relation_cardinality = policy;
    }

    config.validate()?;
    Ok(config)
}
