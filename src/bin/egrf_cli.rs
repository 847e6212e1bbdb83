//! EGRF CLI - Generate and validate EGRF documents
//!
//! Commands: generate, validate, schema-info, check (graph or .egrf file)
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when a document is invalid, 1 on setup failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use egrf_core::{
    document::{egrf_path, is_egrf_path},
    schema::default_schema_path,
    DocumentChecker, EgrfGenerator, GenerateError, GeneratorConfig, GraphModel, GraphSpec,
    SchemaValidator,
};

#[derive(Parser)]
#[command(name = "egrf-cli")]
#[command(about = "EGRF CLI - Existential Graph Rendering Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the EGRF JSON schema
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an EGRF document from a graph description
    Generate {
        /// Graph description (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file, `.egrf` added when it has no extension; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generator config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Indent width, 0 for compact output
        #[arg(long)]
        indent: Option<usize>,

        /// Validate the document against the schema
        #[arg(long)]
        validate: bool,
    },

    /// Validate an EGRF file
    Validate {
        file: PathBuf,
    },

    /// Print the schema version and required fields
    SchemaInfo,

    /// Run the structural layout checks on a generated or existing document
    Check {
        /// Graph description (JSON), or an existing `.egrf` document
        input: PathBuf,

        /// Generator config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: String) -> ExitCode {
    println!("{}", serde_json::json!({ "success": false, "error": message }));
    ExitCode::FAILURE
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, String> {
    match path {
        Some(path) => GeneratorConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(GeneratorConfig::default()),
    }
}

fn load_graph(path: &Path) -> Result<GraphModel, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read graph {}: {}", path.display(), e))?;
    let spec = GraphSpec::from_json(&content).map_err(|e| format!("Invalid graph JSON: {}", e))?;
    spec.build().map_err(|e| e.to_string())
}

fn load_document(path: &Path) -> Result<serde_json::Value, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read document {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid JSON in file: {}", e))
}

fn load_validator(path: Option<&Path>) -> Result<SchemaValidator, String> {
    let path = path.map_or_else(default_schema_path, Path::to_path_buf);
    SchemaValidator::from_path(&path).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let schema_path = cli.schema.as_deref();

    match cli.command {
        Commands::Generate { input, output, config, indent, validate } => {
            let mut config = match load_config(config.as_deref()) {
                Ok(c) => c,
                Err(e) => return fail(e),
            };
            if let Some(indent) = indent {
                config.indent = indent;
            }
            let graph = match load_graph(&input) {
                Ok(g) => g,
                Err(e) => return fail(e),
            };

            let generator = EgrfGenerator::new(config);
            let document = match generator.generate(&graph) {
                Ok(d) => d,
                Err(e) => return fail(e.to_string()),
            };

            let report = if validate {
                let validator = match load_validator(schema_path) {
                    Ok(v) => v,
                    Err(e) => return fail(e),
                };
                match document.to_value() {
                    Ok(value) => Some(validator.validate(&value)),
                    Err(e) => return fail(e.to_string()),
                }
            } else {
                None
            };

            let json = match document.to_json(generator.config().indent) {
                Ok(j) => j,
                Err(e) => return fail(e.to_string()),
            };

            match output {
                Some(path) => {
                    let path = egrf_path(&path);
                    if let Err(e) = fs::write(&path, &json) {
                        return fail(format!("Failed to write {}: {}", path.display(), e));
                    }
                    let summary = serde_json::json!({
                        "success": true,
                        "output": path.display().to_string(),
                        "fingerprint": document.fingerprint().ok(),
                        "validation": &report,
                    });
                    println!("{}", summary);
                }
                None => {
                    println!("{}", json);
                    if let Some(report) = &report {
                        eprintln!("{}", serde_json::json!({ "validation": report }));
                    }
                }
            }

            match report {
                Some(r) if !r.ok => ExitCode::from(2),
                _ => ExitCode::SUCCESS,
            }
        }

        Commands::Validate { file } => {
            let validator = match load_validator(schema_path) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let report = validator.validate_file(&file);
            println!("{}", serde_json::json!(&report));
            if report.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::SchemaInfo => {
            let validator = match load_validator(schema_path) {
                Ok(v) => v,
                Err(e) => return fail(e),
            };
            let info = serde_json::json!({
                "version": validator.get_schema_version(),
                "required": validator.get_required_fields(),
                "matcher": validator.matcher_name(),
            });
            println!("{}", info);
            ExitCode::SUCCESS
        }

        Commands::Check { input, config } => {
            let config = match load_config(config.as_deref()) {
                Ok(c) => c,
                Err(e) => return fail(e),
            };
            let margin = config.layout.margin;
            let document = if is_egrf_path(&input) {
                load_document(&input)
            } else {
                load_graph(&input).and_then(|graph| {
                    EgrfGenerator::new(config)
                        .generate(&graph)
                        .and_then(|d| d.to_value().map_err(GenerateError::from))
                        .map_err(|e| e.to_string())
                })
            };
            let document = match document {
                Ok(d) => d,
                Err(e) => return fail(e),
            };

            let report = DocumentChecker::new(margin).check(&document);
            println!("{}", serde_json::json!(&report));
            if report.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
    }
}
