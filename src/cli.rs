//! Command-line interface.
//!
//! Loads route manifests, runs one aggregation pass and writes the resulting document as YAML
//! or JSON. Options given on the command line override the `app` header of the manifests.

use crate::aggregator::{AutoDoc, AutoDocConfig};
use crate::manifest::ManifestLoader;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Title used when neither the manifests nor the command line name the application
pub const DEFAULT_TITLE: &str = "API";

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Route manifest file, or directory searched for manifests
    #[arg(value_name = "MANIFEST_PATH")]
    pub manifest_path: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Application title
    #[arg(long)]
    pub title: Option<String>,

    /// Application version
    #[arg(long = "app-version")]
    pub app_version: Option<String>,

    /// OpenAPI version written to the document
    #[arg(long = "openapi-version")]
    pub openapi_version: Option<String>,

    /// Tag for operations that declare none
    #[arg(long = "default-tag")]
    pub default_tag: Option<String>,

    /// Also document handlers without documentation metadata
    #[arg(long = "always-document")]
    pub always_document: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.exists() {
        anyhow::bail!(
            "Manifest path does not exist: {}",
            args.manifest_path.display()
        );
    }

    info!("Manifest path: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

impl CliArgs {
    /// Overlay command-line options on a configuration
    pub fn apply(&self, mut config: AutoDocConfig) -> AutoDocConfig {
        if let Some(title) = &self.title {
            config.title = title.clone();
        }
        if let Some(version) = &self.app_version {
            config.app_version = version.clone();
        }
        if let Some(version) = &self.openapi_version {
            config.openapi_version = version.clone();
        }
        if let Some(tag) = &self.default_tag {
            config.default_tag = Some(tag.clone());
        }
        if self.always_document {
            config.always_document = true;
        }
        config
    }
}

/// Generate the document and return it rendered in the requested format
pub fn generate(args: &CliArgs) -> Result<String> {
    info!("Loading route manifests...");
    let loaded = ManifestLoader::load_path(&args.manifest_path)?;
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    if loaded.files.is_empty() {
        anyhow::bail!(
            "No route manifests found under {}",
            args.manifest_path.display()
        );
    }

    let config = args.apply(loaded.app.apply(AutoDocConfig::new(DEFAULT_TITLE)));
    debug!("Effective configuration: {:?}", config);

    let auto_doc = AutoDoc::new(config);
    let document = auto_doc.aggregate(&loaded.table).build();

    if document.paths.is_empty() {
        warn!("No documented routes found");
    }

    info!("Serializing to {:?} format...", args.output_format);
    match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document),
        OutputFormat::Json => serialize_json(&document),
    }
}

/// Run the full workflow: generate, then write to the output file or stdout
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let content = generate(&args)?;

    match &args.output_path {
        Some(output_path) => {
            write_to_file(&content, output_path)?;
            info!("Wrote OpenAPI document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    Ok(())
}
