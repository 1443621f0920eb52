//! Command-line tool that generates OpenAPI documents from route manifests.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS] <MANIFEST_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML from a single manifest:
//! ```bash
//! openapi-from-routes routes.yaml -o openapi.yaml
//! ```
//!
//! Generate JSON from every manifest in a directory:
//! ```bash
//! openapi-from-routes ./routes -f json -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-from-routes routes.yaml -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_routes::cli;

fn main() -> Result<()> {
    // Parse first so the verbose flag can set the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI route documenter starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
