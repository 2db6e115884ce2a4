//! CLI validator (§2 "CLI validator", §6 "CLI")
//!
//! `validator-tool <config-path>` — loads and validates a configuration
//! file, prints a summary, and exits 0 (valid) or 1 (invalid).

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "validator-tool", about = "Validate a promptuna configuration file")]
struct Args {
    /// Path to the configuration file to validate
    config_path: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let start = Instant::now();

    match promptuna::load_and_validate_config(&args.config_path).await {
        Ok(config) => {
            let elapsed_ms = start.elapsed().as_millis();
            println!("valid configuration");
            println!("  version:   {}", config.version);
            println!("  prompts:   {}", config.prompts.len());
            println!("  providers: {}", config.providers.len());
            println!("  schemas:   {}", config.response_schemas.len());
            println!("  elapsed:   {elapsed_ms}ms");
            std::process::exit(0);
        }
        Err(error) => {
            eprintln!("invalid configuration: {error}");
            let details = error.details();
            if details.path.is_some() || !details.identifiers.is_empty() || details.suggestion.is_some() {
                if let Some(path) = &details.path {
                    eprintln!("  path: {path}");
                }
                if !details.identifiers.is_empty() {
                    eprintln!("  identifiers: {}", details.identifiers.join(", "));
                }
                if let Some(suggestion) = &details.suggestion {
                    eprintln!("  suggestion: {suggestion}");
                }
            }
            std::process::exit(1);
        }
    }
}
