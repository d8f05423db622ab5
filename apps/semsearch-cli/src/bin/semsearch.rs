//! Operator CLI for the semantic search layer.
//!
//! Renders rewritten index templates, checks or deploys the embedding model,
//! and compiles or runs queries through the same pipeline the search path
//! uses.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use semsearch_core::config::{expand_path, Config};
use semsearch_core::keys;
use semsearch_core::snapshot::ConfigSnapshot;
use semsearch_core::types::SearchRequestParams;
use semsearch_hybrid::SemanticSearchPlugin;
use semsearch_model::{EngineHttp, ModelLifecycle, ModelStatus, PollPolicy};
use semsearch_neural::{rewrite_mapping, rewrite_settings};

#[derive(Parser)]
#[command(name = "semsearch")]
#[command(author, version, about = "Semantic search tooling", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml", env = "SEMSEARCH_CONFIG")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an index settings template with the vector settings applied
    Settings {
        template: String,
    },

    /// Print an index mapping template with the vector field added
    Mapping {
        template: String,
    },

    /// Show the configured model's state
    Model {
        /// Deploy the model and wait for it when it is not deployed yet
        #[arg(long)]
        deploy: bool,
    },

    /// Compile a query, or run it with --execute
    Query {
        text: String,

        #[arg(long)]
        page_size: Option<usize>,

        #[arg(long)]
        execute: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_template(path: &str) -> Result<String> {
    let path = expand_path(path);
    fs::read_to_string(&path).with_context(|| format!("reading template {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_file(&expand_path(&cli.config))?;

    match cli.command {
        Commands::Settings { template } => {
            let snapshot = ConfigSnapshot::load(&config);
            println!("{}", rewrite_settings(&snapshot, &read_template(&template)?)?);
        }
        Commands::Mapping { template } => {
            let snapshot = ConfigSnapshot::load(&config);
            println!("{}", rewrite_mapping(&snapshot, &read_template(&template)?)?);
        }
        Commands::Model { deploy } => {
            let snapshot = ConfigSnapshot::load(&config);
            let model_id = snapshot.model_id.clone().with_context(|| format!("{} is not set", keys::CONTENT_MODEL_ID))?;
            let http = Arc::new(EngineHttp::from_settings(&snapshot.model_service)?);
            let lifecycle = ModelLifecycle::new(http, PollPolicy::from(&snapshot.model_service));

            let model = lifecycle.get_model(&model_id);
            println!("{}", serde_json::to_string_pretty(&model)?);
            let status = ModelStatus::from_model(&model);
            info!(model_id = %model_id, ?status, "model status");
            if deploy && status != ModelStatus::Deployed {
                let deployed = lifecycle.load_model(&model_id);
                info!(model_id = %model_id, deployed, "deploy finished");
            }
        }
        Commands::Query { text, page_size, execute } => {
            let plugin = SemanticSearchPlugin::connect(&config)?;
            let mut params = SearchRequestParams::new(text);
            params.page_size = page_size;
            let params = Arc::new(params);
            if execute {
                let results = plugin.searcher().search(params, None)?;
                info!(total = results.total, returned = results.documents.len(), "search finished");
                println!("{}", serde_json::to_string_pretty(&results.documents)?);
            } else {
                let body = plugin.searcher().build_request(params, None)?;
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
        }
    }
    Ok(())
}
